//! Field registry and operator compatibility rules.
//!
//! The registry is injectable configuration: each deployment declares its
//! metadata schema (field name → declared type), and both the row editor
//! and the validator consult it — the editor to populate selectable options
//! and input hints, the validator to reject filters that compare a field
//! with an operator or value its type does not support.

use crate::error::FilterError;
use crate::filter::{CompareOp, FilterValue, MetadataFilter};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of a metadata field.
///
/// Determines the legal comparison operators and the expected value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string.
    Str,
    /// 64-bit signed integer.
    Int,
    /// Timestamp, carried as a string in RFC 3339 or editor layout.
    DateTime,
}

/// Timestamp layout accepted for datetime fields alongside RFC 3339.
const DATETIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Input hint shown for datetime value widgets.
pub const DATETIME_PLACEHOLDER: &str = "YYYY-mm-dd HH:MM:SS";

/// Legal comparison operators for a field type.
///
/// Strings support equality and membership; integers and timestamps
/// additionally support the ordering operators. The editor uses this to
/// restrict operator choices once a field is chosen.
pub fn legal_operators(field_type: FieldType) -> &'static [CompareOp] {
    const STR_OPS: &[CompareOp] = &[CompareOp::Eq, CompareOp::Ne, CompareOp::In, CompareOp::NotIn];
    const ORDERED_OPS: &[CompareOp] = &[
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::In,
        CompareOp::NotIn,
    ];
    match field_type {
        FieldType::Str => STR_OPS,
        FieldType::Int | FieldType::DateTime => ORDERED_OPS,
    }
}

/// Declared shape of one metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Declared value type.
    pub field_type: FieldType,
    /// Input hint for the editor's value widget, empty when no format applies.
    #[serde(default)]
    pub placeholder: String,
}

impl FieldSpec {
    /// Spec with the default placeholder for the type.
    pub fn new(field_type: FieldType) -> Self {
        let placeholder = match field_type {
            FieldType::DateTime => DATETIME_PLACEHOLDER.to_string(),
            FieldType::Str | FieldType::Int => String::new(),
        };
        Self {
            field_type,
            placeholder,
        }
    }
}

/// Ordered collection of declared metadata fields.
///
/// Declaration order is preserved and drives the editor's field selector.
/// Passed into the builder and validator explicitly, so deployments can
/// ship custom metadata schemas without code changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRegistry {
    fields: Vec<(String, FieldSpec)>,
}

impl FieldRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry mirroring the stock document-ingestion schema.
    pub fn document_defaults() -> Self {
        Self::new()
            .declare("document_name", FieldType::Str)
            .declare("document_size", FieldType::Int)
            .declare("document_last_modified", FieldType::DateTime)
            .declare("document_extension", FieldType::Str)
            .declare("document_created", FieldType::DateTime)
            .declare("ingestion_date", FieldType::DateTime)
    }

    /// Declare a field. Re-declaring a name replaces the earlier spec
    /// without changing its position.
    pub fn declare(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let spec = FieldSpec::new(field_type);
        match self.fields.iter().position(|(existing, _)| *existing == name) {
            Some(index) => self.fields[index].1 = spec,
            None => self.fields.push((name, spec)),
        }
        self
    }

    /// Look up a field's spec by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validate a filter tree against the registry.
    ///
    /// Every leaf must reference a declared field, use an operator legal
    /// for that field's type, and carry a value compatible with it.
    pub fn validate(&self, filter: &MetadataFilter) -> Result<(), FilterError> {
        match filter {
            MetadataFilter::Compare { op, key, value } => self.validate_leaf(*op, key, value),
            MetadataFilter::And(children) | MetadataFilter::Or(children) => {
                children.iter().try_for_each(|child| self.validate(child))
            }
            MetadataFilter::Not(child) => self.validate(child),
        }
    }

    /// Construct a comparison leaf validated against the registry.
    ///
    /// Unlike the bare [`MetadataFilter`] combinators, this fails at
    /// construction time when the key is unknown or the operator/value is
    /// incompatible with the field's declared type.
    pub fn leaf(
        &self,
        op: CompareOp,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<MetadataFilter, FilterError> {
        let filter = MetadataFilter::leaf(op, key, value)?;
        self.validate(&filter)?;
        Ok(filter)
    }

    fn validate_leaf(&self, op: CompareOp, key: &str, value: &FilterValue) -> Result<(), FilterError> {
        let spec = self
            .get(key)
            .ok_or_else(|| FilterError::UnknownField(key.to_string()))?;
        if !legal_operators(spec.field_type).contains(&op) {
            return Err(FilterError::Shape(format!(
                "operator {op:?} is not legal for {:?} field {key:?}",
                spec.field_type
            )));
        }
        match value {
            FilterValue::Scalar(scalar) => check_value_type(spec.field_type, scalar, key),
            FilterValue::List(items) => items
                .iter()
                .try_for_each(|item| check_value_type(spec.field_type, item, key)),
        }
    }
}

fn check_value_type(field_type: FieldType, value: &Value, key: &str) -> Result<(), FilterError> {
    let compatible = match field_type {
        FieldType::Str => value.is_string(),
        FieldType::Int => value.as_i64().is_some(),
        FieldType::DateTime => value
            .as_str()
            .is_some_and(|text| parse_timestamp(text).is_some()),
    };
    if compatible {
        Ok(())
    } else {
        Err(FilterError::Shape(format!(
            "value {value} is incompatible with {field_type:?} field {key:?}"
        )))
    }
}

/// Parse a timestamp accepted for datetime fields: RFC 3339, or the
/// editor's `YYYY-mm-dd HH:MM:SS` layout.
pub(crate) fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    NaiveDateTime::parse_from_str(text, DATETIME_LAYOUT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_fields_have_no_ordering_operators() {
        let ops = legal_operators(FieldType::Str);
        assert!(ops.contains(&CompareOp::Eq));
        assert!(ops.contains(&CompareOp::NotIn));
        assert!(!ops.contains(&CompareOp::Gt));
        assert!(!ops.contains(&CompareOp::Le));
    }

    #[test]
    fn test_ordered_fields_support_all_operators() {
        for field_type in [FieldType::Int, FieldType::DateTime] {
            assert_eq!(legal_operators(field_type), CompareOp::ALL.as_slice());
        }
    }

    #[test]
    fn test_validate_rejects_unknown_field() {
        let registry = FieldRegistry::document_defaults();
        let filter = MetadataFilter::eq("mystery_field", "x").unwrap();
        let err = registry.validate(&filter).unwrap_err();
        assert!(matches!(err, FilterError::UnknownField(_)));
    }

    #[test]
    fn test_validate_rejects_illegal_operator_for_type() {
        let registry = FieldRegistry::document_defaults();
        let filter = MetadataFilter::gt("document_name", "a").unwrap();
        let err = registry.validate(&filter).unwrap_err();
        assert!(matches!(err, FilterError::Shape(_)));
    }

    #[test]
    fn test_validate_rejects_value_type_mismatch() {
        let registry = FieldRegistry::document_defaults();
        let filter = MetadataFilter::eq("document_size", "not a number").unwrap();
        let err = registry.validate(&filter).unwrap_err();
        assert!(matches!(err, FilterError::Shape(_)));
    }

    #[test]
    fn test_validate_accepts_rfc3339_and_editor_timestamps() {
        let registry = FieldRegistry::document_defaults();
        for text in ["2024-03-01T09:30:00Z", "2024-03-01 09:30:00"] {
            let filter = MetadataFilter::ge("document_created", text).unwrap();
            registry.validate(&filter).unwrap();
        }
    }

    #[test]
    fn test_validate_rejects_malformed_timestamp() {
        let registry = FieldRegistry::document_defaults();
        let filter = MetadataFilter::ge("document_created", "yesterday").unwrap();
        let err = registry.validate(&filter).unwrap_err();
        assert!(matches!(err, FilterError::Shape(_)));
    }

    #[test]
    fn test_validate_recurses_into_composites() {
        let registry = FieldRegistry::document_defaults();
        let filter = MetadataFilter::and_(vec![
            MetadataFilter::eq("document_name", "a.md").unwrap(),
            MetadataFilter::not_(MetadataFilter::eq("mystery_field", "x").unwrap()),
        ])
        .unwrap();
        let err = registry.validate(&filter).unwrap_err();
        assert!(matches!(err, FilterError::UnknownField(_)));
    }

    #[test]
    fn test_validate_checks_list_elements() {
        let registry = FieldRegistry::document_defaults();
        let filter = MetadataFilter::in_("document_size", json!([100, "big"])).unwrap();
        let err = registry.validate(&filter).unwrap_err();
        assert!(matches!(err, FilterError::Shape(_)));
    }

    #[test]
    fn test_registry_leaf_validates_at_construction() {
        let registry = FieldRegistry::document_defaults();
        let err = registry
            .leaf(CompareOp::Gt, "document_extension", "md")
            .unwrap_err();
        assert!(matches!(err, FilterError::Shape(_)));

        let filter = registry.leaf(CompareOp::Ge, "document_size", 100).unwrap();
        assert_eq!(
            filter.to_primitive(),
            json!({ "type": ">=", "key": "document_size", "value": 100 })
        );
    }

    #[test]
    fn test_declaration_order_preserved() {
        let registry = FieldRegistry::document_defaults();
        let names: Vec<&str> = registry.field_names().collect();
        assert_eq!(
            names,
            [
                "document_name",
                "document_size",
                "document_last_modified",
                "document_extension",
                "document_created",
                "ingestion_date",
            ]
        );
    }

    #[test]
    fn test_redeclare_replaces_in_place() {
        let registry = FieldRegistry::new()
            .declare("a", FieldType::Str)
            .declare("b", FieldType::Int)
            .declare("a", FieldType::DateTime);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").unwrap().field_type, FieldType::DateTime);
        assert_eq!(registry.field_names().next(), Some("a"));
    }

    #[test]
    fn test_datetime_placeholder_assigned() {
        let registry = FieldRegistry::document_defaults();
        assert_eq!(
            registry.get("ingestion_date").unwrap().placeholder,
            DATETIME_PLACEHOLDER
        );
        assert!(registry.get("document_name").unwrap().placeholder.is_empty());
    }
}
