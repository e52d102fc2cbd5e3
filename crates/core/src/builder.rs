//! Interactive filter construction: editable rows reduced to one filter.
//!
//! A [`FilterBuilder`] models the row-based editor surface. Each
//! [`FilterRow`] holds raw text state — field key, operator token, value —
//! edited independently and possibly incomplete at any moment. Complete
//! rows reduce to a single [`MetadataFilter`] via [`FilterBuilder::combine`];
//! partially-specified rows are silently excluded, since "not yet typed in"
//! is normal editor state rather than an error.
//!
//! Row state transitions are plain methods instead of reactive property
//! observers, so the key-change/operator-reset rule is testable without any
//! UI substrate.

use crate::config::MAX_FILTER_ROWS;
use crate::error::FilterError;
use crate::filter::{CompareOp, MetadataFilter};
use crate::schema::{legal_operators, parse_timestamp, FieldRegistry, FieldType};
use serde_json::Value;
use std::fmt;

/// One editable row of filter state: a candidate leaf that may be
/// incomplete. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRow {
    key: String,
    operator: String,
    value: String,
}

impl FilterRow {
    /// Fresh row with nothing selected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Selected field name, `""` when unset.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Selected operator token, `""` when unset.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Raw text value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Select a field.
    ///
    /// Changing the field resets the operator to unset, since the legal
    /// operator set depends on the field's declared type. Re-selecting the
    /// same field leaves the operator alone.
    pub fn set_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        if key != self.key {
            self.operator.clear();
        }
        self.key = key;
    }

    /// Select an operator token (e.g. `">="`).
    pub fn set_operator(&mut self, operator: impl Into<String>) {
        self.operator = operator.into();
    }

    /// Set the raw text value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// True when nothing has been entered.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.operator.is_empty() && self.value.is_empty()
    }

    /// True when key, operator, and value are all specified.
    ///
    /// Only complete rows participate in combination.
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.operator.is_empty() && !self.value.is_empty()
    }

    /// Convert the row to a validated leaf filter.
    ///
    /// Incomplete rows yield `Ok(None)`. Complete rows parse the raw text
    /// per the field's declared type (`in` / `not in` split the text on
    /// commas into a list) and validate against the registry; malformed
    /// values and unknown fields on complete rows are errors.
    pub fn to_filter(&self, registry: &FieldRegistry) -> Result<Option<MetadataFilter>, FilterError> {
        if !self.is_complete() {
            return Ok(None);
        }
        let spec = registry
            .get(&self.key)
            .ok_or_else(|| FilterError::UnknownField(self.key.clone()))?;
        let op = CompareOp::from_token(&self.operator)?;
        let value = if op.takes_list() {
            let items = self
                .value
                .split(',')
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(|text| parse_scalar(spec.field_type, text))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Array(items)
        } else {
            parse_scalar(spec.field_type, &self.value)?
        };
        registry.leaf(op, &self.key, value).map(Some)
    }
}

impl fmt::Display for FilterRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.operator, self.value)
    }
}

/// Parse one raw text token into a JSON scalar per the declared field type.
fn parse_scalar(field_type: FieldType, text: &str) -> Result<Value, FilterError> {
    match field_type {
        FieldType::Str => Ok(Value::String(text.to_string())),
        FieldType::Int => {
            let parsed: i64 = text
                .trim()
                .parse()
                .map_err(|_| FilterError::Shape(format!("{text:?} is not an integer")))?;
            Ok(Value::from(parsed))
        }
        FieldType::DateTime => {
            let text = text.trim();
            if parse_timestamp(text).is_none() {
                return Err(FilterError::Shape(format!(
                    "{text:?} is not a recognized timestamp"
                )));
            }
            Ok(Value::String(text.to_string()))
        }
    }
}

/// Row-based builder that reduces an editable row collection to a single
/// [`MetadataFilter`].
///
/// Maintains the editor invariant that at least one row is always present,
/// so there is always something to edit.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    registry: FieldRegistry,
    rows: Vec<FilterRow>,
}

impl FilterBuilder {
    /// New builder over the given field registry, holding one empty row.
    pub fn new(registry: FieldRegistry) -> Self {
        Self {
            registry,
            rows: vec![FilterRow::empty()],
        }
    }

    /// The registry this builder consults.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Current rows, in editor order.
    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    /// Mutable access to the row at `index`.
    pub fn row_mut(&mut self, index: usize) -> Option<&mut FilterRow> {
        self.rows.get_mut(index)
    }

    /// Append a fresh empty row.
    ///
    /// Refused while the last row is still empty (the editor adds rows one
    /// at a time) or once [`MAX_FILTER_ROWS`] is reached. Returns whether a
    /// row was added.
    pub fn add_row(&mut self) -> bool {
        let last_is_empty = self.rows.last().is_some_and(FilterRow::is_empty);
        if last_is_empty || self.rows.len() >= MAX_FILTER_ROWS {
            return false;
        }
        self.rows.push(FilterRow::empty());
        true
    }

    /// Delete the row at `index`. Returns whether a row was removed.
    ///
    /// The editor always shows at least one row: deleting the sole
    /// remaining row leaves a fresh empty one in its place.
    pub fn delete_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        let removed = self.rows.remove(index);
        tracing::debug!("deleted filter row {index}: [{removed}]");
        if self.rows.is_empty() {
            self.rows.push(FilterRow::empty());
        }
        true
    }

    /// Legal operator tokens for the row's selected field, in stable order.
    ///
    /// Empty when no field is selected or the field is not in the registry.
    pub fn operator_options(&self, index: usize) -> Vec<&'static str> {
        self.rows
            .get(index)
            .and_then(|row| self.registry.get(row.key()))
            .map(|spec| {
                legal_operators(spec.field_type)
                    .iter()
                    .map(|op| op.token())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Input hint for the row's value widget.
    pub fn placeholder(&self, index: usize) -> &str {
        self.rows
            .get(index)
            .and_then(|row| self.registry.get(row.key()))
            .map(|spec| spec.placeholder.as_str())
            .unwrap_or("")
    }

    /// Reduce the rows to a single filter.
    ///
    /// Only complete rows participate; partially-specified rows are
    /// silently excluded. Zero complete rows yield `None` (no filtering);
    /// exactly one yields that row's leaf unwrapped; two or more are
    /// conjoined with `and` in row order. A lone leaf is never wrapped in a
    /// one-element `and` — that would change the serialized shape sent to
    /// the backend.
    pub fn combine(&self) -> Result<Option<MetadataFilter>, FilterError> {
        let mut leaves = Vec::new();
        for row in &self.rows {
            if let Some(leaf) = row.to_filter(&self.registry)? {
                leaves.push(leaf);
            }
        }
        match leaves.len() {
            0 => Ok(None),
            1 => Ok(leaves.pop()),
            _ => MetadataFilter::and_(leaves).map(Some),
        }
    }

    /// [`combine`](Self::combine) and serialize to the primitive form
    /// handed to a retrieval backend; `None` when no filtering applies.
    pub fn combined_primitive(&self) -> Result<Option<Value>, FilterError> {
        Ok(self.combine()?.as_ref().map(MetadataFilter::to_primitive))
    }
}
