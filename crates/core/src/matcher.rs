//! Filter evaluation against document metadata.
//!
//! The reference interpretation of the primitive wire contract for an
//! in-process backend: a [`MetadataFilter`] tree is evaluated recursively
//! against a document's metadata map. Comparison leaves match typed
//! [`MetadataValue`]s against JSON scalars; `and` / `or` / `not` combine
//! child results.

use crate::document::{Document, MetadataValue};
use crate::filter::{CompareOp, FilterValue, MetadataFilter};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Check whether a document's metadata satisfies the filter.
///
/// A leaf referencing a field absent from the metadata evaluates to false,
/// for every operator including `!=` and `not in`.
pub fn matches_filter(metadata: &HashMap<String, MetadataValue>, filter: &MetadataFilter) -> bool {
    match filter {
        MetadataFilter::Compare { op, key, value } => match metadata.get(key) {
            Some(field_value) => evaluate_compare(field_value, *op, value),
            None => false,
        },
        MetadataFilter::And(children) => children.iter().all(|child| matches_filter(metadata, child)),
        MetadataFilter::Or(children) => children.iter().any(|child| matches_filter(metadata, child)),
        MetadataFilter::Not(child) => !matches_filter(metadata, child),
    }
}

/// Keep the documents whose metadata satisfies the optional filter.
///
/// `None` is the no-filtering sentinel: every document passes.
pub fn filter_documents<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    filter: Option<&MetadataFilter>,
) -> Vec<&'a Document> {
    documents
        .into_iter()
        .filter(|document| match filter {
            Some(filter) => matches_filter(&document.metadata, filter),
            None => true,
        })
        .collect()
}

fn evaluate_compare(field_value: &MetadataValue, op: CompareOp, value: &FilterValue) -> bool {
    match (op, value) {
        (CompareOp::Eq, FilterValue::Scalar(scalar)) => json_eq(field_value, scalar),
        (CompareOp::Ne, FilterValue::Scalar(scalar)) => !json_eq(field_value, scalar),
        (CompareOp::Gt, FilterValue::Scalar(scalar)) => {
            json_cmp(field_value, scalar).is_some_and(|o| o == Ordering::Greater)
        }
        (CompareOp::Lt, FilterValue::Scalar(scalar)) => {
            json_cmp(field_value, scalar).is_some_and(|o| o == Ordering::Less)
        }
        (CompareOp::Ge, FilterValue::Scalar(scalar)) => {
            json_cmp(field_value, scalar).is_some_and(|o| o != Ordering::Less)
        }
        (CompareOp::Le, FilterValue::Scalar(scalar)) => {
            json_cmp(field_value, scalar).is_some_and(|o| o != Ordering::Greater)
        }
        (CompareOp::In, FilterValue::List(items)) => {
            items.iter().any(|item| json_eq(field_value, item))
        }
        (CompareOp::NotIn, FilterValue::List(items)) => {
            !items.iter().any(|item| json_eq(field_value, item))
        }
        // Construction enforces operator/value arity; a mismatched pair
        // cannot satisfy anything.
        _ => false,
    }
}

/// Compare a MetadataValue with a JSON scalar for equality.
fn json_eq(meta: &MetadataValue, json: &Value) -> bool {
    match (meta, json) {
        (MetadataValue::String(s), Value::String(js)) => s == js,
        (MetadataValue::Boolean(b), Value::Bool(jb)) => b == jb,
        (MetadataValue::Integer(i), Value::Number(n)) => {
            n.as_i64().is_some_and(|ni| *i == ni)
                || n.as_f64()
                    .is_some_and(|nf| (*i as f64 - nf).abs() < f64::EPSILON)
        }
        (MetadataValue::Float(f), Value::Number(n)) => {
            n.as_f64().is_some_and(|nf| (*f - nf).abs() < f64::EPSILON)
        }
        _ => false,
    }
}

/// Compare a MetadataValue with a JSON scalar for ordering.
///
/// Numbers compare numerically. Strings compare lexicographically, which
/// orders RFC 3339 UTC timestamps correctly. Mixed types do not compare.
fn json_cmp(meta: &MetadataValue, json: &Value) -> Option<Ordering> {
    match (meta, json) {
        (MetadataValue::String(s), Value::String(js)) => Some(s.as_str().cmp(js.as_str())),
        (MetadataValue::Integer(i), Value::Number(_)) => (*i as f64).partial_cmp(&json.as_f64()?),
        (MetadataValue::Float(f), Value::Number(_)) => f.partial_cmp(&json.as_f64()?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: Vec<(&str, MetadataValue)>) -> HashMap<String, MetadataValue> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_eq_string() {
        let metadata = meta(vec![("document_extension", "md".into())]);
        let filter = MetadataFilter::eq("document_extension", "md").unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_eq_string_mismatch() {
        let metadata = meta(vec![("document_extension", "pdf".into())]);
        let filter = MetadataFilter::eq("document_extension", "md").unwrap();
        assert!(!matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_ne_operator() {
        let metadata = meta(vec![("document_extension", "md".into())]);
        let filter = MetadataFilter::ne("document_extension", "pdf").unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_gt_integer() {
        let metadata = meta(vec![("document_size", MetadataValue::Integer(2048))]);
        let filter = MetadataFilter::gt("document_size", 1024).unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_ge_le_boundaries() {
        let metadata = meta(vec![("document_size", MetadataValue::Integer(100))]);
        assert!(matches_filter(
            &metadata,
            &MetadataFilter::ge("document_size", 100).unwrap()
        ));
        assert!(matches_filter(
            &metadata,
            &MetadataFilter::le("document_size", 100).unwrap()
        ));
        assert!(!matches_filter(
            &metadata,
            &MetadataFilter::lt("document_size", 100).unwrap()
        ));
    }

    #[test]
    fn test_integer_matches_float_json() {
        let metadata = meta(vec![("document_size", MetadataValue::Integer(10))]);
        let filter = MetadataFilter::eq("document_size", 10.0).unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_in_operator() {
        let metadata = meta(vec![("document_extension", "txt".into())]);
        let filter =
            MetadataFilter::in_("document_extension", vec!["md", "txt", "rst"]).unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_not_in_operator() {
        let metadata = meta(vec![("document_extension", "bin".into())]);
        let filter = MetadataFilter::not_in("document_extension", vec!["md", "txt"]).unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_missing_field_fails_every_operator() {
        let metadata = meta(vec![]);
        for filter in [
            MetadataFilter::eq("absent", 1).unwrap(),
            MetadataFilter::ne("absent", 1).unwrap(),
            MetadataFilter::not_in("absent", vec![1]).unwrap(),
        ] {
            assert!(!matches_filter(&metadata, &filter));
        }
    }

    #[test]
    fn test_timestamp_strings_order_lexicographically() {
        let metadata = meta(vec![("ingestion_date", "2024-06-01 12:00:00".into())]);
        let filter = MetadataFilter::ge("ingestion_date", "2024-01-01 00:00:00").unwrap();
        assert!(matches_filter(&metadata, &filter));
        let filter = MetadataFilter::lt("ingestion_date", "2024-01-01 00:00:00").unwrap();
        assert!(!matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_type_mismatch_never_matches() {
        let metadata = meta(vec![("document_size", MetadataValue::Integer(42))]);
        let filter = MetadataFilter::eq("document_size", "42").unwrap();
        assert!(!matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_ordering_on_bool_metadata_fails() {
        let metadata = meta(vec![("archived", MetadataValue::Boolean(true))]);
        let filter = MetadataFilter::gt("archived", 0).unwrap();
        assert!(!matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_and_composite() {
        let metadata = meta(vec![
            ("document_extension", "md".into()),
            ("document_size", MetadataValue::Integer(512)),
        ]);
        let filter = MetadataFilter::and_(vec![
            MetadataFilter::eq("document_extension", "md").unwrap(),
            MetadataFilter::lt("document_size", 1024).unwrap(),
        ])
        .unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_or_composite() {
        let metadata = meta(vec![("document_extension", "rst".into())]);
        let filter = MetadataFilter::or_(vec![
            MetadataFilter::eq("document_extension", "md").unwrap(),
            MetadataFilter::eq("document_extension", "rst").unwrap(),
        ])
        .unwrap();
        assert!(matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_not_composite() {
        let metadata = meta(vec![("document_extension", "md".into())]);
        let filter = MetadataFilter::not_(MetadataFilter::eq("document_extension", "md").unwrap());
        assert!(!matches_filter(&metadata, &filter));
    }

    #[test]
    fn test_filter_documents_none_passes_everything() {
        let docs = vec![
            Document::new("a".to_string(), meta(vec![])),
            Document::new("b".to_string(), meta(vec![])),
        ];
        assert_eq!(filter_documents(&docs, None).len(), 2);
    }

    #[test]
    fn test_filter_documents_applies_filter() {
        let docs = vec![
            Document::new(
                "small".to_string(),
                meta(vec![("document_size", MetadataValue::Integer(10))]),
            ),
            Document::new(
                "large".to_string(),
                meta(vec![("document_size", MetadataValue::Integer(10_000))]),
            ),
        ];
        let filter = MetadataFilter::ge("document_size", 100).unwrap();
        let kept = filter_documents(&docs, Some(&filter));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "large");
    }
}
