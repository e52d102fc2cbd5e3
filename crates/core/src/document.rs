//! Document and metadata value types.
//!
//! A `Document` is the unit of retrieval: text content, a unique UUID, and
//! arbitrary key-value metadata. `MetadataValue` supports boolean, integer,
//! float, and string values; filter leaves compare these against JSON
//! scalars during evaluation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A typed metadata value attached to a document.
///
/// Ingestion populates these from document properties (name, size,
/// timestamps); the matcher compares them against filter leaf values.
/// Timestamps are stored as RFC 3339 UTC strings, which order correctly
/// under lexicographic comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// Boolean value (`true` / `false`).
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating-point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Boolean(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

/// A retrievable document with text content, unique ID, and metadata.
///
/// Documents are what filters narrow down: a retrieval backend evaluates a
/// filter tree against each document's metadata map and keeps the matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (UUID v4).
    pub id: Uuid,
    /// Text content of the document.
    pub text: String,
    /// Key-value metadata that filters evaluate against.
    pub metadata: HashMap<String, MetadataValue>,
}

impl Document {
    /// Creates a new document with a random UUID.
    pub fn new(text: String, metadata: HashMap<String, MetadataValue>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            metadata,
        }
    }

    /// Creates a document with a specific UUID.
    pub fn with_id(id: Uuid, text: String, metadata: HashMap<String, MetadataValue>) -> Self {
        Self { id, text, metadata }
    }
}
