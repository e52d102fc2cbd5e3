//! # docsift-core
//!
//! Typed, composable metadata filter expressions for retrieval pipelines.
//!
//! A [`MetadataFilter`] is an immutable boolean expression tree over named
//! metadata fields: comparison leaves (`==`, `>=`, `in`, …) combined with
//! `and` / `or` / `not`. Trees serialize to a stable JSON-compatible
//! primitive form — the wire contract with a retrieval backend — and
//! round-trip losslessly through [`MetadataFilter::from_primitive`].
//!
//! A [`FieldRegistry`] declares the metadata schema (field name → declared
//! type) and the legal operators per type. A [`FilterBuilder`] models the
//! row-based interactive editor: independently edited, possibly incomplete
//! rows reduced to one filter. [`matches_filter`] is the reference
//! evaluator for the wire contract against in-memory documents.

/// Row-based interactive filter construction and the reduction rule.
pub mod builder;
/// Wire-format version and defensive limits.
pub mod config;
/// Document and metadata value types.
pub mod document;
/// Library error type.
pub mod error;
/// The filter expression tree, combinators, and primitive serialization.
pub mod filter;
/// Filter evaluation against document metadata.
pub mod matcher;
/// Field registry and operator compatibility rules.
pub mod schema;

pub use builder::{FilterBuilder, FilterRow};
pub use document::{Document, MetadataValue};
pub use error::FilterError;
pub use filter::{from_wire, to_wire, CompareOp, FilterValue, MetadataFilter};
pub use matcher::{filter_documents, matches_filter};
pub use schema::{legal_operators, FieldRegistry, FieldSpec, FieldType};
