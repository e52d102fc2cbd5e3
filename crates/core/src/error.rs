//! Library error type for filter construction, validation, and decoding.

use thiserror::Error;

/// Errors raised by filter construction, registry validation, and
/// primitive-form decoding.
///
/// All failures surface synchronously at the call site; there is no
/// deferred validation at serialization time. "Not yet specified" editor
/// rows are not errors — they are silently excluded during combination.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Operator/value arity mismatch on a leaf, an operator outside the
    /// legal set for the field's declared type, or a value incompatible
    /// with that type.
    #[error("invalid filter shape: {0}")]
    Shape(String),

    /// Composite constructed with too few children.
    #[error("{op:?} requires at least {expected_min} child filter(s), got {got}")]
    Arity {
        /// Connective token (`"and"` or `"or"`).
        op: &'static str,
        /// Minimum number of children the connective accepts.
        expected_min: usize,
        /// Number of children actually supplied.
        got: usize,
    },

    /// A filter references a field absent from the registry.
    #[error("unknown metadata field: {0:?}")]
    UnknownField(String),

    /// The primitive form could not be decoded into a filter tree.
    #[error("cannot decode filter: {0}")]
    Decode(String),
}
