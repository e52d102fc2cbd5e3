//! Global constants for docsift-core.
//!
//! Wire-format versioning and defensive input limits. These are
//! compile-time constants; the metadata schema itself is runtime
//! configuration (see [`crate::schema::FieldRegistry`]).

/// Version tag embedded in the wire envelope (`to_wire` / `from_wire`).
///
/// Bumped whenever the primitive form changes shape, so a retrieval
/// backend can reject envelopes it does not understand.
pub const WIRE_FORMAT_VERSION: u32 = 1;

/// Maximum nesting depth accepted when decoding a primitive filter tree.
///
/// Filters built by the row editor are at most two levels deep; anything
/// approaching this limit is malformed or hostile input.
pub const MAX_FILTER_DEPTH: usize = 32;

/// Maximum number of elements in an `in` / `not in` value list.
pub const MAX_IN_LIST_LEN: usize = 1_024;

/// Maximum number of rows a [`crate::builder::FilterBuilder`] will hold.
pub const MAX_FILTER_ROWS: usize = 64;
