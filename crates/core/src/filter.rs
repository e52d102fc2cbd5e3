//! Metadata filter expression model.
//!
//! A [`MetadataFilter`] is an immutable boolean expression tree over named
//! metadata fields: comparison leaves combined with `and` / `or` / `not`.
//! Trees are built through the combinator constructors ([`MetadataFilter::eq`],
//! [`MetadataFilter::and_`], …), serialized once to a JSON-compatible
//! primitive form with [`MetadataFilter::to_primitive`], and handed to a
//! retrieval backend. [`to_wire`] / [`from_wire`] add a versioned envelope
//! around the primitive form.

use crate::config::{MAX_FILTER_DEPTH, MAX_IN_LIST_LEN, WIRE_FORMAT_VERSION};
use crate::error::FilterError;
use serde_json::{json, Value};
use std::fmt;

/// Comparison operator for filter leaves.
///
/// The legal operators for a leaf depend on the declared type of the field
/// it compares against; see [`crate::schema::legal_operators`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
    /// Membership in a value list.
    In,
    /// Absence from a value list.
    NotIn,
}

impl CompareOp {
    /// Every comparison operator, in display order.
    pub const ALL: [CompareOp; 8] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Lt,
        CompareOp::Ge,
        CompareOp::Le,
        CompareOp::In,
        CompareOp::NotIn,
    ];

    /// Stable operator token used in the primitive form and UI selectors.
    ///
    /// This token set is part of the wire contract and must not change
    /// without bumping [`WIRE_FORMAT_VERSION`].
    pub fn token(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        }
    }

    /// Resolve an operator token back to the operator.
    ///
    /// An unrecognized token is a hard error, never a silent fall-through.
    pub fn from_token(token: &str) -> Result<Self, FilterError> {
        match token {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            ">" => Ok(CompareOp::Gt),
            "<" => Ok(CompareOp::Lt),
            ">=" => Ok(CompareOp::Ge),
            "<=" => Ok(CompareOp::Le),
            "in" => Ok(CompareOp::In),
            "not in" => Ok(CompareOp::NotIn),
            other => Err(FilterError::Decode(format!(
                "unrecognized operator token: {other:?}"
            ))),
        }
    }

    /// True for operators whose value is a list (`in` / `not in`).
    pub fn takes_list(self) -> bool {
        matches!(self, CompareOp::In | CompareOp::NotIn)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Value carried by a filter leaf.
///
/// Ordering and equality operators carry a single JSON scalar; `in` and
/// `not in` carry a non-empty list of scalars. The split is enforced at
/// construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A single JSON scalar (string, number, or boolean).
    Scalar(Value),
    /// A non-empty list of JSON scalars.
    List(Vec<Value>),
}

fn require_scalar(op: CompareOp, value: Value) -> Result<Value, FilterError> {
    match value {
        Value::Array(_) => Err(FilterError::Shape(format!(
            "operator {op:?} requires a scalar value, got a sequence"
        ))),
        Value::Object(_) => Err(FilterError::Shape(format!(
            "operator {op:?} requires a scalar value, got an object"
        ))),
        Value::Null => Err(FilterError::Shape(format!(
            "operator {op:?} requires a scalar value, got null"
        ))),
        scalar => Ok(scalar),
    }
}

fn require_list(op: CompareOp, value: Value) -> Result<Vec<Value>, FilterError> {
    let items = match value {
        Value::Array(items) => items,
        _ => {
            return Err(FilterError::Shape(format!(
                "operator {op:?} requires a sequence value"
            )))
        }
    };
    if items.is_empty() {
        return Err(FilterError::Shape(format!(
            "operator {op:?} requires a non-empty sequence"
        )));
    }
    if items.len() > MAX_IN_LIST_LEN {
        return Err(FilterError::Shape(format!(
            "operator {op:?} sequence exceeds {MAX_IN_LIST_LEN} elements"
        )));
    }
    for item in &items {
        if item.is_array() || item.is_object() || item.is_null() {
            return Err(FilterError::Shape(format!(
                "operator {op:?} sequence elements must be scalars"
            )));
        }
    }
    Ok(items)
}

/// A boolean filter expression over document metadata.
///
/// Immutable after construction: trees are built through the combinator
/// constructors, serialized once, and never mutated in place. Child order
/// in composites is preserved through serialization — the row editor relies
/// on ordinal position for per-row editing and deletion.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataFilter {
    /// A single comparison predicate against one metadata field.
    Compare {
        /// Comparison operator.
        op: CompareOp,
        /// Metadata field name.
        key: String,
        /// Comparison value; shape matches the operator's arity.
        value: FilterValue,
    },
    /// Conjunction of one or more child filters.
    And(Vec<MetadataFilter>),
    /// Disjunction of one or more child filters.
    Or(Vec<MetadataFilter>),
    /// Negation of exactly one child filter.
    Not(Box<MetadataFilter>),
}

impl MetadataFilter {
    /// Construct a comparison leaf, checking operator/value arity.
    ///
    /// The key is not checked against any field registry here; that is the
    /// editor/validator's concern (see [`crate::schema::FieldRegistry`]).
    pub fn leaf(
        op: CompareOp,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, FilterError> {
        let value = if op.takes_list() {
            FilterValue::List(require_list(op, value.into())?)
        } else {
            FilterValue::Scalar(require_scalar(op, value.into())?)
        };
        Ok(MetadataFilter::Compare {
            op,
            key: key.into(),
            value,
        })
    }

    /// `key == value`
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::Eq, key, value)
    }

    /// `key != value`
    pub fn ne(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::Ne, key, value)
    }

    /// `key > value`
    pub fn gt(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::Gt, key, value)
    }

    /// `key < value`
    pub fn lt(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::Lt, key, value)
    }

    /// `key >= value`
    pub fn ge(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::Ge, key, value)
    }

    /// `key <= value`
    pub fn le(key: impl Into<String>, value: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::Le, key, value)
    }

    /// `key in values` — `values` must be a non-empty sequence of scalars.
    pub fn in_(key: impl Into<String>, values: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::In, key, values)
    }

    /// `key not in values` — `values` must be a non-empty sequence of scalars.
    pub fn not_in(key: impl Into<String>, values: impl Into<Value>) -> Result<Self, FilterError> {
        Self::leaf(CompareOp::NotIn, key, values)
    }

    /// Conjunction of one or more filters, preserving child order.
    pub fn and_(children: Vec<MetadataFilter>) -> Result<Self, FilterError> {
        if children.is_empty() {
            return Err(FilterError::Arity {
                op: "and",
                expected_min: 1,
                got: 0,
            });
        }
        Ok(MetadataFilter::And(children))
    }

    /// Disjunction of one or more filters, preserving child order.
    pub fn or_(children: Vec<MetadataFilter>) -> Result<Self, FilterError> {
        if children.is_empty() {
            return Err(FilterError::Arity {
                op: "or",
                expected_min: 1,
                got: 0,
            });
        }
        Ok(MetadataFilter::Or(children))
    }

    /// Negation of a single filter.
    pub fn not_(child: MetadataFilter) -> Self {
        MetadataFilter::Not(Box::new(child))
    }

    /// Serialize to the JSON-compatible primitive form.
    ///
    /// Leaves become `{"type": <token>, "key": <key>, "value": <scalar or
    /// array>}`; composites become `{"type": "and"|"or"|"not", "value":
    /// [<child>, …]}`. This is a pure function of the tree: the same tree
    /// always produces the same output, independent of how it was built.
    pub fn to_primitive(&self) -> Value {
        match self {
            MetadataFilter::Compare { op, key, value } => {
                let value = match value {
                    FilterValue::Scalar(scalar) => scalar.clone(),
                    FilterValue::List(items) => Value::Array(items.clone()),
                };
                json!({ "type": op.token(), "key": key, "value": value })
            }
            MetadataFilter::And(children) => composite_primitive("and", children),
            MetadataFilter::Or(children) => composite_primitive("or", children),
            MetadataFilter::Not(child) => {
                json!({ "type": "not", "value": [child.to_primitive()] })
            }
        }
    }

    /// Rebuild a filter tree from its primitive form.
    ///
    /// Produces a tree structurally equivalent to the one that was
    /// serialized. Unknown `type` tags, missing keys, malformed value
    /// shapes, and nesting beyond [`MAX_FILTER_DEPTH`] are decode errors.
    pub fn from_primitive(primitive: &Value) -> Result<Self, FilterError> {
        Self::decode_node(primitive, 0)
    }

    fn decode_node(node: &Value, depth: usize) -> Result<Self, FilterError> {
        if depth > MAX_FILTER_DEPTH {
            return Err(FilterError::Decode(format!(
                "filter nesting exceeds {MAX_FILTER_DEPTH} levels"
            )));
        }
        let obj = node
            .as_object()
            .ok_or_else(|| FilterError::Decode("expected an object node".to_string()))?;
        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::Decode("missing or non-string \"type\" tag".to_string()))?;

        match tag {
            "and" | "or" | "not" => {
                let raw_children = obj.get("value").and_then(Value::as_array).ok_or_else(|| {
                    FilterError::Decode(format!("composite {tag:?} requires an array \"value\""))
                })?;
                let children = raw_children
                    .iter()
                    .map(|child| Self::decode_node(child, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                match tag {
                    "and" => Self::and_(children),
                    "or" => Self::or_(children),
                    _ => {
                        let [child]: [MetadataFilter; 1] =
                            children.try_into().map_err(|extra: Vec<MetadataFilter>| {
                                FilterError::Decode(format!(
                                    "\"not\" requires exactly one child, got {}",
                                    extra.len()
                                ))
                            })?;
                        Ok(Self::not_(child))
                    }
                }
            }
            token => {
                let op = CompareOp::from_token(token)?;
                let key = obj.get("key").and_then(Value::as_str).ok_or_else(|| {
                    FilterError::Decode(format!("leaf {token:?} requires a string \"key\""))
                })?;
                let value = obj.get("value").cloned().ok_or_else(|| {
                    FilterError::Decode(format!("leaf {token:?} requires a \"value\""))
                })?;
                Self::leaf(op, key, value)
            }
        }
    }
}

fn composite_primitive(tag: &str, children: &[MetadataFilter]) -> Value {
    let children: Vec<Value> = children.iter().map(MetadataFilter::to_primitive).collect();
    json!({ "type": tag, "value": children })
}

/// Wrap an optional filter in the versioned wire envelope.
///
/// `None` is the no-filtering sentinel and encodes as `"filter": null`,
/// which is distinguishable from every real filter tree.
pub fn to_wire(filter: Option<&MetadataFilter>) -> Value {
    let tree = match filter {
        Some(filter) => filter.to_primitive(),
        None => Value::Null,
    };
    json!({ "version": WIRE_FORMAT_VERSION, "filter": tree })
}

/// Decode a wire envelope produced by [`to_wire`].
///
/// Rejects envelopes with a missing or unsupported version tag.
pub fn from_wire(wire: &Value) -> Result<Option<MetadataFilter>, FilterError> {
    let obj = wire
        .as_object()
        .ok_or_else(|| FilterError::Decode("expected a wire envelope object".to_string()))?;
    let version = obj
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| FilterError::Decode("missing wire format version".to_string()))?;
    if version != u64::from(WIRE_FORMAT_VERSION) {
        return Err(FilterError::Decode(format!(
            "unsupported wire format version {version}, expected {WIRE_FORMAT_VERSION}"
        )));
    }
    match obj.get("filter") {
        None => Err(FilterError::Decode(
            "missing \"filter\" entry in wire envelope".to_string(),
        )),
        Some(Value::Null) => Ok(None),
        Some(node) => MetadataFilter::from_primitive(node).map(Some),
    }
}
