//! Host value marshalling
//!
//! The host hands us dynamically-typed values. This module models them as a
//! closed union ([`HostValue`]) and narrows them into the only shapes the
//! exported operations ever accept ([`Arg`]): a string, an ordered sequence
//! of strings, or nothing at all. Anything else is rejected with the name of
//! the offending kind, never coerced.
//!
//! Results travel the other way as an [`Outcome`], which always has a
//! faithful [`HostValue`] representation.

use std::collections::BTreeMap;
use std::fmt;

/// The dynamic kind of a host value, named the way the host names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
    Handle,
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Undefined => "undefined",
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Handle => "handle",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque reference to an object owned by the host (a function, a buffer, ...)
///
/// We never look inside one; it only exists so such arguments can be
/// represented and then rejected with a useful kind name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

/// A dynamically-typed value as seen on the host side of the boundary
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<HostValue>),
    Object(BTreeMap<String, HostValue>),
    Handle(HandleId),
}

impl HostValue {
    pub fn kind(&self) -> Kind {
        match self {
            HostValue::Undefined => Kind::Undefined,
            HostValue::Null => Kind::Null,
            HostValue::Bool(_) => Kind::Boolean,
            HostValue::Number(_) => Kind::Number,
            HostValue::String(_) => Kind::String,
            HostValue::Array(_) => Kind::Array,
            HostValue::Object(_) => Kind::Object,
            HostValue::Handle(_) => Kind::Handle,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render as JSON for hosts that speak it.
    ///
    /// `undefined` and handles have no JSON form and become `null`, as do
    /// non-finite numbers.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            HostValue::Undefined | HostValue::Null | HostValue::Handle(_) => Value::Null,
            HostValue::Bool(b) => Value::Bool(*b),
            HostValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            HostValue::String(s) => Value::String(s.clone()),
            HostValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            HostValue::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(b),
            // every JSON number fits the host's single numeric kind
            Value::Number(n) => HostValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => HostValue::String(s),
            Value::Array(items) => HostValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(fields) => {
                HostValue::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        HostValue::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Errors raised while narrowing a host value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
    #[error("unexpected dynamic kind: {kind}")]
    UnexpectedKind { kind: Kind },
    #[error("unexpected dynamic kind at index {index}: {kind}")]
    UnexpectedElementKind { index: usize, kind: Kind },
}

/// An inbound argument after marshalling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    String(String),
    StringSequence(Vec<String>),
    Absent,
}

impl Arg {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Arg::String(_) => "string",
            Arg::StringSequence(_) => "array of strings",
            Arg::Absent => "absent",
        }
    }
}

impl TryFrom<&HostValue> for Arg {
    type Error = MarshalError;

    fn try_from(value: &HostValue) -> Result<Self, Self::Error> {
        match value {
            HostValue::Undefined | HostValue::Null => Ok(Arg::Absent),
            HostValue::String(s) => Ok(Arg::String(s.clone())),
            HostValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    HostValue::String(s) => Ok(s.clone()),
                    other => Err(MarshalError::UnexpectedElementKind {
                        index,
                        kind: other.kind(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Arg::StringSequence),
            other => Err(MarshalError::UnexpectedKind { kind: other.kind() }),
        }
    }
}

/// A successful operation result, before it crosses back to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Text(String),
    Pair(String, String),
}

impl From<Outcome> for HostValue {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Text(text) => HostValue::String(text),
            Outcome::Pair(first, second) => {
                HostValue::Array(vec![HostValue::String(first), HostValue::String(second)])
            }
        }
    }
}
