use std::borrow::Cow;

use base64::Engine;

use crate::date::ParsedDate;
use crate::record::ParsedName;
use crate::reflect::{Describable, message_to_json};

/// Coerced field value, handed to parsers, validators, serializers and the router.
///
/// Strategy by type:
/// - Scalars (Int64, Float64, Bool): copied out of the source
/// - String, Bytes: `Cow`, borrowed from the source message when possible
/// - Message: borrowed handle, walked generically by the router
/// - Date, Name: produced by parsers
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    String(Cow<'a, str>),
    /// Opaque binary data.
    Bytes(Cow<'a, [u8]>),
    Message(&'a dyn Describable),
    Array(Vec<Value<'a>>),
    Map(Vec<(String, Value<'a>)>),
    Date(ParsedDate),
    Name(ParsedName),
}

impl<'a> Value<'a> {
    pub fn str(s: &'a str) -> Self {
        Value::String(Cow::Borrowed(s))
    }

    pub fn owned(s: impl Into<String>) -> Self {
        Value::String(Cow::Owned(s.into()))
    }

    /// Null, blank text, or an empty container.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Date(d) => d.is_empty(),
            Value::Name(n) => n.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::UInt64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar rendered as text. `None` for containers and messages.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(v) => Some(v.to_string()),
            Value::Int64(v) => Some(v.to_string()),
            Value::UInt64(v) => Some(v.to_string()),
            Value::Float64(v) => Some(v.to_string()),
            Value::String(s) => Some(s.to_string()),
            Value::Bytes(b) => Some(base64::engine::general_purpose::STANDARD.encode(b)),
            Value::Date(d) => Some(d.to_edtf()),
            Value::Name(n) => Some(n.display()),
            Value::Message(_) | Value::Array(_) | Value::Map(_) => None,
        }
    }

    /// Items of an array, or the value itself as a single item.
    pub fn items(&self) -> &[Value<'a>] {
        match self {
            Value::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    pub fn into_items(self) -> Vec<Value<'a>> {
        match self {
            Value::Array(items) => items,
            other => vec![other],
        }
    }

    /// Detach from the source message. Message handles become their JSON form.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Bool(v) => Value::Bool(v),
            Value::Int64(v) => Value::Int64(v),
            Value::UInt64(v) => Value::UInt64(v),
            Value::Float64(v) => Value::Float64(v),
            Value::String(s) => Value::String(Cow::Owned(s.into_owned())),
            Value::Bytes(b) => Value::Bytes(Cow::Owned(b.into_owned())),
            Value::Message(m) => Value::String(Cow::Owned(message_to_json(m).to_string())),
            Value::Array(items) => Value::Array(items.into_iter().map(Value::into_owned).collect()),
            Value::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_owned()))
                    .collect(),
            ),
            Value::Date(d) => Value::Date(d),
            Value::Name(n) => Value::Name(n),
        }
    }

    /// JSON rendering, used for `Record::extra`. Bytes are base64.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int64(v) => serde_json::json!(v),
            Value::UInt64(v) => serde_json::json!(v),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Bytes(b) => {
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::Message(m) => message_to_json(*m),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Date(d) => serde_json::to_value(d).unwrap_or(serde_json::Value::Null),
            Value::Name(n) => serde_json::to_value(n).unwrap_or(serde_json::Value::Null),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            // Identity: same source message.
            (Value::Message(a), Value::Message(b)) => std::ptr::addr_eq(*a, *b),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Name(a), Value::Name(b)) => a == b,
            _ => false,
        }
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl From<ParsedDate> for Value<'_> {
    fn from(d: ParsedDate) -> Self {
        Value::Date(d)
    }
}

impl From<ParsedName> for Value<'_> {
    fn from(n: ParsedName) -> Self {
        Value::Name(n)
    }
}
