use crate::error::{HubError, ValidationError};
use crate::options::Options;
use crate::value::Value;

/// Turns raw text into a typed value.
///
/// A parser solves one task: `"2020-05~"` becomes a `Value::Date`,
/// `"Doe, Jane"` becomes a `Value::Name`. The output never borrows the input.
///
/// Any `Fn(&str, &Options) -> Result<Value<'static>, HubError>` is a parser.
pub trait FieldParser: Send + Sync {
    fn parse(&self, input: &str, options: &Options) -> Result<Value<'static>, HubError>;
}

impl<F> FieldParser for F
where
    F: Fn(&str, &Options) -> Result<Value<'static>, HubError> + Send + Sync,
{
    fn parse(&self, input: &str, options: &Options) -> Result<Value<'static>, HubError> {
        self(input, options)
    }
}

/// Checks one value against one rule.
pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &Value<'_>, options: &Options) -> Result<(), ValidationError>;
}

impl<F> FieldValidator for F
where
    F: Fn(&Value<'_>, &Options) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, value: &Value<'_>, options: &Options) -> Result<(), ValidationError> {
        self(value, options)
    }
}

/// Renders a value back to text for export.
pub trait FieldSerializer: Send + Sync {
    fn serialize(&self, value: &Value<'_>, options: &Options) -> Result<String, HubError>;
}

impl<F> FieldSerializer for F
where
    F: Fn(&Value<'_>, &Options) -> Result<String, HubError> + Send + Sync,
{
    fn serialize(&self, value: &Value<'_>, options: &Options) -> Result<String, HubError> {
        self(value, options)
    }
}
