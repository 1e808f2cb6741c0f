//! Built-in serializers, used by format writers when exporting a record.

use metahub_api::error::HubError;
use metahub_api::options::Options;
use metahub_api::value::Value;
use metahub_api::vocab::DateType;

use crate::registry::Registries;
use crate::{edtf, identifiers, names};

const DEFAULT_JOIN: &str = "; ";

pub(crate) fn register_defaults(registries: &Registries) {
    registries.register_serializer("edtf", edtf_date);
    registries.register_serializer("name_inverted", name_inverted);
    registries.register_serializer("name_display", name_display);
    registries.register_serializer("join", join);
    registries.register_serializer("doi_url", doi_url);
    registries.register_serializer("year", year);
}

fn unsupported(serializer: &str, value: &Value<'_>) -> HubError {
    HubError::serialize(format!("{serializer} cannot render {value:?}"))
}

/// Dates render as EDTF; text is parsed first and rendered back.
pub fn edtf_date(value: &Value<'_>, _: &Options) -> Result<String, HubError> {
    match value {
        Value::Date(d) => Ok(d.to_edtf()),
        Value::String(s) => Ok(edtf::parse(s, DateType::Other).to_edtf()),
        Value::Int64(y) => Ok(format!("{y:04}")),
        Value::Null => Ok(String::new()),
        other => Err(unsupported("edtf", other)),
    }
}

/// "Family, Given Middle, Suffix".
pub fn name_inverted(value: &Value<'_>, _: &Options) -> Result<String, HubError> {
    match value {
        Value::Name(n) => Ok(n.inverted()),
        Value::String(s) => Ok(names::parse_name(s).inverted()),
        Value::Null => Ok(String::new()),
        other => Err(unsupported("name_inverted", other)),
    }
}

/// "Given Middle Family Suffix".
pub fn name_display(value: &Value<'_>, _: &Options) -> Result<String, HubError> {
    match value {
        Value::Name(n) => Ok(n.display()),
        Value::String(s) => Ok(names::parse_name(s).display()),
        Value::Null => Ok(String::new()),
        other => Err(unsupported("name_display", other)),
    }
}

/// Sequence → delimited text. `delimiter` option, default `"; "`.
pub fn join(value: &Value<'_>, options: &Options) -> Result<String, HubError> {
    let delimiter = options.get_str("delimiter").unwrap_or(DEFAULT_JOIN);
    let mut parts = Vec::new();
    for item in value.items() {
        if item.is_empty() {
            continue;
        }
        let text = item.to_text().ok_or_else(|| unsupported("join", item))?;
        parts.push(text);
    }
    Ok(parts.join(delimiter))
}

pub fn doi_url(value: &Value<'_>, _: &Options) -> Result<String, HubError> {
    match value {
        Value::String(s) if s.trim().is_empty() => Ok(String::new()),
        Value::String(s) => Ok(format!("https://doi.org/{}", identifiers::normalize_doi(s))),
        Value::Null => Ok(String::new()),
        other => Err(unsupported("doi_url", other)),
    }
}

pub fn year(value: &Value<'_>, _: &Options) -> Result<String, HubError> {
    let year = match value {
        Value::Date(d) => d.year.map(i64::from),
        Value::Int64(y) => Some(*y),
        Value::UInt64(y) => i64::try_from(*y).ok(),
        Value::String(s) => edtf::extract_year(s).map(i64::from),
        Value::Null => return Ok(String::new()),
        other => return Err(unsupported("year", other)),
    };
    Ok(year.map(|y| format!("{y:04}")).unwrap_or_default())
}
