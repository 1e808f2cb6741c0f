//! Built-in parsers.

use metahub_api::error::HubError;
use metahub_api::options::Options;
use metahub_api::value::Value;
use metahub_api::vocab::DateType;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::Registries;
use crate::{edtf, identifiers, names, relator};

/// Delimiter of the `split` parser when neither the field nor the config sets one.
pub const DEFAULT_DELIMITER: &str = ";";

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

pub(crate) fn register_defaults(registries: &Registries) {
    registries.register_parser("strip_html", strip_html);
    registries.register_parser("normalize_whitespace", normalize_whitespace);
    registries.register_parser("trim", trim);
    registries.register_parser("lowercase", lowercase);
    registries.register_parser("year", year);
    registries.register_parser("edtf", edtf_date);
    registries.register_parser("iso8601", iso8601);
    registries.register_parser("split", split);
    registries.register_parser("doi", doi);
    registries.register_parser("isbn", isbn);
    registries.register_parser("issn", issn);
    registries.register_parser("orcid", orcid);
    registries.register_parser("name", name);
    registries.register_parser("name_list", name_list);
    registries.register_parser("relator", relator_role);
    registries.register_parser("relator_code", relator_code);
}

fn collapse(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop tags, decode the common entities, collapse whitespace.
pub fn strip_html(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    let text = TAG.replace_all(input, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    Ok(Value::owned(collapse(&text)))
}

pub fn normalize_whitespace(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(collapse(input)))
}

pub fn trim(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(input.trim()))
}

pub fn lowercase(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(input.trim().to_lowercase()))
}

pub fn year(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    edtf::extract_year(input)
        .map(|y| Value::Int64(i64::from(y)))
        .ok_or_else(|| HubError::parse(format!("no year in {input:?}")))
}

/// EDTF date. Never fails; the `date_type` option sets the date type.
pub fn edtf_date(input: &str, options: &Options) -> Result<Value<'static>, HubError> {
    let date_type = options
        .get_str("date_type")
        .and_then(DateType::from_name)
        .unwrap_or_default();
    Ok(Value::Date(edtf::parse(input, date_type)))
}

/// Normalized ISO 8601 / EDTF text.
pub fn iso8601(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    let date = edtf::parse(input, DateType::Other);
    if date.is_specified() {
        Ok(Value::owned(date.to_edtf()))
    } else {
        Err(HubError::parse(format!("not an ISO 8601 date: {input:?}")))
    }
}

/// Split on the `delimiter` option; blank items are dropped.
pub fn split(input: &str, options: &Options) -> Result<Value<'static>, HubError> {
    let delimiter = options
        .get_str("delimiter")
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DELIMITER);
    Ok(Value::Array(
        input
            .split(delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Value::owned)
            .collect(),
    ))
}

pub fn doi(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(identifiers::normalize_doi(input)))
}

pub fn isbn(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(identifiers::normalize_isbn(input)))
}

pub fn issn(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(identifiers::normalize_issn(input)))
}

pub fn orcid(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(identifiers::normalize_orcid(input)))
}

pub fn name(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::Name(names::parse_name(input)))
}

/// `"Doe, Jane and Roe, Richard"` → sequence of names.
pub fn name_list(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::Array(
        names::split_name_list(input)
            .into_iter()
            .map(|n| Value::Name(names::parse_name(n)))
            .collect(),
    ))
}

/// MARC relator code or label → normalized role name.
pub fn relator_role(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    relator::lookup(input)
        .map(|r| Value::owned(r.role.as_str()))
        .ok_or_else(|| HubError::parse(format!("unknown relator {input:?}")))
}

/// MARC relator code or label → three-letter code.
pub fn relator_code(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    relator::lookup(input)
        .map(|r| Value::owned(r.code))
        .ok_or_else(|| HubError::parse(format!("unknown relator {input:?}")))
}
