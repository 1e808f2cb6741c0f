//! Built-in validators.
//!
//! Every validator except `required` accepts an empty value, so any rule can
//! be attached to an optional field. Sequence values are checked per item.

use metahub_api::error::ValidationError;
use metahub_api::options::Options;
use metahub_api::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::Registries;
use crate::{edtf, identifiers};

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?|ftp)://[^\s/$.?#][^\s]*$").expect("static regex"));

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("static regex"));

pub(crate) fn register_defaults(registries: &Registries) {
    registries.register_validator("required", required);
    registries.register_validator("isbn", isbn);
    registries.register_validator("issn", issn);
    registries.register_validator("orcid", orcid);
    registries.register_validator("doi", doi);
    registries.register_validator("url", url);
    registries.register_validator("edtf", edtf_date);
    registries.register_validator("year", year);
    registries.register_validator("pattern", pattern);
    registries.register_validator("length", length);
    registries.register_validator("range", range);
    registries.register_validator("count", count);
}

fn render(value: &Value<'_>) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::to_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_text().unwrap_or_default(),
    }
}

/// Non-empty text items of a value.
fn texts(value: &Value<'_>) -> Vec<String> {
    value
        .items()
        .iter()
        .filter(|v| !v.is_empty())
        .filter_map(Value::to_text)
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Apply `check` to each text item; the first failing item is reported.
fn each_text(
    rule: &str,
    value: &Value<'_>,
    message: &str,
    check: impl Fn(&str) -> bool,
) -> Result<(), ValidationError> {
    match texts(value).into_iter().find(|t| !check(t.trim())) {
        Some(bad) => Err(ValidationError::new(rule, bad, message)),
        None => Ok(()),
    }
}

pub fn required(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    let empty = match value {
        Value::Array(items) => items.iter().all(Value::is_empty),
        other => other.is_empty(),
    };
    if empty {
        Err(ValidationError::new("required", "", "value is required"))
    } else {
        Ok(())
    }
}

pub fn isbn(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    each_text("isbn", value, "invalid ISBN checksum", identifiers::is_valid_isbn)
}

pub fn issn(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    each_text("issn", value, "invalid ISSN checksum", identifiers::is_valid_issn)
}

pub fn orcid(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    each_text("orcid", value, "invalid ORCID checksum", identifiers::is_valid_orcid)
}

pub fn doi(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    each_text("doi", value, "not a DOI", |t| {
        identifiers::is_doi(&identifiers::normalize_doi(t))
    })
}

pub fn url(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    each_text("url", value, "not an http(s) or ftp URL", |t| URL.is_match(t))
}

/// The value parses to a date of known precision.
pub fn edtf_date(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    for item in value.items() {
        let specified = match item {
            Value::Date(d) => d.is_specified() || d.is_empty(),
            Value::String(s) if s.trim().is_empty() => true,
            Value::String(s) => edtf::parse(s, Default::default()).is_specified(),
            _ => true,
        };
        if !specified {
            return Err(ValidationError::new("edtf", render(item), "not an EDTF date"));
        }
    }
    Ok(())
}

pub fn year(value: &Value<'_>, _: &Options) -> Result<(), ValidationError> {
    for item in value.items() {
        let ok = match item {
            Value::Int64(y) => (1..=2999).contains(y),
            Value::UInt64(y) => (1..=2999).contains(y),
            Value::String(s) if s.trim().is_empty() => true,
            Value::String(s) => {
                let s = s.trim();
                YEAR.is_match(s) && s.parse::<i32>().is_ok_and(|y| (1..=2999).contains(&y))
            }
            _ => true,
        };
        if !ok {
            return Err(ValidationError::new("year", render(item), "not a year between 1 and 2999"));
        }
    }
    Ok(())
}

/// Matches the `pattern` option. Without the option the rule passes.
pub fn pattern(value: &Value<'_>, options: &Options) -> Result<(), ValidationError> {
    let Some(pattern) = options.get_str("pattern") else {
        return Ok(());
    };
    let re = Regex::new(pattern).map_err(|e| {
        ValidationError::new("pattern", render(value), format!("invalid pattern: {e}"))
    })?;
    each_text(
        "pattern",
        value,
        &format!("does not match {pattern:?}"),
        |t| re.is_match(t),
    )
}

/// Text length in characters within `min_length`..=`max_length`.
pub fn length(value: &Value<'_>, options: &Options) -> Result<(), ValidationError> {
    let min = options.get_u64("min_length");
    let max = options.get_u64("max_length");
    for text in texts(value) {
        let len = text.chars().count() as u64;
        if min.is_some_and(|m| len < m) {
            return Err(ValidationError::new(
                "length",
                text,
                format!("shorter than {} characters", min.unwrap_or_default()),
            ));
        }
        if max.is_some_and(|m| len > m) {
            return Err(ValidationError::new(
                "length",
                text,
                format!("longer than {} characters", max.unwrap_or_default()),
            ));
        }
    }
    Ok(())
}

/// Numeric value within `min_value`..=`max_value`. Numeric text is accepted.
pub fn range(value: &Value<'_>, options: &Options) -> Result<(), ValidationError> {
    let min = options.get_f64("min_value");
    let max = options.get_f64("max_value");
    for item in value.items() {
        if item.is_empty() {
            continue;
        }
        let number = match item {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        };
        let Some(number) = number else {
            return Err(ValidationError::new("range", render(item), "not a number"));
        };
        let below = min.is_some_and(|m| number < m);
        let above = max.is_some_and(|m| number > m);
        if below || above {
            let bound = |b: Option<f64>| b.map(|b| b.to_string()).unwrap_or_else(|| "..".into());
            return Err(ValidationError::new(
                "range",
                render(item),
                format!("outside {}..={}", bound(min), bound(max)),
            ));
        }
    }
    Ok(())
}

/// Number of non-empty items within `min_count`..=`max_count`.
///
/// An empty value passes: presence is `required`'s job.
pub fn count(value: &Value<'_>, options: &Options) -> Result<(), ValidationError> {
    let n = value.items().iter().filter(|v| !v.is_empty()).count() as u64;
    if n == 0 {
        return Ok(());
    }
    let min = options.get_u64("min_count");
    let max = options.get_u64("max_count");
    if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
        let bound = |b: Option<u64>| b.map(|b| b.to_string()).unwrap_or_else(|| "..".into());
        return Err(ValidationError::new(
            "count",
            render(value),
            format!("{n} items, expected {}..={}", bound(min), bound(max)),
        ));
    }
    Ok(())
}
