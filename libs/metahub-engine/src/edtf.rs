//! EDTF (Extended Date/Time Format) parsing, Level 0 and the Level 1
//! qualifiers, intervals and unspecified-digit shorthands.
//!
//! [`parse`] never fails. Input that no rule matches comes back with `raw`
//! set and [`DatePrecision::Unspecified`].
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. RFC 3339 timestamp
//! 2. loosely delimited timestamps (`2021-05-04 10:30:00`, ...)
//! 3. interval `start/end`, either side may be open (`..` or empty)
//! 4. `YYYY-MM-DD` with optional qualifier
//! 5. `YYYY-MM` with optional qualifier
//! 6. `YYYY` with optional qualifier
//! 7. decade (`197X`, `1970s`)
//! 8. century (`19XX`)
//! 9. bare year, 1 to 2999
//!
//! Every pattern is anchored, so the rules never overlap.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use metahub_api::date::{DatePrecision, DateQualifier, ParsedDate};
use metahub_api::vocab::DateType;
use once_cell::sync::Lazy;
use regex::Regex;

const LOOSE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

static DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})([~?%])?$").expect("static regex"));

static MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})([~?%])?$").expect("static regex"));

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})([~?%])?$").expect("static regex"));

static DECADE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{3})(?:[Xx]|0s)$").expect("static regex"));

static CENTURY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2})[Xx]{2}$").expect("static regex"));

static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,4}$").expect("static regex"));

/// Parse `input` into a date of type `date_type`.
pub fn parse(input: &str, date_type: DateType) -> ParsedDate {
    let mut date = parse_trimmed(input.trim()).unwrap_or_default();
    date.raw = input.to_string();
    date.date_type = date_type;
    date
}

fn parse_trimmed(s: &str) -> Option<ParsedDate> {
    if s.is_empty() {
        return None;
    }
    timestamp(s)
        .or_else(|| loose_timestamp(s))
        .or_else(|| interval(s))
        .or_else(|| single(s))
}

/// Rules 4 to 9: one date, no interval.
fn single(s: &str) -> Option<ParsedDate> {
    day(s)
        .or_else(|| month(s))
        .or_else(|| year(s))
        .or_else(|| decade(s))
        .or_else(|| century(s))
        .or_else(|| bare_year(s))
}

fn timestamp(s: &str) -> Option<ParsedDate> {
    let dt = DateTime::parse_from_rfc3339(s).ok()?;
    Some(from_naive(dt.naive_local().date()))
}

fn loose_timestamp(s: &str) -> Option<ParsedDate> {
    LOOSE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| from_naive(dt.date()))
}

fn from_naive(date: NaiveDate) -> ParsedDate {
    ParsedDate {
        year: Some(date.year()),
        month: Some(date.month()),
        day: Some(date.day()),
        precision: DatePrecision::Time,
        ..ParsedDate::default()
    }
}

fn is_open(side: &str) -> bool {
    side.is_empty() || side == ".."
}

fn interval(s: &str) -> Option<ParsedDate> {
    let (start, end) = s.split_once('/')?;
    let (start, end) = (start.trim(), end.trim());
    if is_open(start) && is_open(end) {
        return None;
    }
    let start = if is_open(start) { None } else { Some(interval_half(start)?) };
    let end = if is_open(end) { None } else { Some(interval_half(end)?) };

    let mut date = match &start {
        Some(start) => start.clone(),
        None => ParsedDate {
            // Open start: the end decides how precise the range is.
            precision: end.as_ref().map(|e| e.precision).unwrap_or_default(),
            ..ParsedDate::default()
        },
    };
    date.is_range = true;
    if let Some(end) = end {
        date.end_year = end.year;
        date.end_month = end.month;
        date.end_day = end.day;
    }
    Some(date)
}

/// Either side of an interval goes through the whole cascade. Intervals
/// do not nest.
fn interval_half(s: &str) -> Option<ParsedDate> {
    if s.contains('/') {
        return None;
    }
    parse_trimmed(s)
}

fn qualifier(m: Option<regex::Match<'_>>) -> DateQualifier {
    m.and_then(|m| m.as_str().chars().next())
        .and_then(DateQualifier::from_marker)
        .unwrap_or_default()
}

fn day(s: &str) -> Option<ParsedDate> {
    let caps = DAY.captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    // Calendar-invalid dates fall through to raw.
    NaiveDate::from_ymd_opt(year, month, day)?;
    Some(ParsedDate {
        year: Some(year),
        month: Some(month),
        day: Some(day),
        precision: DatePrecision::Day,
        qualifier: qualifier(caps.get(4)),
        ..ParsedDate::default()
    })
}

fn month(s: &str) -> Option<ParsedDate> {
    let caps = MONTH.captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(ParsedDate {
        year: Some(year),
        month: Some(month),
        precision: DatePrecision::Month,
        qualifier: qualifier(caps.get(3)),
        ..ParsedDate::default()
    })
}

fn year(s: &str) -> Option<ParsedDate> {
    let caps = YEAR.captures(s)?;
    Some(ParsedDate {
        year: Some(caps[1].parse().ok()?),
        precision: DatePrecision::Year,
        qualifier: qualifier(caps.get(2)),
        ..ParsedDate::default()
    })
}

fn decade(s: &str) -> Option<ParsedDate> {
    let caps = DECADE.captures(s)?;
    let prefix: i32 = caps[1].parse().ok()?;
    Some(ParsedDate {
        year: Some(prefix * 10),
        precision: DatePrecision::Decade,
        ..ParsedDate::default()
    })
}

fn century(s: &str) -> Option<ParsedDate> {
    let caps = CENTURY.captures(s)?;
    let prefix: i32 = caps[1].parse().ok()?;
    Some(ParsedDate {
        year: Some(prefix * 100),
        precision: DatePrecision::Century,
        ..ParsedDate::default()
    })
}

fn bare_year(s: &str) -> Option<ParsedDate> {
    if !BARE_YEAR.is_match(s) {
        return None;
    }
    let year: i32 = s.parse().ok()?;
    if !(1..=2999).contains(&year) {
        return None;
    }
    Some(ParsedDate {
        year: Some(year),
        precision: DatePrecision::Year,
        ..ParsedDate::default()
    })
}

/// Year of a parseable date, else the first standalone four-digit number.
pub fn extract_year(input: &str) -> Option<i32> {
    static ANY_YEAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("static regex"));
    let parsed = parse(input, DateType::Other);
    if parsed.is_specified() {
        if let Some(year) = parsed.year {
            return Some(year);
        }
    }
    ANY_YEAR
        .captures(input)
        .and_then(|caps| caps[1].parse().ok())
        .filter(|y| (1..=2999).contains(y))
}
