//! Embargo codes and the computed `available` date.

use chrono::{Datelike, Months, NaiveDate};
use metahub_api::date::{DatePrecision, ParsedDate};
use metahub_api::error::HubError;
use metahub_api::record::Record;
use metahub_api::vocab::DateType;

pub const INDEFINITE_NOTE: &str = "Embargoed indefinitely";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embargo {
    None,
    /// Lifted this many months after acceptance.
    Months(u32),
    Indefinite,
}

impl Embargo {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Embargo::None),
            1 => Some(Embargo::Months(6)),
            2 => Some(Embargo::Months(12)),
            3 => Some(Embargo::Months(24)),
            4 => Some(Embargo::Indefinite),
            _ => None,
        }
    }
}

/// Derive the `available` date from the embargo code and the accepted date.
///
/// An existing `available` date is replaced. An indefinite embargo adds a
/// note instead of a date.
pub fn apply_embargo(code: Option<i64>, record: &mut Record) -> Result<(), HubError> {
    let Some(code) = code else {
        return Ok(());
    };
    let embargo = Embargo::from_code(code)
        .ok_or_else(|| HubError::hook(format!("unknown embargo code {code}")))?;
    let months = match embargo {
        Embargo::None => return Ok(()),
        Embargo::Indefinite => {
            record.notes.push(INDEFINITE_NOTE.to_string());
            return Ok(());
        }
        Embargo::Months(months) => months,
    };

    let accepted = record
        .date(DateType::Accepted)
        .filter(|d| d.year.is_some() && !d.is_range)
        .ok_or_else(|| {
            HubError::hook(format!("embargo code {code} needs an accepted date"))
        })?;
    let available = lift_date(accepted, months)?;
    tracing::debug!(code, available = %available.raw, "computed embargo lift date");

    match record.date_mut(DateType::Available) {
        Some(existing) => *existing = available,
        None => record.dates.push(available),
    }
    Ok(())
}

fn lift_date(accepted: &ParsedDate, months: u32) -> Result<ParsedDate, HubError> {
    let year = accepted.year.unwrap_or_default();
    let start = NaiveDate::from_ymd_opt(
        year,
        accepted.month.unwrap_or(1),
        accepted.day.unwrap_or(1),
    )
    .ok_or_else(|| HubError::hook(format!("invalid accepted date '{}'", accepted.raw)))?;
    let lifted = start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| HubError::hook("embargo lift date out of range"))?;

    let precision = match accepted.precision {
        DatePrecision::Day | DatePrecision::Time => DatePrecision::Day,
        DatePrecision::Month => DatePrecision::Month,
        _ if months % 12 == 0 => DatePrecision::Year,
        _ => DatePrecision::Month,
    };
    let mut date = ParsedDate {
        date_type: DateType::Available,
        year: Some(lifted.year()),
        month: (precision != DatePrecision::Year).then(|| lifted.month()),
        day: (precision == DatePrecision::Day).then(|| lifted.day()),
        precision,
        ..ParsedDate::default()
    };
    date.raw = date.to_edtf();
    Ok(date)
}

#[cfg(test)]
mod tests {
    use metahub_api::date::DateQualifier;
    use rstest::rstest;

    use super::*;

    fn accepted(year: i32, month: Option<u32>, day: Option<u32>, precision: DatePrecision) -> Record {
        let mut record = Record::new();
        record.dates.push(ParsedDate {
            date_type: DateType::Accepted,
            year: Some(year),
            month,
            day,
            precision,
            qualifier: DateQualifier::None,
            raw: String::new(),
            ..ParsedDate::default()
        });
        record
    }

    #[rstest]
    #[case(1, "2021-11-15")]
    #[case(2, "2022-05-15")]
    #[case(3, "2023-05-15")]
    fn lifts_after_the_coded_period(#[case] code: i64, #[case] expected: &str) {
        let mut record = accepted(2021, Some(5), Some(15), DatePrecision::Day);
        apply_embargo(Some(code), &mut record).unwrap();
        let available = record.date(DateType::Available).unwrap();
        assert_eq!(available.raw, expected);
        assert_eq!(available.precision, DatePrecision::Day);
    }

    #[test]
    fn month_end_is_clamped() {
        let mut record = accepted(2021, Some(8), Some(31), DatePrecision::Day);
        apply_embargo(Some(1), &mut record).unwrap();
        assert_eq!(record.date(DateType::Available).unwrap().raw, "2022-02-28");
    }

    #[test]
    fn year_precision_is_kept_for_whole_years() {
        let mut record = accepted(2020, None, None, DatePrecision::Year);
        apply_embargo(Some(2), &mut record).unwrap();
        assert_eq!(record.date(DateType::Available).unwrap().raw, "2021");

        let mut record = accepted(2020, None, None, DatePrecision::Year);
        apply_embargo(Some(1), &mut record).unwrap();
        assert_eq!(record.date(DateType::Available).unwrap().raw, "2020-07");
    }

    #[test]
    fn no_embargo_and_indefinite_embargo() {
        let mut record = accepted(2020, None, None, DatePrecision::Year);
        apply_embargo(Some(0), &mut record).unwrap();
        apply_embargo(None, &mut record).unwrap();
        assert!(record.date(DateType::Available).is_none());

        apply_embargo(Some(4), &mut record).unwrap();
        assert!(record.date(DateType::Available).is_none());
        assert_eq!(record.notes, vec![INDEFINITE_NOTE]);
    }

    #[test]
    fn errors_without_accepted_date_or_with_unknown_code() {
        let mut record = Record::new();
        assert!(apply_embargo(Some(1), &mut record).is_err());
        assert!(apply_embargo(Some(9), &mut record).is_err());
    }

    #[test]
    fn replaces_an_existing_available_date() {
        let mut record = accepted(2021, Some(5), Some(15), DatePrecision::Day);
        record.dates.push(ParsedDate::unparsed("soon").with_type(DateType::Available));
        apply_embargo(Some(1), &mut record).unwrap();
        let available: Vec<_> = record
            .dates
            .iter()
            .filter(|d| d.date_type == DateType::Available)
            .collect();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].raw, "2021-11-15");
    }
}
