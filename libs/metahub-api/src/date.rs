use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::vocab::DateType;

/// Most specific component that was successfully parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePrecision {
    #[default]
    Unspecified,
    Year,
    Month,
    Day,
    Decade,
    Century,
    Time,
}

/// EDTF qualifier carried by a trailing `~`, `?` or `%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateQualifier {
    #[default]
    None,
    Approximate,
    Uncertain,
    ApproximateUncertain,
}

impl DateQualifier {
    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '~' => Some(DateQualifier::Approximate),
            '?' => Some(DateQualifier::Uncertain),
            '%' => Some(DateQualifier::ApproximateUncertain),
            _ => None,
        }
    }

    pub fn marker(self) -> Option<char> {
        match self {
            DateQualifier::None => None,
            DateQualifier::Approximate => Some('~'),
            DateQualifier::Uncertain => Some('?'),
            DateQualifier::ApproximateUncertain => Some('%'),
        }
    }
}

/// A normalized date, as produced by the EDTF parser.
///
/// Unparseable input is still a `ParsedDate`: `raw` keeps the input and
/// `precision` stays [`DatePrecision::Unspecified`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedDate {
    #[serde(rename = "type")]
    pub date_type: DateType,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub end_year: Option<i32>,
    pub end_month: Option<u32>,
    pub end_day: Option<u32>,
    pub precision: DatePrecision,
    pub qualifier: DateQualifier,
    pub is_range: bool,
    pub raw: String,
}

impl ParsedDate {
    /// A date that could not be parsed; only the raw text survives.
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    pub fn is_specified(&self) -> bool {
        self.precision != DatePrecision::Unspecified
    }

    /// Nothing parsed and nothing kept.
    pub fn is_empty(&self) -> bool {
        !self.is_specified() && self.year.is_none() && self.raw.trim().is_empty()
    }

    pub fn with_type(mut self, date_type: DateType) -> Self {
        self.date_type = date_type;
        self
    }

    /// Render back to an EDTF literal. Unspecified dates render their raw text.
    pub fn to_edtf(&self) -> String {
        if !self.is_specified() {
            return self.raw.clone();
        }
        let mut out = self.start_edtf();
        if self.is_range {
            out.push('/');
            match self.end_year {
                Some(year) => out.push_str(&ymd(year, self.end_month, self.end_day)),
                None => out.push_str(".."),
            }
        }
        out
    }

    fn start_edtf(&self) -> String {
        let Some(year) = self.year else {
            return "..".to_string();
        };
        let mut out = match self.precision {
            DatePrecision::Decade => format!("{:03}X", year.div_euclid(10)),
            DatePrecision::Century => format!("{:02}XX", year.div_euclid(100)),
            DatePrecision::Year => format!("{year:04}"),
            _ => ymd(year, self.month, self.day),
        };
        if let Some(marker) = self.qualifier.marker() {
            out.push(marker);
        }
        out
    }
}

fn ymd(year: i32, month: Option<u32>, day: Option<u32>) -> String {
    let mut out = format!("{year:04}");
    if let Some(month) = month {
        let _ = write!(out, "-{month:02}");
        if let Some(day) = day {
            let _ = write!(out, "-{day:02}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_day_precision_with_qualifier() {
        let date = ParsedDate {
            year: Some(1978),
            month: Some(3),
            day: Some(15),
            precision: DatePrecision::Day,
            qualifier: DateQualifier::Uncertain,
            raw: "1978-03-15?".into(),
            ..ParsedDate::default()
        };
        assert_eq!(date.to_edtf(), "1978-03-15?");
    }

    #[test]
    fn renders_ranges_and_open_ends() {
        let date = ParsedDate {
            year: Some(1978),
            precision: DatePrecision::Year,
            is_range: true,
            end_year: Some(1980),
            end_month: Some(5),
            ..ParsedDate::default()
        };
        assert_eq!(date.to_edtf(), "1978/1980-05");

        let open = ParsedDate {
            end_year: None,
            ..date
        };
        assert_eq!(open.to_edtf(), "1978/..");
    }

    #[test]
    fn renders_decades_and_centuries() {
        let decade = ParsedDate {
            year: Some(1970),
            precision: DatePrecision::Decade,
            ..ParsedDate::default()
        };
        assert_eq!(decade.to_edtf(), "197X");
        let century = ParsedDate {
            year: Some(1900),
            precision: DatePrecision::Century,
            ..ParsedDate::default()
        };
        assert_eq!(century.to_edtf(), "19XX");
    }

    #[test]
    fn unparsed_keeps_raw_text() {
        let date = ParsedDate::unparsed("sometime in spring");
        assert!(!date.is_specified());
        assert!(!date.is_empty());
        assert_eq!(date.to_edtf(), "sometime in spring");
    }

    #[test]
    fn qualifier_markers_round_trip() {
        for marker in ['~', '?', '%'] {
            let qualifier = DateQualifier::from_marker(marker).unwrap();
            assert_eq!(qualifier.marker(), Some(marker));
        }
        assert_eq!(DateQualifier::from_marker('!'), None);
    }
}
