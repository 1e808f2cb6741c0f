//! BibTeX field parsers: LaTeX markup removal, month names, author lists.

use metahub_api::error::HubError;
use metahub_api::options::Options;
use metahub_api::value::Value;
use metahub_engine::names;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FORMATTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:textit|textbf|textsc|texttt|textrm|emph|mathrm|url)\s*\{([^{}]*)\}")
        .expect("static regex")
});

static ACCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\\(['`^"~=.]|H)\s*(?:\{([A-Za-z])\}|([A-Za-z]))"#).expect("static regex")
});

static CEDILLA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\c\s*(?:\{([A-Za-z])\}|\s([A-Za-z]))").expect("static regex"));

static LIGATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(ss|ae|AE|aa|AA|oe|OE|o|O|l|L)(?:\{\}|\s+|\b)").expect("static regex"));

static COMMAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[A-Za-z]+\s*").expect("static regex"));

static ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([&%$#_{}])").expect("static regex"));

/// Precomposed letters per accent command.
const ACCENTS: &[(char, &str, &str)] = &[
    ('\'', "aeiouyAEIOUYcnszCNSZ", "áéíóúýÁÉÍÓÚÝćńśźĆŃŚŹ"),
    ('`', "aeiouAEIOU", "àèìòùÀÈÌÒÙ"),
    ('^', "aeiouAEIOU", "âêîôûÂÊÎÔÛ"),
    ('"', "aeiouyAEIOUY", "äëïöüÿÄËÏÖÜŸ"),
    ('~', "anoANO", "ãñõÃÑÕ"),
    ('=', "aeiouAEIOU", "āēīōūĀĒĪŌŪ"),
    ('.', "zZeE", "żŻėĖ"),
    ('H', "oOuU", "őŐűŰ"),
];

/// Combining mark used when no precomposed letter is listed.
fn combining(mark: char) -> char {
    match mark {
        '\'' => '\u{301}',
        '`' => '\u{300}',
        '^' => '\u{302}',
        '"' => '\u{308}',
        '~' => '\u{303}',
        '=' => '\u{304}',
        'H' => '\u{30B}',
        _ => '\u{307}',
    }
}

fn accented(mark: char, letter: char) -> String {
    ACCENTS
        .iter()
        .find(|(m, _, _)| *m == mark)
        .and_then(|(_, plain, composed)| {
            let index = plain.chars().position(|c| c == letter)?;
            composed.chars().nth(index)
        })
        .map(String::from)
        .unwrap_or_else(|| format!("{letter}{}", combining(mark)))
}

fn ligature(name: &str) -> &'static str {
    match name {
        "ss" => "ß",
        "ae" => "æ",
        "AE" => "Æ",
        "aa" => "å",
        "AA" => "Å",
        "oe" => "œ",
        "OE" => "Œ",
        "o" => "ø",
        "O" => "Ø",
        "l" => "ł",
        _ => "Ł",
    }
}

/// Plain text from a LaTeX-marked BibTeX value.
pub fn latex_to_text(input: &str) -> String {
    let mut text = input.to_string();
    // Formatting commands may nest: `\emph{\textbf{x}}`.
    while FORMATTING.is_match(&text) {
        text = FORMATTING.replace_all(&text, "$1").into_owned();
    }
    let text = ACCENT.replace_all(&text, |caps: &Captures<'_>| {
        let mark = caps[1].chars().next().unwrap_or('\'');
        let letter = caps
            .get(2)
            .or_else(|| caps.get(3))
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or_default();
        accented(mark, letter)
    });
    let text = CEDILLA.replace_all(&text, |caps: &Captures<'_>| {
        match caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) {
            Some("c") => "ç".to_string(),
            Some("C") => "Ç".to_string(),
            Some(other) => format!("{other}\u{327}"),
            None => String::new(),
        }
    });
    let text = LIGATURE.replace_all(&text, |caps: &Captures<'_>| ligature(&caps[1]).to_string());
    let text = COMMAND.replace_all(&text, "");
    let text = ESCAPED.replace_all(&text, "\u{0}$1");

    let mut out = String::with_capacity(text.len());
    let mut escaped = false;
    for c in text.replace("---", "\u{2014}").replace("--", "\u{2013}").chars() {
        match c {
            '\u{0}' => escaped = true,
            '{' | '}' if !escaped => {}
            '~' if !escaped => out.push(' '),
            c => {
                out.push(c);
                escaped = false;
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `latex` parser: LaTeX markup → plain text.
pub fn latex(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::owned(latex_to_text(input)))
}

/// `bibtex_names` parser: `" and "`-separated names with LaTeX markup.
pub fn bibtex_names(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    Ok(Value::Array(
        names::split_name_list(input)
            .into_iter()
            .map(|n| Value::Name(names::parse_name(&latex_to_text(n))))
            .collect(),
    ))
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number from a BibTeX month: `3`, `03`, `mar`, `March`, `{March}`.
pub fn month_number(input: &str) -> Option<u32> {
    let key = input
        .trim()
        .trim_matches(|c| c == '{' || c == '}' || c == '"')
        .trim()
        .trim_end_matches('.')
        .to_lowercase();
    if let Ok(n) = key.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    if key.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&key))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// `bibtex_month` parser: month name or number → month number.
pub fn bibtex_month(input: &str, _: &Options) -> Result<Value<'static>, HubError> {
    month_number(input)
        .map(|m| Value::Int64(i64::from(m)))
        .ok_or_else(|| HubError::parse(format!("unrecognized month '{}'", input.trim())))
}
