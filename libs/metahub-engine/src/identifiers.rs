//! Identifier normalization and checksums.
//!
//! Normalizers strip resolver prefixes and punctuation but never verify a
//! checksum; the `is_valid_*` functions do only that.

use once_cell::sync::Lazy;
use regex::Regex;

static DOI_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:doi:\s*|https?://(?:dx\.)?doi\.org/)").expect("static regex")
});

static DOI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^10\.\d{4,9}/\S+$").expect("static regex"));

static ISBN_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^isbn(?:-1[03])?:?\s*").expect("static regex"));

static ISSN_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^issn:?\s*").expect("static regex"));

static ORCID_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:orcid:\s*|https?://(?:www\.)?orcid\.org/)").expect("static regex")
});

/// `doi:10.1/x`, `https://doi.org/10.1/x` → `10.1/x`.
pub fn normalize_doi(input: &str) -> String {
    DOI_PREFIX.replace(input.trim(), "").trim().to_string()
}

pub fn is_doi(input: &str) -> bool {
    DOI.is_match(input)
}

/// Digits and a trailing `X`, uppercased; `ISBN` labels and hyphens dropped.
pub fn normalize_isbn(input: &str) -> String {
    compact(&ISBN_LABEL.replace(input.trim(), ""))
}

/// Bare 16-character ORCID → `NNNN-NNNN-NNNN-NNNC`.
pub fn normalize_orcid(input: &str) -> String {
    let bare = ORCID_PREFIX.replace(input.trim(), "");
    let compact = compact(&bare);
    if compact.len() == 16 {
        format!(
            "{}-{}-{}-{}",
            &compact[0..4],
            &compact[4..8],
            &compact[8..12],
            &compact[12..16]
        )
    } else {
        bare.trim().to_string()
    }
}

/// Bare 8-character ISSN → `NNNN-NNNC`.
pub fn normalize_issn(input: &str) -> String {
    let trimmed = input.trim();
    let compact = compact(&ISSN_LABEL.replace(trimmed, ""));
    if compact.len() == 8 {
        format!("{}-{}", &compact[0..4], &compact[4..8])
    } else {
        trimmed.to_string()
    }
}

/// Keep digits and `X`, uppercased.
fn compact(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn digit(c: u8) -> Option<u32> {
    (c as char).to_digit(10)
}

/// ISBN-10 (weighted mod 11, `X` = 10 in the check position) or ISBN-13
/// (weights 1/3, mod 10).
pub fn is_valid_isbn(input: &str) -> bool {
    let isbn = compact(input);
    match isbn.len() {
        10 => is_valid_isbn10(isbn.as_bytes()),
        13 => is_valid_isbn13(isbn.as_bytes()),
        _ => false,
    }
}

fn is_valid_isbn10(bytes: &[u8]) -> bool {
    let mut sum = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let value = match (i, b) {
            (9, b'X') => 10,
            _ => match digit(b) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn is_valid_isbn13(bytes: &[u8]) -> bool {
    let mut sum = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let Some(d) = digit(b) else {
            return false;
        };
        sum += if i % 2 == 0 { d } else { d * 3 };
    }
    sum % 10 == 0
}

/// ISSN: weights 8..2 over the first seven digits, mod 11, `X` = 10.
pub fn is_valid_issn(input: &str) -> bool {
    let issn = compact(input);
    let bytes = issn.as_bytes();
    if bytes.len() != 8 {
        return false;
    }
    let mut sum = 0;
    for (i, &b) in bytes[..7].iter().enumerate() {
        let Some(d) = digit(b) else {
            return false;
        };
        sum += d * (8 - i as u32);
    }
    let check = (11 - sum % 11) % 11;
    match bytes[7] {
        b'X' => check == 10,
        b => digit(b) == Some(check),
    }
}

/// ORCID: ISO 7064 MOD 11-2 over the first fifteen digits.
pub fn is_valid_orcid(input: &str) -> bool {
    let orcid = compact(&ORCID_PREFIX.replace(input.trim(), ""));
    let bytes = orcid.as_bytes();
    if bytes.len() != 16 {
        return false;
    }
    let mut total = 0;
    for &b in &bytes[..15] {
        let Some(d) = digit(b) else {
            return false;
        };
        total = (total + d) * 2;
    }
    let check = (12 - total % 11) % 11;
    match bytes[15] {
        b'X' => check == 10,
        b => digit(b) == Some(check),
    }
}
