//! Personal-name splitting.

use metahub_api::record::ParsedName;

const PARTICLES: &[&str] = &[
    "van", "von", "der", "den", "de", "del", "della", "di", "da", "du", "la", "le", "ter", "ten",
    "bin", "al", "dos", "das",
];

const SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "v", "phd", "md"];

fn is_particle(word: &str) -> bool {
    PARTICLES.contains(&word.to_lowercase().as_str())
}

fn is_suffix(word: &str) -> bool {
    SUFFIXES.contains(&word.trim_end_matches(',').to_lowercase().as_str())
}

/// Split a personal name.
///
/// Accepts `"Last, First[, Suffix]"` and `"First [Middle...] [particle] Last [Suffix]"`.
/// A leading lowercase particle in the family part becomes `prefix`.
pub fn parse_name(input: &str) -> ParsedName {
    let input = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if input.is_empty() {
        return ParsedName::default();
    }
    if input.contains(',') {
        parse_inverted(&input)
    } else {
        parse_direct(&input)
    }
}

fn parse_inverted(input: &str) -> ParsedName {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let mut name = ParsedName::default();

    let (prefix, family) = split_particles(parts[0]);
    name.prefix = prefix;
    name.family = family;

    let mut rest = &parts[1..];
    // "Last, Jr., First" (BibTeX von-Last-Jr-First order)
    if rest.len() >= 2 && is_suffix(rest[0]) {
        name.suffix = rest[0].to_string();
        rest = &rest[1..];
    }
    if let Some(given) = rest.first() {
        let (given, middle) = split_given(given);
        name.given = given;
        name.middle = middle;
    }
    if let Some(suffix) = rest.get(1).filter(|s| !s.is_empty()) {
        name.suffix = suffix.to_string();
    }
    name
}

fn parse_direct(input: &str) -> ParsedName {
    let mut words: Vec<&str> = input.split(' ').collect();
    let mut name = ParsedName::default();

    if words.len() > 1 && words.last().is_some_and(|w| is_suffix(w)) {
        name.suffix = words.pop().unwrap_or_default().to_string();
    }
    if words.len() == 1 {
        name.family = words[0].to_string();
        return name;
    }

    // The family name starts at the first particle after the given name,
    // otherwise it is the last word.
    let family_start = words
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, w)| *i < words.len() - 1 && is_particle(w))
        .map(|(i, _)| i)
        .unwrap_or(words.len() - 1);

    let (prefix, family) = split_particles(&words[family_start..].join(" "));
    name.prefix = prefix;
    name.family = family;
    let (given, middle) = split_given(&words[..family_start].join(" "));
    name.given = given;
    name.middle = middle;
    name
}

/// Leading particles of a family part: `"van der Berg"` → (`"van der"`, `"Berg"`).
fn split_particles(family: &str) -> (String, String) {
    let words: Vec<&str> = family.split_whitespace().collect();
    let count = words
        .iter()
        .take(words.len().saturating_sub(1))
        .take_while(|w| is_particle(w))
        .count();
    (words[..count].join(" "), words[count..].join(" "))
}

fn split_given(given: &str) -> (String, String) {
    match given.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (given.to_string(), String::new()),
    }
}

/// Split a list of names joined by `" and "` (BibTeX) or `;`.
pub fn split_name_list(input: &str) -> Vec<&str> {
    input
        .split(';')
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Doe, Jane", "Jane", "", "", "Doe", "")]
    #[case("Doe, Jane Q.", "Jane", "Q.", "", "Doe", "")]
    #[case("King, Martin Luther, Jr.", "Martin", "Luther", "", "King", "Jr.")]
    #[case("King, Jr., Martin", "Martin", "", "", "King", "Jr.")]
    #[case("van der Berg, Anna", "Anna", "", "van der", "Berg", "")]
    #[case("Jane Doe", "Jane", "", "", "Doe", "")]
    #[case("Jane Quinn Doe", "Jane", "Quinn", "", "Doe", "")]
    #[case("Ludwig van Beethoven", "Ludwig", "", "van", "Beethoven", "")]
    #[case("Martin Luther King Jr.", "Martin", "Luther", "", "King", "Jr.")]
    #[case("Plato", "", "", "", "Plato", "")]
    #[case("  Jane    Doe ", "Jane", "", "", "Doe", "")]
    fn splits_names(
        #[case] input: &str,
        #[case] given: &str,
        #[case] middle: &str,
        #[case] prefix: &str,
        #[case] family: &str,
        #[case] suffix: &str,
    ) {
        let name = parse_name(input);
        assert_eq!(name.given, given, "given of {input:?}");
        assert_eq!(name.middle, middle, "middle of {input:?}");
        assert_eq!(name.prefix, prefix, "prefix of {input:?}");
        assert_eq!(name.family, family, "family of {input:?}");
        assert_eq!(name.suffix, suffix, "suffix of {input:?}");
    }

    #[test]
    fn empty_input_is_empty_name() {
        assert!(parse_name("   ").is_empty());
    }

    #[test]
    fn name_lists_split_on_and_and_semicolon() {
        assert_eq!(
            split_name_list("Doe, Jane and Smith, John; Roe, R."),
            vec!["Doe, Jane", "Smith, John", "Roe, R."]
        );
        assert!(split_name_list(" ; ").is_empty());
    }
}
