//! MARC relator codes.

use metahub_api::vocab::{ContributorRole, normalize_key};

pub struct Relator {
    pub code: &'static str,
    pub label: &'static str,
    pub role: ContributorRole,
}

pub static RELATORS: &[Relator] = &[
    Relator { code: "aut", label: "Author", role: ContributorRole::Author },
    Relator { code: "cre", label: "Creator", role: ContributorRole::Author },
    Relator { code: "edt", label: "Editor", role: ContributorRole::Editor },
    Relator { code: "edc", label: "Editor of compilation", role: ContributorRole::Editor },
    Relator { code: "trl", label: "Translator", role: ContributorRole::Translator },
    Relator { code: "ths", label: "Thesis advisor", role: ContributorRole::Advisor },
    Relator { code: "dgs", label: "Degree supervisor", role: ContributorRole::Advisor },
    Relator { code: "dgc", label: "Degree committee member", role: ContributorRole::CommitteeMember },
    Relator { code: "ctb", label: "Contributor", role: ContributorRole::Contributor },
    Relator { code: "ill", label: "Illustrator", role: ContributorRole::Illustrator },
    Relator { code: "com", label: "Compiler", role: ContributorRole::Compiler },
    Relator { code: "pbl", label: "Publisher", role: ContributorRole::Publisher },
    Relator { code: "dgg", label: "Degree granting institution", role: ContributorRole::DegreeGrantor },
    Relator { code: "sad", label: "Scientific advisor", role: ContributorRole::Advisor },
    Relator { code: "oth", label: "Other", role: ContributorRole::Other },
];

/// Look up by code (`ths`), label (`Thesis advisor`) or role name (`advisor`).
///
/// Role names resolve to the first relator carrying that role.
pub fn lookup(input: &str) -> Option<&'static Relator> {
    let key = normalize_key(input);
    if key.is_empty() {
        return None;
    }
    RELATORS
        .iter()
        .find(|r| r.code == key)
        .or_else(|| RELATORS.iter().find(|r| normalize_key(r.label) == key))
        .or_else(|| {
            let role = ContributorRole::from_name(&key)?;
            RELATORS.iter().find(|r| r.role == role)
        })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("aut", "aut", ContributorRole::Author)]
    #[case("THS", "ths", ContributorRole::Advisor)]
    #[case("Thesis advisor", "ths", ContributorRole::Advisor)]
    #[case("thesis-advisor", "ths", ContributorRole::Advisor)]
    #[case("editor", "edt", ContributorRole::Editor)]
    #[case("committee_member", "dgc", ContributorRole::CommitteeMember)]
    fn resolves_codes_labels_and_roles(
        #[case] input: &str,
        #[case] code: &str,
        #[case] role: ContributorRole,
    ) {
        let relator = lookup(input).unwrap();
        assert_eq!(relator.code, code);
        assert_eq!(relator.role, role);
    }

    #[test]
    fn unknown_input_misses() {
        assert!(lookup("astronaut").is_none());
        assert!(lookup("").is_none());
    }
}
