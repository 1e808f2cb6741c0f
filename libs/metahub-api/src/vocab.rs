//! Controlled vocabularies of the canonical record.
//!
//! Annotations name sub-targets with plain strings (`date_type = "issued"`);
//! each vocabulary resolves those names, including common aliases used by
//! external schemas, with [`from_name`](DateType::from_name).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowercase, trim, and fold spaces/hyphens to underscores.
pub fn normalize_key(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Resolve a canonical name or alias. Case, spaces and hyphens are ignored.
            pub fn from_name(name: &str) -> Option<Self> {
                match normalize_key(name).as_str() {
                    $($label $(| $alias)* => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Role a date plays for the resource.
    DateType {
        Issued => "issued" | "published" | "publication" | "date",
        Created => "created",
        Available => "available",
        Accepted => "accepted" | "approved" | "defended",
        Submitted => "submitted",
        Modified => "modified" | "updated",
        Copyright => "copyright",
        Embargo => "embargo" | "embargo_end",
        Collected => "collected",
        Valid => "valid",
        Other => "other",
    }
}

impl Default for DateType {
    fn default() -> Self {
        DateType::Other
    }
}

vocabulary! {
    IdentifierType {
        Doi => "doi",
        Isbn => "isbn",
        Issn => "issn",
        Orcid => "orcid",
        Url => "url",
        Uri => "uri",
        Handle => "handle" | "hdl",
        Arxiv => "arxiv",
        Pmid => "pmid",
        Pmcid => "pmcid",
        Lccn => "lccn",
        Oclc => "oclc",
        Local => "local",
        Other => "other",
    }
}

impl Default for IdentifierType {
    fn default() -> Self {
        IdentifierType::Other
    }
}

vocabulary! {
    /// Normalized contributor role. The MARC relator code lives next to it
    /// on the contributor.
    ContributorRole {
        Author => "author" | "creator",
        Editor => "editor",
        Translator => "translator",
        Advisor => "advisor" | "thesis_advisor" | "supervisor",
        CommitteeMember => "committee_member",
        Contributor => "contributor",
        Illustrator => "illustrator",
        Compiler => "compiler",
        Publisher => "publisher",
        DegreeGrantor => "degree_grantor",
        Other => "other",
    }
}

impl Default for ContributorRole {
    fn default() -> Self {
        ContributorRole::Author
    }
}

vocabulary! {
    ContributorType {
        Person => "person" | "personal",
        Organization => "organization" | "organisation" | "corporate" | "org",
    }
}

impl Default for ContributorType {
    fn default() -> Self {
        ContributorType::Person
    }
}

vocabulary! {
    SubjectVocabulary {
        Keywords => "keywords" | "keyword" | "free_text",
        Lcsh => "lcsh",
        Mesh => "mesh",
        Fast => "fast",
        Ddc => "ddc",
        Lcc => "lcc",
        Local => "local",
        Other => "other",
    }
}

impl Default for SubjectVocabulary {
    fn default() -> Self {
        SubjectVocabulary::Keywords
    }
}

vocabulary! {
    /// Relation types, following the DataCite `relationType` list.
    RelationType {
        IsPartOf => "is_part_of" | "ispartof",
        HasPart => "has_part" | "haspart",
        IsVersionOf => "is_version_of" | "isversionof",
        HasVersion => "has_version" | "hasversion",
        References => "references",
        IsReferencedBy => "is_referenced_by" | "isreferencedby",
        IsSupplementTo => "is_supplement_to" | "issupplementto",
        IsSupplementedBy => "is_supplemented_by" | "issupplementedby",
        IsDerivedFrom => "is_derived_from" | "isderivedfrom",
        IsSourceOf => "is_source_of" | "issourceof",
        Other => "other",
    }
}

impl Default for RelationType {
    fn default() -> Self {
        RelationType::Other
    }
}

vocabulary! {
    ResourceTypeValue {
        Article => "article" | "journal_article",
        Book => "book" | "booklet",
        BookChapter => "book_chapter" | "chapter" | "inbook" | "incollection",
        ConferencePaper => "conference_paper" | "inproceedings" | "paper_conference",
        Proceedings => "proceedings",
        Thesis => "thesis" | "mastersthesis" | "masters_thesis",
        Dissertation => "dissertation" | "phdthesis" | "doctoral_thesis",
        Report => "report" | "techreport",
        Preprint => "preprint",
        Dataset => "dataset",
        Software => "software",
        Image => "image",
        Video => "video" | "moving_image",
        Audio => "audio" | "sound",
        Manuscript => "manuscript" | "unpublished",
        Webpage => "webpage" | "online",
        Other => "other" | "misc",
    }
}

impl Default for ResourceTypeValue {
    fn default() -> Self {
        ResourceTypeValue::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases_regardless_of_case_and_separators() {
        assert_eq!(DateType::from_name("Published"), Some(DateType::Issued));
        assert_eq!(
            RelationType::from_name("IsPartOf"),
            Some(RelationType::IsPartOf)
        );
        assert_eq!(
            RelationType::from_name("is-part-of"),
            Some(RelationType::IsPartOf)
        );
        assert_eq!(
            ResourceTypeValue::from_name("phdthesis"),
            Some(ResourceTypeValue::Dissertation)
        );
        assert_eq!(IdentifierType::from_name("  DOI "), Some(IdentifierType::Doi));
        assert_eq!(SubjectVocabulary::from_name("no-such-vocab"), None);
    }

    #[test]
    fn unknown_terms_fall_back_to_defaults() {
        assert_eq!(IdentifierType::default(), IdentifierType::Other);
        assert_eq!(DateType::default(), DateType::Other);
        assert_eq!(ContributorType::default(), ContributorType::Person);
    }

    #[test]
    fn serde_uses_canonical_labels() {
        let json = serde_json::to_string(&ContributorRole::CommitteeMember).unwrap();
        assert_eq!(json, "\"committee_member\"");
        let back: ContributorRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContributorRole::CommitteeMember);
    }

    #[test]
    fn every_label_round_trips_through_from_name() {
        for role in ContributorRole::ALL {
            assert_eq!(ContributorRole::from_name(role.as_str()), Some(*role));
        }
        for ty in ResourceTypeValue::ALL {
            assert_eq!(ResourceTypeValue::from_name(ty.as_str()), Some(*ty));
        }
    }
}
