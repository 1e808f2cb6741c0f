use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date::ParsedDate;
use crate::vocab::{
    ContributorRole, ContributorType, DateType, IdentifierType, RelationType, ResourceTypeValue,
    SubjectVocabulary,
};

/// The canonical ("hub") record every spoke converts to and from.
///
/// Collections are always present (possibly empty). `extra` holds values
/// that have no canonical slot, keyed by source field name or dotted target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub title: String,
    pub alt_title: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub contributors: Vec<Contributor>,
    pub dates: Vec<ParsedDate>,
    pub identifiers: Vec<Identifier>,
    pub subjects: Vec<Subject>,
    pub genres: Vec<Subject>,
    pub relations: Vec<Relation>,
    pub rights: Vec<Rights>,
    pub resource_type: Option<ResourceType>,
    pub degree_info: Option<DegreeInfo>,
    pub publication: Publication,
    pub language: String,
    pub notes: Vec<String>,
    pub extra: BTreeMap<String, ExtraEntry>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// First date of the given type.
    pub fn date(&self, date_type: DateType) -> Option<&ParsedDate> {
        self.dates.iter().find(|d| d.date_type == date_type)
    }

    pub fn date_mut(&mut self, date_type: DateType) -> Option<&mut ParsedDate> {
        self.dates.iter_mut().find(|d| d.date_type == date_type)
    }

    /// First identifier value of the given type.
    pub fn identifier(&self, identifier_type: IdentifierType) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.identifier_type == identifier_type)
            .map(|i| i.value.as_str())
    }

    pub fn contributors_with_role(
        &self,
        role: ContributorRole,
    ) -> impl Iterator<Item = &Contributor> + '_ {
        self.contributors.iter().filter(move |c| c.role == role)
    }

    /// Lazily allocate the degree block.
    pub fn degree_info_mut(&mut self) -> &mut DegreeInfo {
        self.degree_info.get_or_insert_with(DegreeInfo::default)
    }

    pub fn set_extra(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
        description: Option<&str>,
    ) {
        self.extra.insert(
            key.into(),
            ExtraEntry {
                value,
                description: description.map(str::to_string),
            },
        );
    }

    pub fn extra_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key).map(|e| &e.value)
    }
}

/// A value parked in [`Record::extra`], with the annotation description when one exists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtraEntry {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contributor {
    /// Full display name.
    pub name: String,
    pub parsed_name: Option<ParsedName>,
    pub role: ContributorRole,
    /// MARC relator code (`aut`, `ths`, ...).
    pub role_code: Option<String>,
    pub contributor_type: ContributorType,
    pub affiliations: Vec<String>,
    pub identifiers: Vec<Identifier>,
}

impl Contributor {
    /// Neither a display name nor any parsed-name component.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.parsed_name.as_ref().is_none_or(ParsedName::is_empty)
    }

    /// Display name, falling back to the parsed components.
    pub fn display_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        self.parsed_name
            .as_ref()
            .map(ParsedName::display)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedName {
    pub given: String,
    pub family: String,
    pub middle: String,
    /// Particle such as `van der` or `de`.
    pub prefix: String,
    pub suffix: String,
}

impl ParsedName {
    pub fn is_empty(&self) -> bool {
        [
            &self.given,
            &self.family,
            &self.middle,
            &self.prefix,
            &self.suffix,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }

    /// "Given Middle prefix Family Suffix".
    pub fn display(&self) -> String {
        join_words([
            &self.given,
            &self.middle,
            &self.prefix,
            &self.family,
            &self.suffix,
        ])
    }

    /// "prefix Family, Given Middle, Suffix".
    pub fn inverted(&self) -> String {
        let family = join_words([&self.prefix, &self.family]);
        let given = join_words([&self.given, &self.middle]);
        let mut out = family;
        if !given.is_empty() {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(&given);
        }
        if !self.suffix.is_empty() {
            out.push_str(", ");
            out.push_str(&self.suffix);
        }
        out
    }
}

fn join_words<'a>(parts: impl IntoIterator<Item = &'a String>) -> String {
    parts
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub identifier_type: IdentifierType,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    pub value: String,
    pub vocabulary: SubjectVocabulary,
    pub uri: Option<String>,
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub target_title: String,
    pub target_uri: Option<String>,
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rights {
    pub uri: Option<String>,
    pub statement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceType {
    #[serde(rename = "type")]
    pub resource_type: ResourceTypeValue,
    /// The source value before normalization.
    pub original: String,
    pub vocabulary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DegreeInfo {
    pub degree_name: String,
    pub degree_level: String,
    pub department: String,
    pub institution: String,
}

/// Publication details (container, imprint, enumeration).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    pub publisher: String,
    pub place_published: String,
    pub container_title: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub edition: String,
    pub series: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(given: &str, middle: &str, prefix: &str, family: &str, suffix: &str) -> ParsedName {
        ParsedName {
            given: given.into(),
            family: family.into(),
            middle: middle.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    #[test]
    fn parsed_name_renders_both_orders() {
        let n = name("Ludwig", "", "van", "Beethoven", "");
        assert_eq!(n.display(), "Ludwig van Beethoven");
        assert_eq!(n.inverted(), "van Beethoven, Ludwig");

        let n = name("Martin", "Luther", "", "King", "Jr.");
        assert_eq!(n.display(), "Martin Luther King Jr.");
        assert_eq!(n.inverted(), "King, Martin Luther, Jr.");
    }

    #[test]
    fn contributor_emptiness_considers_parsed_name() {
        let mut c = Contributor::default();
        assert!(c.is_empty());
        c.parsed_name = Some(ParsedName::default());
        assert!(c.is_empty());
        c.parsed_name = Some(name("", "", "", "Curie", ""));
        assert!(!c.is_empty());
        assert_eq!(c.display_name(), "Curie");
    }

    #[test]
    fn new_record_has_empty_collections_and_serializes_them() {
        let record = Record::new();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["contributors"], serde_json::json!([]));
        assert_eq!(json["extra"], serde_json::json!({}));
        assert!(json["degree_info"].is_null());
    }

    #[test]
    fn degree_info_is_allocated_on_first_use() {
        let mut record = Record::new();
        assert!(record.degree_info.is_none());
        record.degree_info_mut().institution = "MIT".into();
        assert_eq!(record.degree_info.unwrap().institution, "MIT");
    }
}
