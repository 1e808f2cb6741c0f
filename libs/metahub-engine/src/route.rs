//! Target router: writes one coerced value into the canonical record.

use metahub_api::date::{DatePrecision, ParsedDate};
use metahub_api::record::{
    Contributor, Identifier, ParsedName, Publication, Record, Relation, ResourceType, Rights,
    Subject,
};
use metahub_api::reflect::{Describable, FieldAnnotation, FieldValue};
use metahub_api::value::Value;
use metahub_api::vocab::{
    ContributorRole, ContributorType, DateType, IdentifierType, RelationType, ResourceTypeValue,
    SubjectVocabulary,
};

use crate::{edtf, identifiers, relator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationField {
    Publisher,
    PlacePublished,
    ContainerTitle,
    Volume,
    Issue,
    Pages,
    Edition,
    Series,
}

impl PublicationField {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "publisher" => PublicationField::Publisher,
            "place_published" => PublicationField::PlacePublished,
            "container_title" => PublicationField::ContainerTitle,
            "volume" => PublicationField::Volume,
            "issue" => PublicationField::Issue,
            "pages" => PublicationField::Pages,
            "edition" => PublicationField::Edition,
            "series" => PublicationField::Series,
            _ => return None,
        })
    }

    fn get_mut(self, publication: &mut Publication) -> &mut String {
        match self {
            PublicationField::Publisher => &mut publication.publisher,
            PublicationField::PlacePublished => &mut publication.place_published,
            PublicationField::ContainerTitle => &mut publication.container_title,
            PublicationField::Volume => &mut publication.volume,
            PublicationField::Issue => &mut publication.issue,
            PublicationField::Pages => &mut publication.pages,
            PublicationField::Edition => &mut publication.edition,
            PublicationField::Series => &mut publication.series,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeField {
    DegreeName,
    DegreeLevel,
    Department,
    Institution,
}

impl DegreeField {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "degree_name" => DegreeField::DegreeName,
            "degree_level" => DegreeField::DegreeLevel,
            "department" => DegreeField::Department,
            "institution" => DegreeField::Institution,
            _ => return None,
        })
    }
}

/// A single-valued text slot. Last non-empty write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    Title,
    Abstract,
    Language,
    Publication(PublicationField),
    Degree(DegreeField),
}

impl TextSlot {
    fn get_mut(self, record: &mut Record) -> &mut String {
        match self {
            TextSlot::Title => &mut record.title,
            TextSlot::Abstract => &mut record.abstract_text,
            TextSlot::Language => &mut record.language,
            TextSlot::Publication(field) => field.get_mut(&mut record.publication),
            TextSlot::Degree(field) => {
                let degree = record.degree_info_mut();
                match field {
                    DegreeField::DegreeName => &mut degree.degree_name,
                    DegreeField::DegreeLevel => &mut degree.degree_level,
                    DegreeField::Department => &mut degree.department,
                    DegreeField::Institution => &mut degree.institution,
                }
            }
        }
    }
}

/// Parsed form of an annotation's `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Text(TextSlot),
    AltTitle,
    Notes,
    Rights,
    Genres,
    ResourceType,
    Contributors,
    Dates,
    Identifiers,
    Subjects,
    Relations,
    /// Empty or unknown target: Extra, keyed by source field name.
    Extra,
    /// Unknown nested root or field: Extra, keyed by the dotted target.
    ExtraPath,
}

impl Target {
    pub fn parse(target: &str) -> Target {
        let target = target.trim();
        if let Some((root, field)) = target.split_once('.') {
            let slot = match root {
                "degree_info" => DegreeField::from_name(field).map(TextSlot::Degree),
                "publication" => PublicationField::from_name(field).map(TextSlot::Publication),
                _ => None,
            };
            return slot.map(Target::Text).unwrap_or(Target::ExtraPath);
        }
        match target {
            "title" => Target::Text(TextSlot::Title),
            "abstract" | "description" => Target::Text(TextSlot::Abstract),
            "language" => Target::Text(TextSlot::Language),
            "alt_title" => Target::AltTitle,
            "notes" => Target::Notes,
            "rights" => Target::Rights,
            "genres" => Target::Genres,
            "resource_type" => Target::ResourceType,
            "contributors" => Target::Contributors,
            "dates" => Target::Dates,
            "identifiers" => Target::Identifiers,
            "subjects" => Target::Subjects,
            "relations" => Target::Relations,
            other => PublicationField::from_name(other)
                .map(|f| Target::Text(TextSlot::Publication(f)))
                .unwrap_or(Target::Extra),
        }
    }
}

/// What one routing call did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Routed {
    /// Values written into the record.
    pub written: usize,
    /// Fallbacks taken along the way.
    pub warnings: Vec<String>,
}

impl Routed {
    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Write `value` into `record` according to `annotation`.
///
/// `origin` is the reflected value before coercion; enum-valued fields need
/// it to reach their per-variant annotations.
pub fn route(
    record: &mut Record,
    field: &str,
    annotation: &FieldAnnotation,
    value: &Value<'_>,
    origin: Option<&FieldValue<'_>>,
) -> Routed {
    let mut routed = Routed::default();
    let target = Target::parse(annotation.target);
    tracing::debug!(field, slot = annotation.target, "routing field");

    match target {
        Target::Text(slot) => {
            for text in texts(value) {
                *slot.get_mut(record) = text;
                routed.written += 1;
            }
        }
        Target::AltTitle => {
            for text in texts(value) {
                record.alt_title.push(text);
                routed.written += 1;
            }
        }
        Target::Notes => {
            for text in texts(value) {
                record.notes.push(text);
                routed.written += 1;
            }
        }
        Target::Rights => {
            for text in texts(value) {
                record.rights.push(if looks_like_uri(&text) {
                    Rights {
                        uri: Some(text),
                        statement: None,
                    }
                } else {
                    Rights {
                        uri: None,
                        statement: Some(text),
                    }
                });
                routed.written += 1;
            }
        }
        Target::Genres | Target::Subjects => {
            let vocabulary =
                vocabulary(annotation.subject_vocabulary, SubjectVocabulary::from_name, &mut routed);
            for text in texts(value) {
                let subject = Subject {
                    value: text,
                    vocabulary,
                    ..Subject::default()
                };
                if target == Target::Genres {
                    record.genres.push(subject);
                } else {
                    record.subjects.push(subject);
                }
                routed.written += 1;
            }
        }
        Target::Relations => {
            let relation_type =
                vocabulary(annotation.relation_type, RelationType::from_name, &mut routed);
            for text in texts(value) {
                record.relations.push(Relation {
                    relation_type,
                    target_title: text,
                    ..Relation::default()
                });
                routed.written += 1;
            }
        }
        Target::Identifiers => {
            let identifier_type =
                vocabulary(annotation.identifier_type, IdentifierType::from_name, &mut routed);
            for text in texts(value) {
                record.identifiers.push(Identifier {
                    identifier_type,
                    value: text,
                });
                routed.written += 1;
            }
        }
        Target::Dates => route_dates(record, annotation, value, &mut routed),
        Target::Contributors => route_contributors(record, annotation, value, &mut routed),
        Target::ResourceType => route_resource_type(record, value, origin, &mut routed),
        Target::Extra => {
            record.set_extra(field, value.to_json(), annotation.description);
            routed.written += 1;
        }
        Target::ExtraPath => {
            routed.warn(format!("unknown nested target '{}'", annotation.target));
            record.set_extra(annotation.target, value.to_json(), annotation.description);
            routed.written += 1;
        }
    }
    routed
}

/// Non-empty text of every item.
fn texts(value: &Value<'_>) -> Vec<String> {
    value
        .items()
        .iter()
        .filter_map(Value::to_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn looks_like_uri(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a sub-target selector; unknown names fall back to the default.
fn vocabulary<T: Default>(
    name: Option<&str>,
    from_name: fn(&str) -> Option<T>,
    routed: &mut Routed,
) -> T {
    match name {
        None => T::default(),
        Some(name) => from_name(name).unwrap_or_else(|| {
            routed.warn(format!("unknown vocabulary term '{name}'"));
            T::default()
        }),
    }
}

fn route_dates(record: &mut Record, annotation: &FieldAnnotation, value: &Value<'_>, routed: &mut Routed) {
    let declared = annotation.date_type.map(|name| {
        DateType::from_name(name).unwrap_or_else(|| {
            routed.warn(format!("unknown date type '{name}'"));
            DateType::Other
        })
    });
    for item in value.items() {
        let date = match item {
            Value::Date(d) => d.clone(),
            Value::String(s) => edtf::parse(s, DateType::Other),
            Value::Int64(_) | Value::UInt64(_) => match item.as_i64().and_then(|y| i32::try_from(y).ok()) {
                Some(year) => ParsedDate {
                    year: Some(year),
                    precision: DatePrecision::Year,
                    raw: year.to_string(),
                    ..ParsedDate::default()
                },
                None => continue,
            },
            other => {
                routed.warn(format!("cannot route {} as a date", kind(other)));
                continue;
            }
        };
        if date.is_empty() {
            continue;
        }
        let date = match declared {
            Some(date_type) => date.with_type(date_type),
            None => date,
        };
        record.dates.push(date);
        routed.written += 1;
    }
}

fn route_contributors(
    record: &mut Record,
    annotation: &FieldAnnotation,
    value: &Value<'_>,
    routed: &mut Routed,
) {
    let (role, role_code) = match annotation.role {
        None => (ContributorRole::default(), None),
        Some(name) => match relator::lookup(name) {
            Some(r) => (r.role, Some(r.code.to_string())),
            None => {
                routed.warn(format!("unknown role '{name}'"));
                (ContributorRole::from_name(name).unwrap_or(ContributorRole::Other), None)
            }
        },
    };
    let contributor_type = vocabulary(annotation.contributor_type, ContributorType::from_name, routed);

    for item in value.items() {
        let mut contributor = match item {
            Value::Message(m) => contributor_from_message(*m),
            Value::Name(n) => Contributor {
                name: n.display(),
                parsed_name: Some(n.clone()),
                ..Contributor::default()
            },
            Value::String(s) => Contributor {
                name: s.trim().to_string(),
                ..Contributor::default()
            },
            other => {
                routed.warn(format!("cannot route {} as a contributor", kind(other)));
                continue;
            }
        };
        if contributor.is_empty() {
            continue;
        }
        contributor.role = role;
        contributor.role_code = role_code.clone();
        contributor.contributor_type = contributor_type;
        record.contributors.push(contributor);
        routed.written += 1;
    }
}

const NAME_FIELDS: &[&str] = &["name", "full_name", "display_name"];
const GIVEN_FIELDS: &[&str] = &["given", "given_name", "first_name"];
const FAMILY_FIELDS: &[&str] = &["family", "family_name", "last_name"];
const MIDDLE_FIELDS: &[&str] = &["middle", "middle_name"];
const PREFIX_FIELDS: &[&str] = &["prefix", "particle"];
const SUFFIX_FIELDS: &[&str] = &["suffix"];
const ORCID_FIELDS: &[&str] = &["orcid"];
const AFFILIATION_FIELDS: &[&str] = &["affiliation", "affiliations"];

/// First present text among well-known sub-field names.
fn sub_text(message: &dyn Describable, names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| match message.get(name)? {
            FieldValue::Str(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn contributor_from_message(message: &dyn Describable) -> Contributor {
    let parsed = ParsedName {
        given: sub_text(message, GIVEN_FIELDS),
        family: sub_text(message, FAMILY_FIELDS),
        middle: sub_text(message, MIDDLE_FIELDS),
        prefix: sub_text(message, PREFIX_FIELDS),
        suffix: sub_text(message, SUFFIX_FIELDS),
    };
    let mut name = sub_text(message, NAME_FIELDS);
    if name.is_empty() {
        name = parsed.display();
    }

    let affiliations = AFFILIATION_FIELDS
        .iter()
        .find_map(|f| message.get(f))
        .map(|v| match v {
            FieldValue::Str(s) => vec![s.trim().to_string()],
            FieldValue::List(items) => items
                .iter()
                .filter_map(|i| match i {
                    FieldValue::Str(s) => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
        .unwrap_or_default()
        .into_iter()
        .filter(|a: &String| !a.is_empty())
        .collect();

    let orcid = sub_text(message, ORCID_FIELDS);
    let identifiers = if orcid.is_empty() {
        Vec::new()
    } else {
        vec![Identifier {
            identifier_type: IdentifierType::Orcid,
            value: identifiers::normalize_orcid(&orcid),
        }]
    };

    Contributor {
        name,
        parsed_name: (!parsed.is_empty()).then_some(parsed),
        affiliations,
        identifiers,
        ..Contributor::default()
    }
}

fn route_resource_type(
    record: &mut Record,
    value: &Value<'_>,
    origin: Option<&FieldValue<'_>>,
    routed: &mut Routed,
) {
    let resource_type = match (value, origin) {
        (Value::Int64(_), Some(FieldValue::Enum(e))) => {
            let variant = e.name().unwrap_or_default();
            let canonical = e.target();
            let resolved = canonical
                .and_then(ResourceTypeValue::from_name)
                .or_else(|| ResourceTypeValue::from_name(variant));
            if resolved.is_none() {
                routed.warn(format!(
                    "{}::{variant} has no canonical resource type",
                    e.type_name
                ));
            }
            ResourceType {
                resource_type: resolved.unwrap_or_default(),
                original: canonical.unwrap_or(variant).to_string(),
                vocabulary: Some(e.type_name.to_string()),
            }
        }
        (other, _) => {
            let Some(text) = other.to_text().map(|t| t.trim().to_string()) else {
                routed.warn(format!("cannot route {} as a resource type", kind(other)));
                return;
            };
            if text.is_empty() {
                return;
            }
            let resolved = ResourceTypeValue::from_name(&text);
            if resolved.is_none() {
                routed.warn(format!("unknown resource type '{text}'"));
            }
            ResourceType {
                resource_type: resolved.unwrap_or_default(),
                original: text,
                vocabulary: None,
            }
        }
    };
    record.resource_type = Some(resource_type);
    routed.written += 1;
}

fn kind(value: &Value<'_>) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Int64(_) | Value::UInt64(_) | Value::Float64(_) => "a number",
        Value::String(_) => "text",
        Value::Bytes(_) => "bytes",
        Value::Message(_) => "a message",
        Value::Array(_) => "a sequence",
        Value::Map(_) => "a map",
        Value::Date(_) => "a date",
        Value::Name(_) => "a name",
    }
}
