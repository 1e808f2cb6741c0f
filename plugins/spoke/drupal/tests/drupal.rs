use std::sync::Arc;

use metahub_api::date::DatePrecision;
use metahub_api::vocab::{
    ContributorRole, DateType, IdentifierType, RelationType, ResourceTypeValue, SubjectVocabulary,
};
use metahub_engine::{ConversionIssue, Converter, HookRegistry, Registries};
use spoke_drupal::{DrupalPerson, DrupalThesis, embargo::INDEFINITE_NOTE};

fn converter() -> Converter {
    let registries = Registries::with_defaults();
    let hooks = HookRegistry::new();
    spoke_drupal::register(&registries, &hooks);
    Converter::new(Arc::new(registries), Arc::new(hooks))
}

fn etd() -> DrupalThesis {
    serde_json::from_str(include_str!("fixtures/etd.json")).unwrap()
}

#[test]
fn converts_thesis_node() {
    let result = converter().to_hub(&etd()).unwrap();
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    let record = result.record;

    assert_eq!(record.title, "Sediment Transport in Braided Rivers");
    assert_eq!(record.alt_title, vec!["Braided river sediment dynamics"]);
    assert_eq!(record.abstract_text, "We measure bedload flux across three seasons.");
    assert_eq!(record.language, "en");

    let degree = record.degree_info.as_ref().unwrap();
    assert_eq!(degree.degree_name, "Doctor of Philosophy");
    assert_eq!(degree.institution, "State University");

    let resource_type = record.resource_type.as_ref().unwrap();
    assert_eq!(resource_type.resource_type, ResourceTypeValue::Dissertation);
    assert_eq!(resource_type.vocabulary.as_deref(), Some("drupal.ResourceKind"));

    assert_eq!(record.identifier(IdentifierType::Doi), Some("10.5555/etd.4812"));
    assert_eq!(record.identifier(IdentifierType::Handle), Some("2142/110123"));
    assert_eq!(
        record.identifier(IdentifierType::Url),
        Some("https://etd.example.edu/node/4812")
    );

    assert_eq!(record.subjects.len(), 4);
    assert_eq!(record.subjects[0].vocabulary, SubjectVocabulary::Lcsh);
    assert_eq!(record.subjects[3].vocabulary, SubjectVocabulary::Keywords);
    assert_eq!(record.genres[0].vocabulary, SubjectVocabulary::Local);
    assert_eq!(record.relations[0].relation_type, RelationType::IsPartOf);
    assert_eq!(record.relations[0].target_title, "Geology Dissertations");
    assert!(record.rights[0].uri.is_some());
    assert_eq!(record.rights[1].statement.as_deref(), Some("Copyright the author"));

    // Unmapped node metadata is dropped; the annotated embargo code is kept.
    assert!(record.extra_value("nid").is_none());
    assert_eq!(record.extra_value("field_embargo_code"), Some(&serde_json::json!(2)));
}

#[test]
fn nested_people_become_contributors() {
    let record = converter().to_hub(&etd()).unwrap().record;

    let author = &record.contributors[0];
    assert_eq!(author.name, "Ana García");
    assert_eq!(author.role, ContributorRole::Author);
    assert_eq!(author.identifiers[0].value, "0000-0002-1825-0097");
    assert_eq!(author.affiliations, vec!["Department of Geology"]);

    // The empty advisor paragraph is dropped.
    let advisors: Vec<_> = record.contributors_with_role(ContributorRole::Advisor).collect();
    assert_eq!(advisors.len(), 1);
    assert_eq!(advisors[0].name, "Prof. Lena Okafor");
    assert_eq!(advisors[0].role_code.as_deref(), Some("ths"));

    let committee: Vec<_> = record
        .contributors_with_role(ContributorRole::CommitteeMember)
        .collect();
    assert_eq!(committee[0].name, "Tomas Berg Jr.");
    assert_eq!(committee[0].parsed_name.as_ref().unwrap().suffix, "Jr.");
}

#[test]
fn embargo_hook_sees_routed_accepted_date() {
    let record = converter().to_hub(&etd()).unwrap().record;
    let available = record.date(DateType::Available).unwrap();
    assert_eq!(available.raw, "2022-05-15");
    assert_eq!(available.precision, DatePrecision::Day);
    assert_eq!(record.date(DateType::Issued).unwrap().year, Some(2021));
}

#[test]
fn indefinite_embargo_adds_a_note() {
    let thesis = DrupalThesis {
        field_embargo_code: Some(4),
        ..etd()
    };
    let record = converter().to_hub(&thesis).unwrap().record;
    assert!(record.date(DateType::Available).is_none());
    assert_eq!(record.notes, vec![INDEFINITE_NOTE]);
}

#[test]
fn embargo_without_accepted_date_is_a_hook_error() {
    let thesis = DrupalThesis {
        field_date_accepted: String::new(),
        field_embargo_code: Some(1),
        ..etd()
    };
    let result = converter().to_hub(&thesis).unwrap();
    let errors: Vec<_> = result.errors().collect();
    assert!(matches!(
        errors.as_slice(),
        [ConversionIssue::Hook { schema, .. }] if schema == "drupal.Thesis"
    ));
    // Everything routed before the hook is still there.
    assert_eq!(result.record.title, "Sediment Transport in Braided Rivers");
}

#[test]
fn out_of_range_embargo_code_warns_and_fails_the_hook() {
    let thesis = DrupalThesis {
        field_embargo_code: Some(7),
        ..etd()
    };
    let result = converter().to_hub(&thesis).unwrap();
    assert!(result
        .warnings()
        .any(|i| matches!(i, ConversionIssue::Validation(e) if e.rule == "range")));
    assert_eq!(result.errors().count(), 1);
}

#[test]
fn missing_author_is_reported() {
    let thesis = DrupalThesis {
        field_author: Vec::<DrupalPerson>::new(),
        ..etd()
    };
    let result = converter().to_hub(&thesis).unwrap();
    assert!(result.errors().any(|i| matches!(
        i,
        ConversionIssue::RequiredMissing { field } if field == "field_author"
    )));
}
