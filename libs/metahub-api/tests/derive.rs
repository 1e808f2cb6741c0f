use metahub_api::reflect::{Describable, FieldValue, HubEnum};
use metahub_api::{Describable, HubEnum};

#[derive(Debug, Clone, Copy, PartialEq, HubEnum)]
#[hub(name = "test.Kind")]
enum Kind {
    #[hub(target = "article")]
    Paper,
    Misc = 5,
    #[hub(target = "thesis")]
    Thesis,
}

#[derive(Default, Describable)]
struct Author {
    #[hub(target = "name")]
    name: String,
    orcid: Option<String>,
}

#[derive(Describable)]
#[hub(target = "Record", preserve_unmapped, name = "test.Paper")]
struct Paper {
    #[hub(target = "title", required, priority = -1, max_length = 200)]
    title: String,
    #[hub(target = "dates", date_type = "issued", parser = "edtf", min_value = -5, max_value = 2.5)]
    year: String,
    #[hub(target = "resource_type")]
    kind: Kind,
    #[hub(target = "contributors", role = "author")]
    authors: Vec<Author>,
    note: String,
    #[hub(skip)]
    #[allow(dead_code)]
    cache: Vec<u8>,
}

fn paper() -> Paper {
    Paper {
        title: "On Hubs".into(),
        year: String::new(),
        kind: Kind::Thesis,
        authors: vec![Author {
            name: "Doe, Jane".into(),
            orcid: None,
        }],
        note: "kept".into(),
        cache: vec![1, 2, 3],
    }
}

#[test]
fn descriptor_lists_fields_in_order_without_skipped() {
    let schema = Paper::schema();
    assert_eq!(schema.full_name, "test.Paper");
    let names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["title", "year", "kind", "authors", "note"]);
    assert!(schema.preserve_unmapped());
    assert_eq!(schema.annotation.map(|a| a.target), Some("Record"));
    assert!(schema.fields[4].annotation.is_none());
}

#[test]
fn annotation_values_are_carried() {
    let title = Paper::schema().fields[0].annotation.unwrap();
    assert!(title.required);
    assert_eq!(title.priority, Some(-1));
    assert_eq!(title.max_length, Some(200));

    let year = Paper::schema().fields[1].annotation.unwrap();
    assert_eq!(year.date_type, Some("issued"));
    assert_eq!(year.parser, Some("edtf"));
    assert_eq!(year.min_value, Some(-5.0));
    assert_eq!(year.max_value, Some(2.5));
}

#[test]
fn presence_follows_field_contents() {
    let paper = paper();
    let message: &dyn Describable = &paper;
    assert!(matches!(message.get("title"), Some(FieldValue::Str("On Hubs"))));
    assert!(message.get("year").is_none());
    assert!(message.get("cache").is_none());
    match message.get("authors") {
        Some(FieldValue::List(items)) => match &items[0] {
            FieldValue::Message(author) => {
                assert_eq!(author.full_name(), "Author");
                assert!(author.get("orcid").is_none());
            }
            other => panic!("expected message, got {other:?}"),
        },
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn enum_ordinals_and_targets() {
    assert_eq!(Kind::TYPE_NAME, "test.Kind");
    assert_eq!(Kind::Paper.ordinal(), 0);
    assert_eq!(Kind::Misc.ordinal(), 5);
    assert_eq!(Kind::Thesis.ordinal(), 6);
    assert_eq!(Kind::Thesis.enum_ref().target(), Some("thesis"));
    assert_eq!(Kind::Misc.enum_ref().target(), None);
    assert_eq!(Kind::Misc.enum_ref().name(), Some("Misc"));
}

#[test]
fn downcast_recovers_concrete_type() {
    let paper = paper();
    let message: &dyn Describable = &paper;
    let back = message.downcast_ref::<Paper>().unwrap();
    assert_eq!(back.note, "kept");
    assert!(message.downcast_ref::<Author>().is_none());
}

#[test]
fn message_json_includes_present_fields_only() {
    let paper = paper();
    let json = metahub_api::reflect::message_to_json(&paper);
    assert_eq!(json["kind"], serde_json::json!("Thesis"));
    assert_eq!(json["authors"][0]["name"], serde_json::json!("Doe, Jane"));
    assert!(json.get("year").is_none());
}
