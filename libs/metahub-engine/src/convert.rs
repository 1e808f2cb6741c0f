//! Conversion orchestrator: source message → canonical record.

use std::sync::Arc;

use metahub_api::converter::FieldParser;
use metahub_api::error::HubError;
use metahub_api::options::{OptionValue, Options};
use metahub_api::record::Record;
use metahub_api::reflect::{Describable, FieldAnnotation, FieldValue};
use metahub_api::value::Value;

use crate::coerce::coerce;
use crate::config::{FailOn, HubConfig};
use crate::error::{ConversionIssue, EngineError, Severity};
use crate::hooks::HookRegistry;
use crate::merge::{Decision, SlotKey, SlotPriorities, absorb};
use crate::registry::Registries;
use crate::resolve::{ResolvedField, resolve};
use crate::route::{Routed, route};

/// Record plus the non-fatal issues met while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub record: Record,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionResult {
    pub fn errors(&self) -> impl Iterator<Item = &ConversionIssue> + '_ {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConversionIssue> + '_ {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    /// Whether the caller's failure policy accepts this result.
    pub fn passes(&self, fail_on: FailOn) -> bool {
        match fail_on {
            FailOn::Never => true,
            FailOn::Errors => self.errors().next().is_none(),
            FailOn::Warnings => self.issues.is_empty(),
        }
    }

    pub fn into_parts(self) -> (Record, Vec<ConversionIssue>) {
        (self.record, self.issues)
    }
}

/// Converts annotated source messages into canonical records.
///
/// Cheap to clone; registries and hooks are shared.
#[derive(Debug, Clone)]
pub struct Converter {
    registries: Arc<Registries>,
    hooks: Arc<HookRegistry>,
    config: HubConfig,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(
            Arc::new(Registries::with_defaults()),
            Arc::new(HookRegistry::new()),
        )
    }
}

impl Converter {
    pub fn new(registries: Arc<Registries>, hooks: Arc<HookRegistry>) -> Self {
        Self {
            registries,
            hooks,
            config: HubConfig::default(),
        }
    }

    pub fn with_config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    pub fn hooks(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Convert one source message.
    ///
    /// Structural problems (the message does not target `Record`, an
    /// annotation names an unregistered function) fail the call. Everything
    /// else is collected in [`ConversionResult::issues`].
    pub fn to_hub(&self, source: &dyn Describable) -> Result<ConversionResult, EngineError> {
        let schema = source.full_name();
        let fields = resolve(source)?;
        let preserve_unmapped = self
            .config
            .preserve_unmapped
            .unwrap_or_else(|| source.descriptor().preserve_unmapped());

        let mut pass = Pass {
            record: Record::new(),
            issues: Vec::new(),
            slots: SlotPriorities::new(),
            winners: Vec::new(),
        };

        for field in fields {
            let ResolvedField {
                name,
                value,
                annotation,
            } = field;

            let Some(annotation) = annotation else {
                match value {
                    Some(value) if preserve_unmapped => {
                        tracing::debug!(schema, field = name, "preserving unmapped field");
                        pass.record.set_extra(name, value.to_json(), None);
                    }
                    _ => tracing::debug!(schema, field = name, "dropping unmapped field"),
                }
                continue;
            };

            let Some(origin) = value else {
                tracing::debug!(schema, field = name, "skipping absent field");
                if annotation.required {
                    pass.issues
                        .push(ConversionIssue::RequiredMissing { field: name.to_string() });
                }
                continue;
            };

            self.convert_field(&mut pass, schema, name, &annotation, &origin)?;
        }

        let Pass {
            mut record,
            mut issues,
            winners,
            ..
        } = pass;
        for (_, scratch) in winners {
            absorb(&mut record, scratch);
        }

        issues.extend(self.hooks.apply(source, &mut record));
        tracing::debug!(schema, issues = issues.len(), "converted message");
        Ok(ConversionResult { record, issues })
    }

    fn convert_field(
        &self,
        pass: &mut Pass,
        schema: &str,
        name: &str,
        annotation: &FieldAnnotation,
        origin: &FieldValue<'_>,
    ) -> Result<(), EngineError> {
        let options = self.options_for(annotation);

        let mut value = coerce(origin);
        if let Some(parser_name) = annotation.parser {
            let parser = self.registries.parsers.require(parser_name)?;
            value = match apply_parser(parser.as_ref(), value, &options) {
                Ok(parsed) => parsed,
                Err(error) => {
                    let error = error.with_context(format_args!("parser '{parser_name}'"));
                    tracing::debug!(schema, field = name, error = %error, "parser failed, skipping field");
                    pass.issues.push(ConversionIssue::Field {
                        field: name.to_string(),
                        error,
                    });
                    return Ok(());
                }
            };
        }

        let rules = self.rules_for(annotation);
        if !rules.is_empty() {
            if let Err(errors) = self
                .registries
                .validate_all(&rules.join(","), &value, &options)?
            {
                pass.issues.extend(
                    errors
                        .into_iter()
                        .map(|e| ConversionIssue::Validation(e.with_field(name))),
                );
            }
        }

        let priority = self
            .config
            .priority_override(schema, name)
            .or(annotation.priority);
        let routed = match priority {
            None => route(&mut pass.record, name, annotation, &value, Some(origin)),
            Some(priority) => {
                let key = SlotKey::of(annotation);
                let mut scratch = Record::new();
                let mut routed = Routed::default();
                let decision = pass.slots.offer(key.clone(), priority, || {
                    routed = route(&mut scratch, name, annotation, &value, Some(origin));
                    routed.written > 0
                });
                tracing::debug!(schema, field = name, priority, decision = ?decision, "priority decision");
                if decision == Decision::Claimed {
                    match pass.winners.iter_mut().find(|(k, _)| *k == key) {
                        Some(entry) => entry.1 = scratch,
                        None => pass.winners.push((key, scratch)),
                    }
                }
                routed
            }
        };

        pass.issues
            .extend(routed.warnings.into_iter().map(|message| ConversionIssue::Routing {
                field: name.to_string(),
                message,
            }));
        Ok(())
    }

    fn options_for(&self, annotation: &FieldAnnotation) -> Options {
        let mut options = annotation.options();
        if !options.contains("delimiter") {
            options.set(
                "delimiter",
                OptionValue::Str(self.config.split_delimiter.clone()),
            );
        }
        options
    }

    /// Declared validators, implied constraint validators, then `required`.
    fn rules_for(&self, annotation: &FieldAnnotation) -> Vec<&'static str> {
        let mut rules: Vec<&'static str> = Vec::new();
        let declared = annotation
            .validator_names()
            .chain(annotation.implied_validators())
            .chain(annotation.required.then_some("required"));
        for rule in declared {
            if !rules.contains(&rule) && self.config.validator_enabled(rule) {
                rules.push(rule);
            }
        }
        rules
    }
}

/// Per-call state of one `to_hub` run.
struct Pass {
    record: Record,
    issues: Vec<ConversionIssue>,
    slots: SlotPriorities,
    /// Scratch record of the current winner of each prioritized slot.
    winners: Vec<(SlotKey, Record)>,
}

/// Run `parser` over every textual scalar of `value`.
fn apply_parser<'a>(
    parser: &dyn FieldParser,
    value: Value<'a>,
    options: &Options,
) -> Result<Value<'a>, HubError> {
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match parse_scalar(parser, item, options)? {
                    Value::Array(nested) => out.extend(nested),
                    parsed => out.push(parsed),
                }
            }
            Ok(Value::Array(out))
        }
        other => parse_scalar(parser, other, options),
    }
}

fn parse_scalar<'a>(
    parser: &dyn FieldParser,
    value: Value<'a>,
    options: &Options,
) -> Result<Value<'a>, HubError> {
    let text = match &value {
        Value::String(s) => s.to_string(),
        Value::Int64(_) | Value::UInt64(_) | Value::Float64(_) => match value.to_text() {
            Some(text) => text,
            None => return Ok(value),
        },
        _ => return Ok(value),
    };
    parser.parse(&text, options)
}

#[cfg(test)]
mod tests {
    use metahub_api::Describable;
    use metahub_api::vocab::DateType;

    use super::*;

    #[derive(Describable)]
    #[hub(target = "Record", name = "test.Article")]
    struct Article {
        #[hub(target = "title", parser = "normalize_whitespace", required)]
        title: String,
        #[hub(target = "dates", date_type = "issued", parser = "edtf")]
        issued: String,
        #[hub(target = "identifiers", identifier_type = "isbn", parser = "isbn", validators = "isbn")]
        isbn: String,
        #[hub(target = "subjects", parser = "split")]
        keywords: String,
        #[hub(target = "notes", max_length = 5)]
        note: String,
        #[hub(target = "language", parser = "no_such_parser")]
        language: String,
        pages: String,
    }

    fn article() -> Article {
        Article {
            title: "  A   Study ".into(),
            issued: "1978-03-15".into(),
            isbn: "978-0-306-40615-7".into(),
            keywords: "birds; fish".into(),
            note: "ok".into(),
            language: String::new(),
            pages: "1-10".into(),
        }
    }

    #[test]
    fn converts_annotated_fields() {
        let result = Converter::default().to_hub(&article()).unwrap();
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        let record = &result.record;
        assert_eq!(record.title, "A Study");
        let issued = record.date(DateType::Issued).unwrap();
        assert_eq!((issued.year, issued.month, issued.day), (Some(1978), Some(3), Some(15)));
        assert_eq!(
            record.identifier(metahub_api::vocab::IdentifierType::Isbn),
            Some("9780306406157")
        );
        let subjects: Vec<_> = record.subjects.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(subjects, vec!["birds", "fish"]);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn validation_failures_are_advisory() {
        let source = Article {
            isbn: "9780306406158".into(),
            note: "far too long".into(),
            ..article()
        };
        let result = Converter::default().to_hub(&source).unwrap();
        let rules: Vec<_> = result
            .issues
            .iter()
            .filter_map(|i| match i {
                ConversionIssue::Validation(e) => Some((e.field.as_str(), e.rule.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(rules, vec![("isbn", "isbn"), ("note", "length")]);
        assert_eq!(result.record.notes, vec!["far too long"]);
        assert!(result.passes(FailOn::Errors));
        assert!(!result.passes(FailOn::Warnings));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let source = Article {
            title: String::new(),
            ..article()
        };
        let result = Converter::default().to_hub(&source).unwrap();
        assert_eq!(
            result.errors().cloned().collect::<Vec<_>>(),
            vec![ConversionIssue::RequiredMissing {
                field: "title".into()
            }]
        );
        assert!(!result.passes(FailOn::Errors));
        assert!(result.passes(FailOn::Never));
    }

    #[test]
    fn unregistered_parser_aborts_only_when_reached() {
        let source = Article {
            language: "en".into(),
            ..article()
        };
        let err = Converter::default().to_hub(&source).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NotFound { registry: "parser", ref name } if name == "no_such_parser"
        ));
    }

    #[test]
    fn parser_failure_skips_the_field() {
        let registries = Registries::with_defaults();
        registries.register_parser("isbn", |_: &str, _: &Options| -> Result<Value<'static>, HubError> {
            Err(HubError::parse("unreadable"))
        });
        let converter = Converter::new(Arc::new(registries), Arc::new(HookRegistry::new()));
        let result = converter.to_hub(&article()).unwrap();
        assert!(result.record.identifiers.is_empty());
        match &result.issues[..] {
            [ConversionIssue::Field { field, error }] => {
                assert_eq!(field, "isbn");
                assert_eq!(error.to_string(), "Parse: parser 'isbn': unreadable");
            }
            other => panic!("unexpected issues {other:?}"),
        }
    }

    #[test]
    fn config_can_disable_validators_and_override_delimiter() {
        let config = HubConfig {
            split_delimiter: "|".into(),
            disabled_validators: vec!["length".into()],
            ..HubConfig::default()
        };
        let source = Article {
            keywords: "a|b|c".into(),
            note: "far too long".into(),
            ..article()
        };
        let result = Converter::default().with_config(config).to_hub(&source).unwrap();
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.record.subjects.len(), 3);
    }

    #[test]
    fn parser_flattens_sequences_one_level() {
        let registries = Registries::with_defaults();
        let parser = registries.parsers.require("split").unwrap();
        let value = Value::Array(vec![Value::str("a;b"), Value::str("c"), Value::Bool(true)]);
        let options = Options::new().with_str("delimiter", ";");
        let parsed = apply_parser(parser.as_ref(), value, &options).unwrap();
        assert_eq!(
            parsed,
            Value::Array(vec![
                Value::str("a"),
                Value::str("b"),
                Value::str("c"),
                Value::Bool(true),
            ])
        );
    }
}
