use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use metahub_api::converter::{FieldParser, FieldSerializer, FieldValidator};
use metahub_api::error::{ValidationError, ValidationErrors};
use metahub_api::options::Options;
use metahub_api::reflect::split_rules;
use metahub_api::value::Value;

use crate::error::EngineError;
use crate::{parsers, serializers, validators};

/// Name → function table.
///
/// Uses interior mutability so that spokes can register functions after the
/// registry has been shared with a converter.
pub struct Registry<T: ?Sized> {
    kind: &'static str,
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("names", &self.names())
            .finish()
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<T>>> {
        match self.entries.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!(registry = self.kind, "registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<T>>> {
        match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!(registry = self.kind, "registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Register under `name`, replacing any previous entry.
    pub fn register(&self, name: impl Into<String>, entry: Arc<T>) {
        let name = name.into();
        if self.write().insert(name.clone(), entry).is_some() {
            tracing::debug!(registry = self.kind, name = %name, "replaced registry entry");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.read().get(name).cloned()
    }

    /// Like [`get`](Self::get), with a miss as a structural error.
    pub fn require(&self, name: &str) -> Result<Arc<T>, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::not_found(self.kind, name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// The three function registries, constructed explicitly and shared by `Arc`.
#[derive(Debug)]
pub struct Registries {
    pub parsers: Registry<dyn FieldParser>,
    pub validators: Registry<dyn FieldValidator>,
    pub serializers: Registry<dyn FieldSerializer>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::empty()
    }
}

impl Registries {
    /// Registries with nothing registered.
    pub fn empty() -> Self {
        Self {
            parsers: Registry::new("parser"),
            validators: Registry::new("validator"),
            serializers: Registry::new("serializer"),
        }
    }

    /// Registries seeded with the built-in functions.
    pub fn with_defaults() -> Self {
        let registries = Self::empty();
        parsers::register_defaults(&registries);
        validators::register_defaults(&registries);
        serializers::register_defaults(&registries);
        tracing::info!(
            parsers = registries.parsers.len(),
            validators = registries.validators.len(),
            serializers = registries.serializers.len(),
            "seeded default registries"
        );
        registries
    }

    pub fn register_parser(&self, name: impl Into<String>, parser: impl FieldParser + 'static) {
        self.parsers.register(name, Arc::new(parser));
    }

    pub fn register_validator(
        &self,
        name: impl Into<String>,
        validator: impl FieldValidator + 'static,
    ) {
        self.validators.register(name, Arc::new(validator));
    }

    pub fn register_serializer(
        &self,
        name: impl Into<String>,
        serializer: impl FieldSerializer + 'static,
    ) {
        self.serializers.register(name, Arc::new(serializer));
    }

    /// Apply the parser registered as `name`.
    pub fn parse(
        &self,
        name: &str,
        input: &str,
        options: &Options,
    ) -> Result<Value<'static>, EngineError> {
        let parser = self.parsers.require(name)?;
        parser
            .parse(input, options)
            .map_err(|e| EngineError::Plugin(e.with_context(format_args!("parser '{name}'"))))
    }

    /// Apply the validator registered as `name`.
    ///
    /// The outer error is structural (unknown name); the inner one is the
    /// advisory validation failure.
    pub fn validate(
        &self,
        name: &str,
        value: &Value<'_>,
        options: &Options,
    ) -> Result<Result<(), ValidationError>, EngineError> {
        let validator = self.validators.require(name)?;
        Ok(validator.validate(value, options))
    }

    /// Run every rule of a comma-separated list, with no short-circuit.
    ///
    /// All names are resolved before any rule runs, so an unknown name fails
    /// the call without partial results.
    pub fn validate_all(
        &self,
        rules: &str,
        value: &Value<'_>,
        options: &Options,
    ) -> Result<Result<(), ValidationErrors>, EngineError> {
        let validators = split_rules(rules)
            .map(|name| self.validators.require(name))
            .collect::<Result<Vec<_>, _>>()?;
        let mut errors = ValidationErrors::new();
        for validator in validators {
            if let Err(e) = validator.validate(value, options) {
                errors.push(e);
            }
        }
        Ok(errors.into_result())
    }

    /// Apply the serializer registered as `name`.
    pub fn serialize(
        &self,
        name: &str,
        value: &Value<'_>,
        options: &Options,
    ) -> Result<String, EngineError> {
        let serializer = self.serializers.require(name)?;
        serializer
            .serialize(value, options)
            .map_err(|e| EngineError::Plugin(e.with_context(format_args!("serializer '{name}'"))))
    }
}

#[cfg(test)]
mod tests {
    use metahub_api::error::HubError;

    use super::*;

    #[test]
    fn unknown_names_are_structural_errors() {
        let registries = Registries::empty();
        let err = registries
            .parse("missing", "x", &Options::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { registry: "parser", .. }));
        assert!(registries.validate("missing", &Value::Null, &Options::new()).is_err());
        assert!(registries.serialize("missing", &Value::Null, &Options::new()).is_err());
    }

    #[test]
    fn runtime_registration_is_visible() {
        let registries = Registries::empty();
        registries.register_parser("upper", |input: &str, _: &Options| -> Result<Value<'static>, HubError> {
            Ok(Value::owned(input.to_uppercase()))
        });
        let value = registries.parse("upper", "hub", &Options::new()).unwrap();
        assert_eq!(value.as_str(), Some("HUB"));
        assert_eq!(registries.parsers.names(), vec!["upper".to_string()]);
    }

    #[test]
    fn parser_errors_carry_parser_name() {
        let registries = Registries::empty();
        registries.register_parser("never", |_: &str, _: &Options| -> Result<Value<'static>, HubError> {
            Err(HubError::parse("no"))
        });
        let err = registries.parse("never", "x", &Options::new()).unwrap_err();
        assert_eq!(err.to_string(), "plugin error: Parse: parser 'never': no");
    }

    #[test]
    fn validate_all_runs_every_rule() {
        let registries = Registries::empty();
        registries.register_validator("a", |v: &Value<'_>, _: &Options| -> Result<(), ValidationError> {
            Err(ValidationError::new("a", v.to_text().unwrap_or_default(), "first"))
        });
        registries.register_validator("b", |_: &Value<'_>, _: &Options| -> Result<(), ValidationError> {
            Ok(())
        });
        registries.register_validator("c", |v: &Value<'_>, _: &Options| -> Result<(), ValidationError> {
            Err(ValidationError::new("c", v.to_text().unwrap_or_default(), "third"))
        });

        let errors = registries
            .validate_all("a, b,c", &Value::str("x"), &Options::new())
            .unwrap()
            .unwrap_err();
        let rules: Vec<_> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, vec!["a", "c"]);

        assert!(registries
            .validate_all("a,unknown", &Value::str("x"), &Options::new())
            .is_err());
    }

    #[test]
    fn defaults_are_seeded() {
        let registries = Registries::with_defaults();
        for name in ["edtf", "split", "name", "doi", "isbn", "orcid", "relator"] {
            assert!(registries.parsers.contains(name), "parser {name}");
        }
        for name in ["required", "isbn", "issn", "orcid", "pattern", "length", "range", "count"] {
            assert!(registries.validators.contains(name), "validator {name}");
        }
        assert!(registries.serializers.contains("edtf"));
    }
}
