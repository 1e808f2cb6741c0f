//! Computed-field hooks: per-schema functions that run after field routing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use metahub_api::error::HubError;
use metahub_api::record::Record;
use metahub_api::reflect::Describable;

use crate::error::ConversionIssue;

/// Derives record values that no single annotated field produces.
///
/// A hook sees the source message and the record as routing left it.
pub trait ComputedField: Send + Sync {
    fn compute(&self, source: &dyn Describable, record: &mut Record) -> Result<(), HubError>;
}

impl<F> ComputedField for F
where
    F: Fn(&dyn Describable, &mut Record) -> Result<(), HubError> + Send + Sync,
{
    fn compute(&self, source: &dyn Describable, record: &mut Record) -> Result<(), HubError> {
        self(source, record)
    }
}

/// Hooks keyed by schema full name, kept in registration order.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, Vec<Arc<dyn ComputedField>>>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut schemas: Vec<String> = self.read().keys().cloned().collect();
        schemas.sort();
        f.debug_struct("HookRegistry").field("schemas", &schemas).finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Arc<dyn ComputedField>>>> {
        match self.hooks.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("hook registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Arc<dyn ComputedField>>>> {
        match self.hooks.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("hook registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Register a hook for the schema with the given full name.
    pub fn register(&self, schema: impl Into<String>, hook: impl ComputedField + 'static) {
        let schema = schema.into();
        tracing::debug!(schema = %schema, "registered computed-field hook");
        self.write().entry(schema).or_default().push(Arc::new(hook));
    }

    /// Register a hook typed on the concrete source message.
    pub fn register_for<T, F>(&self, hook: F)
    where
        T: Describable,
        F: Fn(&T, &mut Record) -> Result<(), HubError> + Send + Sync + 'static,
    {
        let schema = T::schema().full_name;
        self.register(schema, move |source: &dyn Describable, record: &mut Record| {
            let source = source.downcast_ref::<T>().ok_or_else(|| {
                HubError::hook(format!("source is not a {schema}"))
            })?;
            hook(source, record)
        });
    }

    /// Number of hooks registered for `schema`.
    pub fn count(&self, schema: &str) -> usize {
        self.read().get(schema).map_or(0, Vec::len)
    }

    /// Run every hook registered for the source's schema, in order.
    ///
    /// A failing hook becomes an issue; later hooks still run.
    pub fn apply(&self, source: &dyn Describable, record: &mut Record) -> Vec<ConversionIssue> {
        let schema = source.full_name();
        let hooks = self.read().get(schema).cloned().unwrap_or_default();
        let mut issues = Vec::new();
        for hook in hooks {
            if let Err(error) = hook.compute(source, record) {
                tracing::warn!(schema, error = %error, "computed-field hook failed");
                issues.push(ConversionIssue::Hook {
                    schema: schema.to_string(),
                    error,
                });
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use metahub_api::Describable;

    use super::*;

    #[derive(Describable)]
    #[hub(target = "Record", name = "test.Source")]
    struct Source {
        #[hub(target = "title")]
        title: String,
    }

    #[derive(Describable)]
    #[hub(target = "Record", name = "test.Other")]
    struct Other {
        #[hub(target = "title")]
        title: String,
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let hooks = HookRegistry::new();
        hooks.register_for::<Source, _>(|s, r| {
            r.notes.push(format!("first:{}", s.title));
            Ok(())
        });
        hooks.register("test.Source", |_: &dyn Describable, r: &mut Record| -> Result<(), HubError> {
            r.notes.push("second".into());
            Ok(())
        });
        let source = Source { title: "T".into() };
        let mut record = Record::new();
        let issues = hooks.apply(&source, &mut record);
        assert!(issues.is_empty());
        assert_eq!(record.notes, vec!["first:T", "second"]);
        assert_eq!(hooks.count("test.Source"), 2);
    }

    #[test]
    fn failures_are_collected_and_later_hooks_still_run() {
        let hooks = HookRegistry::new();
        hooks.register_for::<Source, _>(|_, _| Err(HubError::hook("boom")));
        hooks.register_for::<Source, _>(|_, r| {
            r.language = "en".into();
            Ok(())
        });
        let mut record = Record::new();
        let issues = hooks.apply(&Source { title: String::new() }, &mut record);
        assert_eq!(issues.len(), 1);
        assert!(matches!(&issues[0], ConversionIssue::Hook { schema, .. } if schema == "test.Source"));
        assert_eq!(record.language, "en");
    }

    #[test]
    fn hooks_are_scoped_to_their_schema() {
        let hooks = HookRegistry::new();
        hooks.register_for::<Source, _>(|_, r| {
            r.title = "computed".into();
            Ok(())
        });
        let mut record = Record::new();
        hooks.apply(&Other { title: String::new() }, &mut record);
        assert!(record.title.is_empty());
    }
}
