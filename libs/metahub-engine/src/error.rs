use metahub_api::error::{HubError, ValidationError};

/// Structural errors: a configuration mistake, not bad data. Aborts the call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("schema '{schema}' targets '{target}', expected 'Record'")]
    TargetMismatch { schema: String, target: String },

    #[error("{registry} '{name}' not found")]
    NotFound { registry: &'static str, name: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("plugin error: {0}")]
    Plugin(#[from] HubError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn not_found(registry: &'static str, name: impl Into<String>) -> Self {
        EngineError::NotFound {
            registry,
            name: name.into(),
        }
    }

    /// Add context to the error.
    ///
    /// For `Plugin` variant, context is added to the inner `HubError`.
    /// For `Config`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Plugin(e) => EngineError::Plugin(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

/// How bad a [`ConversionIssue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Non-fatal problem met while converting one record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionIssue {
    /// Parser failure; the field was skipped.
    #[error("field '{field}': {error}")]
    Field { field: String, error: HubError },

    #[error("required field '{field}' is absent")]
    RequiredMissing { field: String },

    /// Advisory; the value was still routed.
    #[error("{0}")]
    Validation(ValidationError),

    /// The value had no usable slot and was parked in Extra or ignored.
    #[error("field '{field}': {message}")]
    Routing { field: String, message: String },

    #[error("hook for '{schema}': {error}")]
    Hook { schema: String, error: HubError },
}

impl ConversionIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ConversionIssue::Field { .. }
            | ConversionIssue::RequiredMissing { .. }
            | ConversionIssue::Hook { .. } => Severity::Error,
            ConversionIssue::Validation(_) | ConversionIssue::Routing { .. } => Severity::Warning,
        }
    }

    /// Source field the issue is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConversionIssue::Field { field, .. }
            | ConversionIssue::RequiredMissing { field }
            | ConversionIssue::Routing { field, .. } => Some(field),
            ConversionIssue::Validation(e) => Some(&e.field),
            ConversionIssue::Hook { .. } => None,
        }
    }
}
