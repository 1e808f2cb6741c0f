use std::fmt;

/// Error kind for pluggable-function errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Serialize,
    Hook,
}

/// Hub error, returned by parsers, serializers and computed-field hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HubError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Parse, message: msg.into() }
    }

    pub fn serialize(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Serialize, message: msg.into() }
    }

    pub fn hook(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Hook, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HubError {}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        Self::parse(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A failed validation rule. Always advisory: the value is still routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Source field name; empty when the validator ran standalone.
    pub field: String,
    /// Offending value, rendered as text.
    pub value: String,
    pub rule: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(rule: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: String::new(),
            value: value.into(),
            rule: rule.into(),
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{} ({:?}): {}", self.rule, self.value, self.message)
        } else {
            write!(
                f,
                "field '{}' failed {} ({:?}): {}",
                self.field, self.rule, self.value, self.message
            )
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every failure from one `validate_all` run, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(e: ValidationError) -> Self {
        Self(vec![e])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
