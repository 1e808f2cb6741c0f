/// Typed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
}

/// Options handed to parsers, validators and serializers.
///
/// The orchestrator builds this from a field's annotation (`pattern`,
/// `min_length`, `delimiter`, ...); standalone callers build it by hand.
/// Functions read values via typed getters, no parsing needed.
#[derive(Debug, Clone, Default)]
pub struct Options {
    entries: Vec<(String, OptionValue)>,
}

impl Options {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn with_str(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, OptionValue::Str(value.into()))
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(OptionValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(OptionValue::I64(v)) => Some(*v),
            Some(OptionValue::U64(v)) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(OptionValue::U64(v)) => Some(*v),
            Some(OptionValue::I64(v)) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(OptionValue::F64(v)) => Some(*v),
            Some(OptionValue::I64(v)) => Some(*v as f64),
            Some(OptionValue::U64(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(OptionValue::Str(v)) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_existing_entry() {
        let mut options = Options::new().with_str("delimiter", ",");
        options.set("delimiter", OptionValue::Str(";".into()));
        assert_eq!(options.get_str("delimiter"), Some(";"));
    }

    #[test]
    fn numeric_getters_widen_compatible_kinds() {
        let options = Options::new()
            .with("min_length", OptionValue::I64(3))
            .with("max_value", OptionValue::U64(10))
            .with("negative", OptionValue::I64(-1));
        assert_eq!(options.get_u64("min_length"), Some(3));
        assert_eq!(options.get_f64("max_value"), Some(10.0));
        assert_eq!(options.get_u64("negative"), None);
        assert_eq!(options.get_str("min_length"), None);
        assert!(!options.contains("pattern"));
    }
}
