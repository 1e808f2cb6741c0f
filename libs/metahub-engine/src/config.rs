use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// Engine configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Overrides every message's `preserve_unmapped` flag when set.
    pub preserve_unmapped: Option<bool>,

    /// Delimiter handed to the `split` parser when a field declares none.
    pub split_delimiter: String,

    /// Which issue severity makes a conversion fail for the caller.
    pub fail_on: FailOn,

    /// Per-field priority overrides.
    pub priorities: Vec<PriorityOverride>,

    /// Validators the orchestrator skips.
    pub disabled_validators: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            preserve_unmapped: None,
            split_delimiter: default_split_delimiter(),
            fail_on: FailOn::default(),
            priorities: Vec::new(),
            disabled_validators: Vec::new(),
        }
    }
}

fn default_split_delimiter() -> String {
    ";".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailOn {
    Never,
    #[default]
    Errors,
    Warnings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriorityOverride {
    /// Full name of the source schema.
    pub schema: String,
    pub field: String,
    pub priority: i32,
}

impl HubConfig {
    /// Priority override declared for `schema.field`.
    pub fn priority_override(&self, schema: &str, field: &str) -> Option<i32> {
        self.priorities
            .iter()
            .find(|p| p.schema == schema && p.field == field)
            .map(|p| p.priority)
    }

    pub fn validator_enabled(&self, name: &str) -> bool {
        !self.disabled_validators.iter().any(|v| v == name)
    }

    /// Load configuration from a file, picking the parser by extension.
    pub fn load(path: impl AsRef<Path>, parsers: &[&dyn ConfigParser]) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| EngineError::Config(format!("{}: missing file extension", path.display())))?;
        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .ok_or_else(|| {
                EngineError::Config(format!("{}: no parser for '.{ext}' files", path.display()))
            })?;
        let content = std::fs::read_to_string(path).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "cannot read hub config");
        })?;
        let config = parser
            .parse(&content)
            .map_err(|e| e.with_context(path.display()))?;
        tracing::info!(path = %path.display(), "loaded hub config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        TomlParser.parse(toml_str)
    }
}

/// A configuration file format.
pub trait ConfigParser {
    /// File extensions handled, without the dot.
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<HubConfig, EngineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<HubConfig, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = HubConfig::parse("").unwrap();
        assert_eq!(config, HubConfig::default());
        assert_eq!(config.split_delimiter, ";");
        assert_eq!(config.fail_on, FailOn::Errors);
    }

    #[test]
    fn parses_every_section() {
        let config = HubConfig::parse(
            r#"
            preserve_unmapped = false
            split_delimiter = "|"
            fail_on = "warnings"
            disabled_validators = ["url"]

            [[priorities]]
            schema = "bibtex.Entry"
            field = "shorttitle"
            priority = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.preserve_unmapped, Some(false));
        assert_eq!(config.split_delimiter, "|");
        assert_eq!(config.fail_on, FailOn::Warnings);
        assert_eq!(config.priority_override("bibtex.Entry", "shorttitle"), Some(9));
        assert_eq!(config.priority_override("bibtex.Entry", "title"), None);
        assert!(!config.validator_enabled("url"));
        assert!(config.validator_enabled("isbn"));
    }

    #[test]
    fn rejects_unknown_fail_on() {
        let err = HubConfig::parse(r#"fail_on = "sometimes""#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn load_picks_parser_by_extension() {
        let dir = std::env::temp_dir().join(format!("metahub-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hub.toml");
        std::fs::write(&path, "split_delimiter = \",\"\n").unwrap();

        let config = HubConfig::load(&path, &[&TomlParser]).unwrap();
        assert_eq!(config.split_delimiter, ",");

        let yaml = dir.join("hub.yaml");
        std::fs::write(&yaml, "x: 1\n").unwrap();
        assert!(matches!(
            HubConfig::load(&yaml, &[&TomlParser]),
            Err(EngineError::Config(_))
        ));

        let missing = HubConfig::load(dir.join("absent.toml"), &[&TomlParser]).unwrap_err();
        assert!(matches!(
            &missing,
            EngineError::Io(e) if e.kind() == std::io::ErrorKind::NotFound
        ));
        assert!(missing.to_string().starts_with("io error: "));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
