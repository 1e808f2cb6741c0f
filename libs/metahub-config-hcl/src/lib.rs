//! HCL support for the engine's configuration file.

use std::path::Path;

use metahub_engine::config::{ConfigParser, HubConfig, TomlParser};
use metahub_engine::error::EngineError;

#[derive(Debug, Clone, Copy, Default)]
pub struct HclParser;

impl ConfigParser for HclParser {
    fn extensions(&self) -> &[&str] {
        &["hcl"]
    }

    fn parse(&self, content: &str) -> Result<HubConfig, EngineError> {
        hcl::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}

/// Load a `.toml` or `.hcl` configuration file.
pub fn load(path: impl AsRef<Path>) -> Result<HubConfig, EngineError> {
    HubConfig::load(path, &[&TomlParser, &HclParser])
}

#[cfg(test)]
mod tests {
    use metahub_engine::config::FailOn;

    use super::*;

    const CONFIG: &str = r#"
preserve_unmapped   = true
split_delimiter     = ","
fail_on             = "warnings"
disabled_validators = ["length", "url"]

priorities = [
  { schema = "bibtex.Entry", field = "title", priority = 9 },
]
"#;

    #[test]
    fn parses_hcl_config() {
        let config = HclParser.parse(CONFIG).unwrap();
        assert_eq!(config.preserve_unmapped, Some(true));
        assert_eq!(config.split_delimiter, ",");
        assert_eq!(config.fail_on, FailOn::Warnings);
        assert!(!config.validator_enabled("url"));
        assert_eq!(config.priority_override("bibtex.Entry", "title"), Some(9));
    }

    #[test]
    fn empty_body_uses_defaults() {
        assert_eq!(HclParser.parse("").unwrap(), HubConfig::default());
    }

    #[test]
    fn load_picks_parser_by_extension() {
        let dir = std::env::temp_dir().join(format!("metahub-hcl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hub.hcl");
        std::fs::write(&path, CONFIG).unwrap();
        assert_eq!(load(&path).unwrap().split_delimiter, ",");

        let bad = dir.join("hub.yaml");
        std::fs::write(&bad, "").unwrap();
        assert!(matches!(load(&bad), Err(EngineError::Config(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
