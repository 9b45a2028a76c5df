//! Optional TOML configuration
//!
//! Looked up at `--config` or `<config dir>/zkrun/config.toml`. Every value
//! can be overridden by the matching command line flag.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings read from the configuration file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default program artifact
    pub artifact: Option<PathBuf>,
    /// Default input document
    pub inputs: Option<PathBuf>,
    /// Directory holding `<name>.pk` / `<name>.vk`
    pub keys_dir: Option<PathBuf>,
    /// Seed for deterministic development keys
    pub seed: Option<u64>,
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub log_level: Option<String>,
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("zkrun").join("config.toml"))
    }

    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Load `path` if given (it must exist), else the default file if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Keys directory, defaulting to `./keys`
    pub fn keys_dir(&self) -> PathBuf {
        self.keys_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("keys"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let config = Config::parse(
            r#"
            artifact = "target/program.json"
            seed = 7
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.artifact, Some(PathBuf::from("target/program.json")));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.keys_dir(), PathBuf::from("keys"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::parse("artefact = \"x\"").is_err());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("zkrun.toml");
        std::fs::write(&path, "keys_dir = \"/tmp/k\"\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.keys_dir(), PathBuf::from("/tmp/k"));
    }
}
