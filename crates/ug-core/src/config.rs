//! Configuration loading and resolution.
//!
//! Resolution order: CLI `--config` → `UG_CONFIG` → XDG config dir → defaults.
//! After the file is loaded, `UG_PII_FIELDS`, `UG_REDACTION_MARKER`, and
//! `UG_SEPARATOR` override the redaction tunables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ug_redact::{FieldSpec, HashCost, RedactionPolicy};

use crate::logging::LogConfig;

/// Environment variable naming a config file.
pub const ENV_CONFIG_PATH: &str = "UG_CONFIG";
/// Comma-separated sensitive field names.
pub const ENV_PII_FIELDS: &str = "UG_PII_FIELDS";
/// Redaction marker override.
pub const ENV_MARKER: &str = "UG_REDACTION_MARKER";
/// Separator override (a single character).
pub const ENV_SEPARATOR: &str = "UG_SEPARATOR";

const APP_NAME: &str = "userguard";
const CONFIG_FILENAME: &str = "config.json";

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    CliArgument(PathBuf),
    Environment(PathBuf),
    XdgConfig(PathBuf),
    #[default]
    BuiltinDefault,
}

impl ConfigSource {
    /// The file to load, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CliArgument(p)
            | ConfigSource::Environment(p)
            | ConfigSource::XdgConfig(p) => Some(p.as_path()),
            ConfigSource::BuiltinDefault => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument(p) => write!(f, "CLI argument ({})", p.display()),
            ConfigSource::Environment(p) => write!(f, "environment variable ({})", p.display()),
            ConfigSource::XdgConfig(p) => write!(f, "XDG config ({})", p.display()),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Pick the config file.
///
/// Explicit paths (CLI or `UG_CONFIG`) are taken as given, so a missing
/// file surfaces as a load error. The XDG path is only used if it exists.
pub fn resolve_source(
    cli_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
    config_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = cli_path {
        return ConfigSource::CliArgument(path.to_path_buf());
    }
    if let Some(path) = env(ENV_CONFIG_PATH).filter(|p| !p.is_empty()) {
        return ConfigSource::Environment(PathBuf::from(path));
    }
    if let Some(dir) = config_dir {
        let path = dir.join(APP_NAME).join(CONFIG_FILENAME);
        if path.is_file() {
            return ConfigSource::XdgConfig(path);
        }
    }
    ConfigSource::BuiltinDefault
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub redaction: RedactionPolicy,
    pub hashing: HashCost,
    pub logging: LogConfig,
}

impl CoreConfig {
    /// Resolve, load, apply env overrides, and validate, using the process
    /// environment.
    pub fn resolve(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let env = |key: &str| std::env::var(key).ok();
        let source = resolve_source(cli_path, env, dirs::config_dir());
        let config = match source.path() {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(env)?;
        config.validate()?;
        Ok((config, source))
    }

    /// Load from a JSON file. Missing sections fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `UG_PII_FIELDS`, `UG_REDACTION_MARKER`, and `UG_SEPARATOR`.
    pub fn with_env_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(list) = env(ENV_PII_FIELDS) {
            self.redaction.fields = FieldSpec::parse_list(&list)
                .map_err(|e| ConfigError::Invalid(format!("{}: {}", ENV_PII_FIELDS, e)))?;
        }
        if let Some(marker) = env(ENV_MARKER) {
            self.redaction.marker = marker;
        }
        if let Some(sep) = env(ENV_SEPARATOR) {
            let mut chars = sep.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self.redaction.separator = c,
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be exactly one character",
                        ENV_SEPARATOR
                    )))
                }
            }
        }
        Ok(self)
    }

    /// Reject settings that would make redaction or hashing fail later.
    pub fn validate(&self) -> Result<()> {
        self.redaction
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.hashing
            .to_params()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.logging.tag.is_empty() {
            return Err(ConfigError::Invalid("logging tag must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_validate() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.redaction.fields, FieldSpec::pii());
    }

    #[test]
    fn test_cli_beats_env() {
        let source = resolve_source(
            Some(Path::new("/tmp/cli.json")),
            env_of(&[(ENV_CONFIG_PATH, "/tmp/env.json")]),
            None,
        );
        assert_eq!(source, ConfigSource::CliArgument(PathBuf::from("/tmp/cli.json")));
    }

    #[test]
    fn test_env_beats_xdg() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(APP_NAME)).unwrap();
        std::fs::write(dir.path().join(APP_NAME).join(CONFIG_FILENAME), "{}").unwrap();

        let source = resolve_source(
            None,
            env_of(&[(ENV_CONFIG_PATH, "/tmp/env.json")]),
            Some(dir.path().to_path_buf()),
        );
        assert_eq!(source, ConfigSource::Environment(PathBuf::from("/tmp/env.json")));
    }

    #[test]
    fn test_xdg_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let source = resolve_source(None, env_of(&[]), Some(dir.path().to_path_buf()));
        assert_eq!(source, ConfigSource::BuiltinDefault);

        std::fs::create_dir_all(dir.path().join(APP_NAME)).unwrap();
        let path = dir.path().join(APP_NAME).join(CONFIG_FILENAME);
        std::fs::write(&path, "{}").unwrap();
        let source = resolve_source(None, env_of(&[]), Some(dir.path().to_path_buf()));
        assert_eq!(source, ConfigSource::XdgConfig(path));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"redaction": {"fields": ["ssn"], "marker": "xxx"}, "hashing": {"memory_kib": 64}}"#,
        )
        .unwrap();

        let config = CoreConfig::load(&path).unwrap();
        assert_eq!(config.redaction.fields, FieldSpec::new(["ssn"]).unwrap());
        assert_eq!(config.redaction.marker, "xxx");
        assert_eq!(config.redaction.separator, ';');
        assert_eq!(config.hashing.memory_kib, 64);
        assert_eq!(config.logging, LogConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = CoreConfig::load(Path::new("/nonexistent/userguard.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            CoreConfig::load(&path).unwrap_err(),
            ConfigError::Json { .. }
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = CoreConfig::default()
            .with_env_overrides(env_of(&[
                (ENV_PII_FIELDS, "ssn, email"),
                (ENV_MARKER, "[hidden]"),
                (ENV_SEPARATOR, "|"),
            ]))
            .unwrap();
        assert_eq!(config.redaction.fields, FieldSpec::new(["ssn", "email"]).unwrap());
        assert_eq!(config.redaction.marker, "[hidden]");
        assert_eq!(config.redaction.separator, '|');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_separator_must_be_one_char() {
        let err = CoreConfig::default()
            .with_env_overrides(env_of(&[(ENV_SEPARATOR, ";;")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CoreConfig::default();
        config.redaction.marker.clear();
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.hashing.parallelism = 0;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.logging.tag.clear();
        assert!(config.validate().is_err());
    }
}
