//! Configuration loading and environment variable handling

use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::source::{Settings, KEY_SEPARATOR};

/// Separator used in environment variable names in place of `:`
pub const ENV_SEGMENT_SEPARATOR: &str = "__";

/// Configuration loader with environment variable support
///
/// With the default prefix, `PLUGFY_Extensions__Library__Communications__Type`
/// overrides `Extensions:Library:Communications:Type`.
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "PLUGFY".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load settings from a YAML or JSON file with environment overrides.
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<Settings> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut settings = if is_json {
            Self::parse_json(&content)?
        } else {
            Self::parse_yaml(&content)?
        };

        debug!(target: "config", path = ?path, "Loaded settings file");

        self.apply_env_overrides(&mut settings)?;
        Ok(settings)
    }

    /// Load settings from environment variables only
    pub fn from_env(&self) -> ConfigResult<Settings> {
        let mut settings = Settings::new();
        self.apply_env_overrides(&mut settings)?;
        Ok(settings)
    }

    /// Load settings with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<Settings> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Parse a YAML settings document
    pub fn parse_yaml(content: &str) -> ConfigResult<Settings> {
        let value: serde_json::Value = serde_yaml::from_str(content)?;
        Settings::from_value(value)
    }

    /// Parse a JSON settings document
    pub fn parse_json(content: &str) -> ConfigResult<Settings> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Settings::from_value(value)
    }

    /// Apply environment variable overrides to the settings tree
    fn apply_env_overrides(&self, settings: &mut Settings) -> ConfigResult<()> {
        let prefix = format!("{}_", self.prefix);

        for (name, value) in std::env::vars_os() {
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }

            let value = value.into_string().map_err(|_| {
                ConfigError::EnvError(format!("{} is not valid UTF-8", name))
            })?;

            let key = rest.replace(ENV_SEGMENT_SEPARATOR, &KEY_SEPARATOR.to_string());
            debug!(target: "config", key = %key, "Applying environment override");
            settings.set(&key, value);
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ConfigSource;

    #[test]
    fn test_parse_yaml_renders_scalars() {
        let settings = ConfigLoader::parse_yaml(
            r#"
Extensions:
  Library:
    Communications:
      Type: STDInOut
      Interactive: true
"#,
        )
        .unwrap();

        assert_eq!(
            settings.get("Extensions:Library:Communications:Interactive").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_parse_json_rejects_non_mapping() {
        assert!(ConfigLoader::parse_json("[1, 2]").is_err());
    }
}
