//! Configuration management for Lumen.
//!
//! Configuration is loaded once at startup from a TOML file with sensible
//! defaults, then adjusted by a couple of environment variables. After that
//! it is never mutated.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use crate::llm::resolve_env_var;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Lumen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Gemini model settings
    pub gemini: GeminiConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `path`, then apply env overrides.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load_from_optional(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::read_from(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORT` and `GEMINI_MODEL` overrides using the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }
        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.gemini.model = model;
        }
        self.validate()
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.lumen.lumen/config.toml
    /// - Linux: ~/.config/lumen/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\lumen\config\config.toml
    ///
    /// Falls back to ~/.lumen/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "lumen", "lumen")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".lumen").join("config.toml")
            })
    }

    /// Get the resolved landing page path (with ~ expansion).
    pub fn index_path(&self) -> PathBuf {
        let path_str = self.server.index_path.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// The Gemini credential, with `${ENV_VAR}` references resolved.
    pub fn api_key(&self) -> Option<String> {
        resolve_env_var(&self.gemini.api_key).filter(|key| !key.trim().is_empty())
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.server.max_upload_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.api_key, "${GEMINI_API_KEY}");
        assert!(config.server.cors_permissive);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[gemini]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_load_from_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[gemini]\napi_key = \"literal-key\"\nmodel = \"gemini-2.0-flash\"\n",
        )
        .unwrap();

        let config = Config::read_from(&path).unwrap();
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.api_key().as_deref(), Some("literal-key"));
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_load_from_optional_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_optional(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.max_upload_mb, 16);
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nmax_upload_mb = 0\n").unwrap();

        let err = Config::read_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::read_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides_port_and_model() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[("PORT", "9090"), ("GEMINI_MODEL", "gemini-pro")]))
            .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.gemini.model, "gemini-pro");
    }

    #[test]
    fn test_env_override_rejects_bad_port() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(env(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_blank_model_override_is_ignored() {
        let mut config = Config::default();
        config
            .apply_env_overrides(env(&[("GEMINI_MODEL", "")]))
            .unwrap();
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_api_key_absent_when_blank() {
        let mut config = Config::default();
        config.gemini.api_key = String::new();
        assert_eq!(config.api_key(), None);

        config.gemini.api_key = "${LUMEN_TEST_UNSET_KEY_XYZ}".to_string();
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_max_upload_bytes() {
        let config = Config::default();
        assert_eq!(config.max_upload_bytes(), 16 * 1024 * 1024);
    }
}
