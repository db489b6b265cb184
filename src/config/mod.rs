//! Service configuration: TOML file + environment overrides, resolved once
//! at startup. Business logic never reads the process environment directly;
//! it receives this object (or a slice of it) at construction time.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable names recognized by [`Config::apply_env_overrides`].
const ENV_API_KEY: &str = "RECALLKEY_API_KEY";
const ENV_API_URL: &str = "RECALLKEY_API_URL";
const ENV_STORAGE_URL: &str = "RECALLKEY_STORAGE_URL";
const ENV_STORAGE_KEY: &str = "RECALLKEY_STORAGE_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub chat: ChatConfig,
    pub report: ReportConfig,
    pub storage: StorageConfig,
    pub gateway: GatewayConfig,
}

/// OpenAI-compatible chat-completions endpoint shared by the chat relay and
/// the report extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
        }
    }
}

/// Generation settings for the user-facing chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Settings for the report extraction call and code issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub model: String,
    /// Low temperature: the extraction output must be stable and structured.
    pub temperature: f64,
    pub max_tokens: u32,
    /// Discourages the model from repeating section bodies verbatim.
    pub frequency_penalty: f64,
    /// Only the most recent N conversation messages are sent to the
    /// extraction call, keeping the prompt inside token limits.
    pub history_window: usize,
    /// Prefix of every recall code (`PREFIX-YYYYMMDD-HHMMSS`). Both the
    /// gateway and the asset store validate against this single value.
    pub code_prefix: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            max_tokens: 1500,
            frequency_penalty: 0.5,
            history_window: 10,
            code_prefix: "SSY".to_string(),
        }
    }
}

/// Object-storage bucket holding rendered report images. When `base_url` is
/// unset the service falls back to an in-process store (useful for local
/// development and tests; stored images do not survive a restart).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub object_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            object_prefix: "reports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, apply environment
    /// overrides, and validate. A missing path (or `None`) yields defaults
    /// plus overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?
            }
            Some(p) => {
                return Err(ConfigError::Load(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment wins over file values. This is the only place in the
    /// crate that reads the process environment.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(ENV_API_KEY)
            && !key.is_empty()
        {
            self.provider.api_key = Some(key);
        }
        if let Ok(url) = std::env::var(ENV_API_URL)
            && !url.is_empty()
        {
            self.provider.api_url = url;
        }
        if let Ok(url) = std::env::var(ENV_STORAGE_URL)
            && !url.is_empty()
        {
            self.storage.base_url = Some(url);
        }
        if let Ok(key) = std::env::var(ENV_STORAGE_KEY)
            && !key.is_empty()
        {
            self.storage.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::Validation(format!(
                "chat.temperature {} out of range 0.0..=2.0",
                self.chat.temperature
            )));
        }
        if !(0.0..=2.0).contains(&self.report.temperature) {
            return Err(ConfigError::Validation(format!(
                "report.temperature {} out of range 0.0..=2.0",
                self.report.temperature
            )));
        }
        if self.report.history_window == 0 {
            return Err(ConfigError::Validation(
                "report.history_window must be at least 1".to_string(),
            ));
        }
        let prefix = &self.report.code_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "report.code_prefix {prefix:?} must be non-empty uppercase ASCII"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.report.code_prefix, "SSY");
        assert_eq!(config.report.history_window, 10);
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        writeln!(
            file,
            "[report]\ncode_prefix = \"EMV\"\nhistory_window = 15\n\n[gateway]\nport = 9000"
        )
        .expect("write config");

        let config = Config::load(Some(file.path())).expect("config should load");
        assert_eq!(config.report.code_prefix, "EMV");
        assert_eq!(config.report.history_window, 15);
        assert_eq!(config.gateway.port, 9000);
        // Untouched sections keep their defaults.
        assert_eq!(config.chat.model, "gpt-4o");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/recallkey.toml")))
            .expect_err("missing file should fail");
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn rejects_empty_code_prefix() {
        let mut config = Config::default();
        config.report.code_prefix = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_lowercase_code_prefix() {
        let mut config = Config::default();
        config.report.code_prefix = "ssy".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.report.temperature = 3.5;
        assert!(config.validate().is_err());
    }
}
