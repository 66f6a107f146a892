use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SakilaError};

/// Top-level configuration for the Sakila chat front-end.
///
/// Loaded from `~/.sakila/config.toml` by default. Every section falls back to
/// its defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SakilaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl SakilaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SakilaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SakilaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Location of the remote question-answering service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Full URL of the `ask` endpoint.
    pub endpoint: String,
    /// Request timeout in seconds. Zero disables the timeout.
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// The request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/ask".to_string(),
            timeout_secs: 60,
        }
    }
}

/// User-facing strings written into the transcript on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Shown when the service cannot be reached or answers malformed data.
    pub transport_failure_text: String,
    /// Shown when the service reports a failure without a message.
    pub no_answer_text: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            transport_failure_text: "The answering service could not be reached.".to_string(),
            no_answer_text: "No response".to_string(),
        }
    }
}

/// Same-origin relay server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Port the relay binds on 127.0.0.1.
    pub port: u16,
    /// Route that accepts questions.
    pub route: String,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            route: "/api/film".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = SakilaConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.service.endpoint, "http://127.0.0.1:8000/ask");
        assert_eq!(config.service.timeout_secs, 60);
        assert_eq!(config.chat.no_answer_text, "No response");
        assert_eq!(
            config.chat.transport_failure_text,
            "The answering service could not be reached."
        );
        assert_eq!(config.relay.port, 3000);
        assert_eq!(config.relay.route, "/api/film");
        assert_eq!(config.relay.allowed_origins.len(), 2);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[service]
endpoint = "http://films.internal:9000/ask"
"#;
        let file = create_temp_config(content);
        let config = SakilaConfig::load(file.path()).unwrap();
        assert_eq!(config.service.endpoint, "http://films.internal:9000/ask");
        // Remaining fields use defaults
        assert_eq!(config.service.timeout_secs, 60);
        assert_eq!(config.relay.port, 3000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = SakilaConfig::load(file.path()).unwrap();
        assert_eq!(config.chat.no_answer_text, "No response");
        assert_eq!(config.relay.route, "/api/film");
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = SakilaConfig::load(file.path());
        assert!(matches!(result, Err(SakilaError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SakilaConfig::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(config.service.endpoint, "http://127.0.0.1:8000/ask");
    }

    #[test]
    fn test_config_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = SakilaConfig::default();
        config.chat.no_answer_text = "Nothing came back".to_string();
        config.relay.port = 4100;
        config.save(&path).unwrap();

        let reloaded = SakilaConfig::load(&path).unwrap();
        assert_eq!(reloaded.chat.no_answer_text, "Nothing came back");
        assert_eq!(reloaded.relay.port, 4100);
    }

    #[test]
    fn test_service_timeout() {
        let mut service = ServiceConfig::default();
        assert_eq!(service.timeout(), Some(Duration::from_secs(60)));
        service.timeout_secs = 0;
        assert_eq!(service.timeout(), None);
    }
}
