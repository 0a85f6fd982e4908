//! Application configuration.
//!
//! Loaded from a TOML file; every section is optional and falls back to its
//! defaults, so a missing file yields a usable (if empty) configuration.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use omnisearch_fanout::capabilities;
use omnisearch_fanout::{FanoutConfig, ProviderCapability};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Top-level configuration for the omnisearch host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Timeout and retry settings for provider calls.
    pub fanout: FanoutConfig,
    /// Connected (or deliberately disabled) provider endpoints, in dispatch order.
    pub providers: Vec<ProviderConfig>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// One provider search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, e.g. `google`.
    pub integration: String,
    /// Service within the provider, e.g. `gmail`.
    pub service: String,
    /// Result limit; defaults to the catalogued limit for the capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Search endpoint URL. Queried as `GET {endpoint}?q=..&limit=..`.
    pub endpoint: String,
    /// Environment variable holding the bearer token, if the endpoint needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    /// Disabled providers stay in the registry but are never dispatched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Create an enabled provider entry without a token.
    pub fn new(
        integration: impl Into<String>,
        service: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            integration: integration.into(),
            service: service.into(),
            limit: None,
            endpoint: endpoint.into(),
            token_env: None,
            enabled: true,
        }
    }

    /// The capability this entry configures.
    pub fn capability(&self) -> ProviderCapability {
        ProviderCapability::new(&self.integration, &self.service)
    }

    /// Configured limit, or the catalogued default.
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or_else(|| capabilities::default_limit(&self.capability()))
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            AppError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` (or [`AppConfig::default_config_path`]), returning
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or validated.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path(),
        };
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_file(&path)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/omnisearch/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| std::env::temp_dir().join("omnisearch-config"))
            .join("omnisearch")
            .join("config.toml")
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            return Err(AppError::Config("logging.level must not be empty".into()));
        }
        self.fanout.validate()?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            let key = provider.capability().key();
            if provider.integration.is_empty() || provider.service.is_empty() {
                return Err(AppError::Config(format!(
                    "provider '{key}' must name both integration and service"
                )));
            }
            if !seen.insert(key.clone()) {
                return Err(AppError::Config(format!("duplicate provider '{key}'")));
            }
            if provider.limit == Some(0) {
                return Err(AppError::Config(format!(
                    "provider '{key}' limit must be greater than 0"
                )));
            }
            let url = url::Url::parse(&provider.endpoint).map_err(|e| {
                AppError::Config(format!(
                    "provider '{key}' endpoint '{}' is not a valid URL: {e}",
                    provider.endpoint
                ))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::Config(format!(
                    "provider '{key}' endpoint must use http or https"
                )));
            }
        }
        Ok(())
    }
}
