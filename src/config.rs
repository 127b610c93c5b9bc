//! Configuration file for the sitesearch host.
//!
//! One TOML file holds the engine limits, both provider endpoints and the
//! tenant list:
//!
//! ```toml
//! news_items_path = "/var/lib/sitesearch/news.json"
//!
//! [engine]
//! default_per_page = 20
//! request_deadline_ms = 8000
//!
//! [web_api]
//! endpoint = "https://api.bing.microsoft.com/v7.0/search"
//! api_key_header = "Ocp-Apim-Subscription-Key"
//!
//! [[tenants]]
//! handle = "usagov"
//! providers = "blended"
//! excluded_urls = ["https://www.usa.gov/old-page"]
//! ```

use serde::{Deserialize, Serialize};
use sitesearch_core::{EngineConfig, HttpProviderConfig, TenantConfig};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Top-level configuration for the search host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Optional JSON file of news items used for result enrichment.
    pub news_items_path: Option<PathBuf>,
    /// Engine limits, retry and cache settings.
    pub engine: EngineConfig,
    /// Web search API connection.
    pub web_api: HttpProviderConfig,
    /// Local document index connection.
    pub local_index: HttpProviderConfig,
    /// Every tenant served by this host.
    pub tenants: Vec<TenantConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            news_items_path: None,
            engine: EngineConfig::default(),
            web_api: HttpProviderConfig {
                endpoint: "https://api.bing.microsoft.com/v7.0/search".into(),
                api_key: None,
                api_key_header: Some("Ocp-Apim-Subscription-Key".into()),
                tracking_header: Some("BingAPIs-TraceId".into()),
            },
            local_index: HttpProviderConfig {
                endpoint: "http://127.0.0.1:9200/api/v1/search".into(),
                api_key: None,
                api_key_header: None,
                tracking_header: None,
            },
            tenants: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
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

    /// Returns the default config file path: `~/.config/sitesearch/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("sitesearch").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("sitesearch")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/sitesearch-config/config.toml")
        }
    }

    /// Check the engine settings, both endpoints and every tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] naming the first problem found, or
    /// [`AppError::Search`] for invalid engine or tenant settings.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;

        for (name, provider) in [("web_api", &self.web_api), ("local_index", &self.local_index)] {
            url::Url::parse(&provider.endpoint).map_err(|e| {
                AppError::Config(format!("{name} endpoint {:?}: {e}", provider.endpoint))
            })?;
            if provider.api_key.is_some() && provider.api_key_header.is_none() {
                return Err(AppError::Config(format!(
                    "{name} has an api_key but no api_key_header"
                )));
            }
        }

        let mut seen = HashSet::new();
        for tenant in &self.tenants {
            tenant.validate()?;
            if !seen.insert(tenant.handle.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate tenant handle {:?}",
                    tenant.handle
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use sitesearch_core::ProviderSelection;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.tenants.is_empty());
        assert!(config.news_items_path.is_none());
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = AppConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = AppConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("sitesearch"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            max_attempts = 3

            [[tenants]]
            handle = "usagov"
            providers = "blended"
            "#,
        )
        .expect("parse");
        assert_eq!(config.engine.max_attempts, 3);
        assert_eq!(config.engine.default_per_page, 20);
        assert_eq!(config.tenants.len(), 1);
        assert_eq!(config.tenants[0].providers, ProviderSelection::Blended);
        assert!(config.tenants[0].active);
        assert!(config.web_api.endpoint.starts_with("https://"));
    }

    #[test]
    fn duplicate_tenants_rejected() {
        let mut config = AppConfig::default();
        config.tenants = vec![
            TenantConfig::new("nasa", ProviderSelection::WebApi),
            TenantConfig::new("nasa", ProviderSelection::LocalIndex),
        ];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate tenant handle"));
    }

    #[test]
    fn bad_endpoint_rejected() {
        let mut config = AppConfig::default();
        config.local_index.endpoint = "not a url".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("local_index endpoint"));
    }

    #[test]
    fn api_key_needs_header() {
        let mut config = AppConfig::default();
        config.local_index.api_key = Some("k".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_engine_settings_surface_as_search_errors() {
        let mut config = AppConfig::default();
        config.engine.max_attempts = 0;
        assert!(matches!(config.validate(), Err(AppError::Search(_))));
    }
}
