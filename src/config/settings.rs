//! Application settings loading from catalog.toml
//!
//! Every key has a default, so a missing file or a partial one is fine. A file
//! that exists but does not parse is a configuration error.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "catalog.toml";

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote catalog API settings
    pub api: ApiSettings,
    /// Catalog presentation defaults
    pub catalog: CatalogSettings,
}

/// `[api]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the backend, without the `/api/v1` suffix
    pub base_url: String,
    /// Upper bound for any single remote call
    pub request_timeout_secs: u64,
}

impl ApiSettings {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: super::api::DEFAULT_API_URL.to_string(),
            request_timeout_secs: 15,
        }
    }
}

/// `[catalog]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Category for groups the backend sends without a sales group
    pub default_category: String,
    /// Material label shown for every group
    pub material: String,
    /// Groups whose total stock is under this are flagged as low
    pub low_stock_threshold: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_category: "Otros".to_string(),
            material: "Acero inoxidable 316L".to_string(),
            low_stock_threshold: 10,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Loads settings from `path` if it exists, defaults otherwise.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_config(path_ref)
    } else {
        tracing::info!(
            "No config file at {}, using defaults",
            path_ref.display()
        );
        Ok(AppConfig::default())
    }
}
