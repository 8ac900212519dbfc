/// Environment overrides for the remote catalog API
pub mod api;

/// Settings loading from catalog.toml
pub mod settings;

pub use settings::{ApiSettings, AppConfig, CatalogSettings};

use crate::errors::Result;
use tracing::info;

/// Loads the full application configuration.
///
/// Reads the settings file named by `CATALOG_CONFIG` (default `catalog.toml`),
/// falling back to defaults when it does not exist, then applies the
/// `CATALOG_API_URL` override.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(api::CONFIG_PATH_VAR)
        .unwrap_or_else(|_| settings::DEFAULT_CONFIG_PATH.to_string());
    let mut config = settings::load_config_or_default(&path)?;
    api::apply_api_url_override(&mut config, api::get_api_url_override());
    info!(
        "Catalog API at {} (timeout {}s)",
        config.api.base_url, config.api.request_timeout_secs
    );
    Ok(config)
}
