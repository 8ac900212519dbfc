//! Environment overrides for the remote catalog API.

use crate::config::AppConfig;

/// Used when neither the environment nor catalog.toml names a backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Environment variable that overrides `[api].base_url`.
pub const API_URL_VAR: &str = "CATALOG_API_URL";

/// Environment variable that overrides the settings file location.
pub const CONFIG_PATH_VAR: &str = "CATALOG_CONFIG";

/// Gets the API base URL from the environment, if set and non-empty.
#[must_use]
pub fn get_api_url_override() -> Option<String> {
    std::env::var(API_URL_VAR)
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Applies an optional base URL override, trimming any trailing slash.
pub fn apply_api_url_override(config: &mut AppConfig, url: Option<String>) {
    if let Some(url) = url {
        config.api.base_url = url;
    }
    let trimmed = config.api.base_url.trim_end_matches('/').len();
    config.api.base_url.truncate(trimmed);
}
