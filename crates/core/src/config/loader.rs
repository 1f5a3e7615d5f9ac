//! Configuration file loader for the `.coveriq/` directory.
//!
//! - `config.toml`: backend URL, stage timeout and download directory
//! - `COVERIQ_BACKEND_URL`: overrides `backend-url`
//! - credentials from the per-user [`CredentialStore`]

use crate::config::credentials::CredentialStore;
use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use cq_protocol::config_models::{Credentials, GlobalConfig};
use std::path::Path;

/// Name of the project configuration directory.
pub const CONFIG_DIR: &str = ".coveriq";

/// Environment variable overriding the backend URL.
pub const BACKEND_URL_ENV: &str = "COVERIQ_BACKEND_URL";

/// Loads configuration from `<root>/.coveriq/` and the user's credential
/// store.
///
/// A missing directory or file yields defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if a file exists but cannot be read or parsed, or
/// if a value is out of range.
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let store = CredentialStore::default_location();
    load_config_with(root, store.as_ref(), |key| std::env::var(key).ok()).await
}

/// Like [`load_config`], with an explicit credential store and environment.
pub async fn load_config_with(
    root: &Path,
    store: Option<&CredentialStore>,
    env: impl Fn(&str) -> Option<String>,
) -> ConfigResult<AppConfig> {
    let config_dir = root.join(CONFIG_DIR);
    let global = if config_dir.exists() {
        load_global_config(&config_dir)?
    } else {
        GlobalConfig::default()
    };
    let global = apply_overrides(global, env);
    validate(&global, &config_dir.join("config.toml"))?;

    let credentials = match store {
        Some(store) => store.load()?,
        None => Credentials::default(),
    };

    Ok(AppConfig {
        global,
        credentials,
    })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(config_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

/// Apply environment overrides on top of file settings.
pub fn apply_overrides(
    mut global: GlobalConfig,
    env: impl Fn(&str) -> Option<String>,
) -> GlobalConfig {
    if let Some(url) = env(BACKEND_URL_ENV).filter(|url| !url.trim().is_empty()) {
        global.backend_url = url.trim().to_string();
    }
    global
}

fn validate(global: &GlobalConfig, path: &Path) -> ConfigResult<()> {
    if !(global.backend_url.starts_with("http://") || global.backend_url.starts_with("https://")) {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: format!(
                "backend-url must be an http(s) URL, got '{}'",
                global.backend_url
            ),
        });
    }
    if global.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "request-timeout-secs must be greater than zero".to_string(),
        });
    }
    Ok(())
}
