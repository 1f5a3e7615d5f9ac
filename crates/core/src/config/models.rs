//! Aggregated runtime configuration.

use cq_protocol::config_models::{Credentials, GlobalConfig};
use std::time::Duration;

/// Everything a session needs to start.
///
/// # Example
///
/// ```rust,no_run
/// use cq_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Backend: {}", config.global.backend_url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `config.toml` after environment overrides.
    pub global: GlobalConfig,

    /// Credentials from the per-user store.
    pub credentials: Credentials,
}

impl AppConfig {
    /// Upper bound for a single stage attempt.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.global.request_timeout_secs)
    }
}
