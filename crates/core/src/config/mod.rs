//! Configuration loading and management.
//!
//! Settings come from `.coveriq/config.toml` under the working directory,
//! with environment overrides applied on top. Credentials live in a
//! separate per-user store (see [`credentials`]).

pub mod credentials;
pub mod error;
pub mod loader;
pub mod models;

pub use credentials::CredentialStore;
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, CONFIG_DIR};
pub use models::AppConfig;
