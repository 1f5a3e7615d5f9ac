//! Configuration models for `.coveriq/config.toml` and the credential store.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Generous default: plan and case generation call a language model.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Project-wide settings from `.coveriq/config.toml`.
///
/// # Example
///
/// ```toml
/// # .coveriq/config.toml
/// backend-url = "http://localhost:8000"
/// request-timeout-secs = 120
/// download-dir = "artifacts"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Base URL of the backend service.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Upper bound for a single stage, in seconds.
    ///
    /// A stage whose requests do not resolve in time is marked failed.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory downloaded artifacts are written to.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            download_dir: default_download_dir(),
        }
    }
}

/// External-service credentials cached between sessions.
///
/// Persisted under the same fixed key names the web client used, and sent
/// to the backend's `/update-env` endpoint on save.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct Credentials {
    /// Figma personal access token.
    #[serde(rename = "FIGMA_ACCESS_TOKEN", default)]
    pub design_token: String,

    /// Gemini API key used for generation.
    #[serde(rename = "GEMINI_API_KEY", default)]
    pub llm_key: String,
}

impl Credentials {
    /// Whether both credentials are present.
    pub fn is_complete(&self) -> bool {
        !self.design_token.trim().is_empty() && !self.llm_key.trim().is_empty()
    }
}
