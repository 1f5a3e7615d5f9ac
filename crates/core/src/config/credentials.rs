//! Per-user credential store.
//!
//! Holds the Figma access token and the Gemini API key in
//! `<config dir>/coveriq/credentials.toml`. The file is rewritten as a
//! whole on every save; concurrent writers race and the last one wins.

use crate::config::error::{ConfigError, ConfigResult};
use cq_protocol::config_models::Credentials;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store under the platform's config directory, if there is one.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("coveriq").join("credentials.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read stored credentials. A missing file yields empty credentials.
    pub fn load(&self) -> ConfigResult<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| {
            ConfigError::FileRead {
                path: self.path.clone(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the store with `credentials`.
    pub fn save(&self, credentials: &Credentials) -> ConfigResult<()> {
        let content =
            toml::to_string(credentials).map_err(|source| ConfigError::TomlSerialize {
                path: self.path.clone(),
                source,
            })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| ConfigError::FileWrite {
            path: self.path.clone(),
            source,
        })
    }
}
