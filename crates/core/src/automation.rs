//! End-to-end test automation flow.
//!
//! A side flow outside the five-stage pipeline: upload Gherkin feature
//! files, have the backend generate test code from them, then download the
//! code archive. It shares the [`StageStatus`] vocabulary with the pipeline.

use cq_protocol::{ArtifactKind, StageStatus};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::artifacts::{self, Artifact};
use crate::service::{SpecFile, StageService};

const UPLOADED_MESSAGE: &str = "Feature file(s) uploaded successfully.";

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Please select at least one .feature file to upload.")]
    NoFiles,

    #[error("{} is not a .feature file", .0.display())]
    NotFeatureFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    Fetch(String),

    #[error("No feature file(s) found on server. Please upload first.")]
    NoSpecsOnServer,

    #[error("{0}")]
    Generate(String),

    #[error("Generate the E2E test code before downloading it.")]
    NotGenerated,

    #[error("{0}")]
    Download(String),
}

pub type AutomationResult<T> = Result<T, AutomationError>;

/// State of the automation flow for one session.
pub struct E2eAutomation {
    service: Arc<dyn StageService>,
    status: StageStatus,
    generated: bool,
}

impl E2eAutomation {
    pub fn new(service: Arc<dyn StageService>) -> Self {
        Self {
            service,
            status: StageStatus::Idle,
            generated: false,
        }
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// Whether code has been generated for the current upload.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Upload feature files. Returns the backend's confirmation message.
    ///
    /// A new selection invalidates previously generated code.
    pub async fn upload(&mut self, files: &[PathBuf]) -> AutomationResult<String> {
        self.generated = false;
        let specs = read_specs(files).await?;

        self.status = StageStatus::InProgress;
        let result = self.service.upload_specs(&specs).await;
        match result {
            Ok(body) => {
                self.status = StageStatus::Idle;
                let message = body
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(UPLOADED_MESSAGE)
                    .to_string();
                info!(count = specs.len(), "feature files uploaded");
                Ok(message)
            }
            Err(e) => {
                self.status = StageStatus::Failed;
                Err(AutomationError::Upload(
                    e.user_message("Failed to upload .feature file(s)"),
                ))
            }
        }
    }

    /// Generate test code from the feature files held by the backend.
    pub async fn generate(&mut self, llm_key: &str) -> AutomationResult<()> {
        self.status = StageStatus::InProgress;
        let result = self.generate_inner(llm_key).await;
        match &result {
            Ok(()) => {
                self.status = StageStatus::Ready;
                self.generated = true;
                info!("E2E test code generated");
            }
            Err(_) => self.status = StageStatus::Failed,
        }
        result
    }

    async fn generate_inner(&self, llm_key: &str) -> AutomationResult<()> {
        let specs = self.service.fetch_specs().await.map_err(|e| {
            AutomationError::Fetch(
                e.user_message("Failed to fetch uploaded feature file(s) from server"),
            )
        })?;
        if is_empty_document(&specs) {
            return Err(AutomationError::NoSpecsOnServer);
        }

        self.service
            .generate_code(&specs, llm_key)
            .await
            .map_err(|e| AutomationError::Generate(e.user_message("Failed to generate E2E testing code")))?;
        Ok(())
    }

    /// Fetch the generated code archive.
    pub async fn download(&self) -> AutomationResult<Artifact> {
        if !self.generated {
            return Err(AutomationError::NotGenerated);
        }
        let kind = ArtifactKind::CodeArchive;
        artifacts::download(self.service.as_ref(), kind, kind.file_name(None))
            .await
            .map_err(|e| AutomationError::Download(e.to_string()))
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn is_feature_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("feature")
}

async fn read_specs(files: &[PathBuf]) -> AutomationResult<Vec<SpecFile>> {
    if files.is_empty() {
        return Err(AutomationError::NoFiles);
    }

    let mut specs = Vec::with_capacity(files.len());
    for path in files {
        if !is_feature_file(path) {
            return Err(AutomationError::NotFeatureFile(path.clone()));
        }
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| AutomationError::Read {
                path: path.clone(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        specs.push(SpecFile { name, contents });
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty_document() {
        assert!(is_empty_document(&Value::Null));
        assert!(is_empty_document(&json!({})));
        assert!(is_empty_document(&json!([])));
        assert!(!is_empty_document(&json!({ "login.feature": "Feature: Login" })));
    }

    #[test]
    fn test_is_feature_file() {
        assert!(is_feature_file(Path::new("specs/login.feature")));
        assert!(!is_feature_file(Path::new("specs/login.feature.bak")));
        assert!(!is_feature_file(Path::new("README.md")));
    }

    #[tokio::test]
    async fn test_read_specs_rejects_empty_selection() {
        let result = read_specs(&[]).await;
        assert!(matches!(result, Err(AutomationError::NoFiles)));
        assert_eq!(
            AutomationError::NoFiles.to_string(),
            "Please select at least one .feature file to upload."
        );
    }

    #[tokio::test]
    async fn test_read_specs_uses_file_names() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("checkout.feature");
        std::fs::write(&path, "Feature: Checkout").expect("write feature");

        let specs = read_specs(&[path]).await.expect("read specs");
        assert_eq!(specs[0].name, "checkout.feature");
        assert_eq!(specs[0].contents, b"Feature: Checkout");
    }
}
