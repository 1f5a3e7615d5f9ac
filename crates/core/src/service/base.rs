//! Base `StageService` trait and supporting types.

use async_trait::async_trait;
use cq_protocol::{ArtifactKind, Credentials};
use serde_json::Value;
use thiserror::Error;

/// A Gherkin feature file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFile {
    /// File name sent with the multipart part.
    pub name: String,
    /// Raw file contents.
    pub contents: Vec<u8>,
}

/// A failed call to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The backend answered with a non-success status.
    ///
    /// `detail` carries the body's `detail` field when the backend sent one.
    #[error("HTTP {status}{}", .detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// The message shown to the user for this failure.
    ///
    /// A backend `detail` always wins; everything else falls back to the
    /// caller-supplied, stage-specific message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ServiceError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            ServiceError::Status { .. } => fallback.to_string(),
            ServiceError::Network(_) | ServiceError::Decode(_) => format!("{fallback} ({self})"),
        }
    }

    /// HTTP status code, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every backend call the client makes.
///
/// Generation calls take their input explicitly; callers obtain it by
/// re-fetching the authoritative upstream document first.
#[async_trait]
pub trait StageService: Send + Sync {
    /// Extract design data from a Figma URL.
    async fn extract_design(&self, design_url: &str) -> ServiceResult<Value>;

    /// Fetch the design data the backend last extracted.
    async fn fetch_design(&self) -> ServiceResult<Value>;

    /// Generate a feature representation from design data.
    async fn generate_feature(
        &self,
        design_data: &Value,
        feature_description: Option<&str>,
    ) -> ServiceResult<Value>;

    /// Fetch the last generated feature representation.
    async fn fetch_feature(&self) -> ServiceResult<Value>;

    /// Generate a test plan from a feature representation.
    async fn generate_plan(&self, feature_list: &Value) -> ServiceResult<Value>;

    /// Fetch the last generated test plan.
    async fn fetch_plan(&self) -> ServiceResult<Value>;

    /// Generate test cases from a test plan.
    async fn generate_cases(&self, test_plan: &Value) -> ServiceResult<Value>;

    /// Download an artifact as raw bytes.
    async fn download(&self, artifact: ArtifactKind) -> ServiceResult<Vec<u8>>;

    /// Upload Gherkin feature files for code generation.
    async fn upload_specs(&self, files: &[SpecFile]) -> ServiceResult<Value>;

    /// Fetch the feature files the backend holds.
    async fn fetch_specs(&self) -> ServiceResult<Value>;

    /// Generate end-to-end test code from feature text.
    async fn generate_code(&self, feature_text: &Value, llm_key: &str) -> ServiceResult<Value>;

    /// Push credentials to the backend environment.
    async fn save_credentials(&self, credentials: &Credentials) -> ServiceResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_detail() {
        let error = ServiceError::Status {
            status: 500,
            detail: Some("boom".to_string()),
        };
        assert_eq!(error.user_message("Failed to generate test plan"), "boom");
        assert_eq!(error.status(), Some(500));
    }

    #[test]
    fn test_user_message_falls_back_without_detail() {
        let error = ServiceError::Status {
            status: 502,
            detail: None,
        };
        assert_eq!(
            error.user_message("Failed to generate test plan"),
            "Failed to generate test plan"
        );

        let blank = ServiceError::Status {
            status: 400,
            detail: Some("  ".to_string()),
        };
        assert_eq!(blank.user_message("fallback"), "fallback");
    }

    #[test]
    fn test_user_message_keeps_network_cause() {
        let error = ServiceError::Network("connection refused".to_string());
        let message = error.user_message("Failed to extract Figma data");
        assert!(message.starts_with("Failed to extract Figma data"));
        assert!(message.contains("connection refused"));
        assert_eq!(error.status(), None);
    }
}
