//! Stage runners.
//!
//! Each runner performs the backend calls for one pipeline stage. Runners
//! never receive the previous stage's payload from the coordinator: a
//! stage that needs upstream data re-fetches the authoritative copy from
//! the backend first, then issues its own request.

use cq_protocol::{ArtifactKind, Stage, StagePayload, UserInput};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::service::{ServiceError, StageService};

const ACCESS_DENIED_MESSAGE: &str = "Access denied. Please check that:\n1. Your Figma access token is correct\n2. You have access to this Figma file\n3. The file is shared with you";

/// A stage attempt that did not succeed, with the message to display.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StageError {
    pub message: String,
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure recorded when a stage exceeds its time budget.
    pub fn timed_out(stage: Stage, limit: Duration) -> Self {
        Self::new(format!("{stage} timed out after {}s", limit.as_secs()))
    }

    fn from_service(error: ServiceError, fallback: &str) -> Self {
        Self::new(error.user_message(fallback))
    }
}

/// Run the backend calls for `stage` using the locked-in `input`.
///
/// Issues one request for design extraction and completion, and two
/// sequentially dependent requests (re-fetch, then generate) for the
/// stages in between.
pub async fn run_stage(
    service: &dyn StageService,
    stage: Stage,
    input: &UserInput,
) -> Result<StagePayload, StageError> {
    debug!(%stage, "running stage");
    match stage {
        Stage::DesignExtraction => extract_design(service, input).await,
        Stage::FeatureRepresentation => generate_feature(service, input).await,
        Stage::PlanGeneration => {
            let feature = service.fetch_feature().await.map_err(|e| {
                StageError::from_service(e, "Failed to fetch Figma data from server")
            })?;
            let plan = service
                .generate_plan(&feature)
                .await
                .map_err(|e| StageError::from_service(e, "Failed to generate test plan"))?;
            Ok(StagePayload::Json(plan))
        }
        Stage::CaseGeneration => {
            let plan = service.fetch_plan().await.map_err(|e| {
                StageError::from_service(e, "Failed to fetch test plan from server")
            })?;
            let cases = service
                .generate_cases(&plan)
                .await
                .map_err(|e| StageError::from_service(e, "Failed to generate test cases"))?;
            Ok(StagePayload::Json(cases))
        }
        Stage::Completion => {
            let artifact = ArtifactKind::FeatureArchive;
            let bytes = service
                .download(artifact)
                .await
                .map_err(|e| StageError::from_service(e, "Failed to download feature files"))?;
            if bytes.is_empty() {
                return Err(StageError::new("The backend returned an empty feature archive"));
            }
            Ok(StagePayload::Archive {
                file_name: artifact.file_name(None),
                bytes,
            })
        }
    }
}

async fn extract_design(
    service: &dyn StageService,
    input: &UserInput,
) -> Result<StagePayload, StageError> {
    match service.extract_design(input.design_url.trim()).await {
        Ok(document) => Ok(StagePayload::Json(document)),
        Err(error) if error.status() == Some(403) => Err(StageError::new(ACCESS_DENIED_MESSAGE)),
        Err(error) => Err(StageError::from_service(error, "Failed to extract Figma data")),
    }
}

async fn generate_feature(
    service: &dyn StageService,
    input: &UserInput,
) -> Result<StagePayload, StageError> {
    let design = service
        .fetch_design()
        .await
        .map_err(|e| StageError::from_service(e, "Failed to fetch Figma data from server"))?;

    let description = input.feature_description.trim();
    let description = (!description.is_empty()).then_some(description);

    let acknowledgement = service
        .generate_feature(&design, description)
        .await
        .map_err(|e| StageError::from_service(e, "Failed to generate feature representation"))?;
    Ok(StagePayload::Json(acknowledgement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_message() {
        let error = StageError::timed_out(Stage::PlanGeneration, Duration::from_secs(30));
        assert_eq!(error.to_string(), "Test Plan Generation timed out after 30s");
    }

    #[test]
    fn test_from_service_uses_detail() {
        let error = StageError::from_service(
            ServiceError::Status {
                status: 500,
                detail: Some("boom".to_string()),
            },
            "Failed to generate test cases",
        );
        assert_eq!(error.message, "boom");
    }
}
