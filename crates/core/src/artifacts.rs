//! Artifact downloads.
//!
//! Artifacts are only offered once the stage that produces them is `Ready`.
//! Documents the coordinator already holds (design data, test plan, test
//! cases, feature archive) are written from the cache; everything else is
//! fetched from the backend and written verbatim.

use cq_protocol::{ArtifactKind, DesignDocument, Stage, StagePayload, StageStatus};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::coordinator::Coordinator;
use crate::service::StageService;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("{artifact} is not available until {stage} is ready")]
    NotReady { artifact: ArtifactKind, stage: Stage },

    #[error("{message}")]
    Download {
        artifact: ArtifactKind,
        message: String,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Message shown when a download fails without a backend detail.
pub fn download_fallback(artifact: ArtifactKind) -> &'static str {
    match artifact {
        ArtifactKind::DesignJson => "Failed to download Figma data",
        ArtifactKind::FeatureJson => "Failed to download feature data",
        ArtifactKind::PlanJson | ArtifactKind::PlanMarkdown => "Failed to download test plan",
        ArtifactKind::CasesJson | ArtifactKind::CasesMarkdown => "Failed to download test cases",
        ArtifactKind::FeatureArchive => "Failed to download feature files",
        ArtifactKind::CodeArchive => "Failed to download code zip",
    }
}

/// A downloaded artifact held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fetch a pipeline artifact, refusing while its stage is not `Ready`.
pub async fn fetch_artifact(
    coordinator: &Coordinator,
    artifact: ArtifactKind,
) -> ArtifactResult<Artifact> {
    let snapshot = coordinator.snapshot().await;
    let file_key = snapshot
        .stage(Stage::DesignExtraction)
        .record
        .payload
        .as_ref()
        .and_then(|payload| payload.view::<DesignDocument>())
        .map(|design| design.file_key);
    let file_name = artifact.file_name(file_key.as_deref());

    let Some(stage) = artifact.required_stage() else {
        return download(coordinator.service().as_ref(), artifact, file_name).await;
    };

    let view = snapshot.stage(stage);
    if view.status != StageStatus::Ready {
        return Err(ArtifactError::NotReady { artifact, stage });
    }

    if let Some(bytes) = cached_bytes(artifact, view.record.payload.as_ref()) {
        return Ok(Artifact {
            kind: artifact,
            file_name,
            bytes,
        });
    }
    download(coordinator.service().as_ref(), artifact, file_name).await
}

/// The cached payload of the owning stage, when it is this artifact.
fn cached_bytes(artifact: ArtifactKind, payload: Option<&StagePayload>) -> Option<Vec<u8>> {
    match (artifact, payload?) {
        (
            ArtifactKind::DesignJson | ArtifactKind::PlanJson | ArtifactKind::CasesJson,
            StagePayload::Json(value),
        ) => serde_json::to_vec_pretty(value).ok(),
        (ArtifactKind::FeatureArchive, StagePayload::Archive { bytes, .. }) => Some(bytes.clone()),
        _ => None,
    }
}

/// Fetch an artifact from the backend without any gate check.
pub async fn download(
    service: &dyn StageService,
    artifact: ArtifactKind,
    file_name: String,
) -> ArtifactResult<Artifact> {
    let bytes = service
        .download(artifact)
        .await
        .map_err(|e| ArtifactError::Download {
            artifact,
            message: e.user_message(download_fallback(artifact)),
        })?;
    Ok(Artifact {
        kind: artifact,
        file_name,
        bytes,
    })
}

/// Write `artifact` into `dest_dir`, creating the directory if needed.
pub async fn save_artifact(artifact: &Artifact, dest_dir: &Path) -> ArtifactResult<PathBuf> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(|source| ArtifactError::Write {
            path: dest_dir.to_path_buf(),
            source,
        })?;

    let path = dest_dir.join(&artifact.file_name);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .map_err(|source| ArtifactError::Write {
            path: path.clone(),
            source,
        })?;

    info!(artifact = %artifact.kind, path = %path.display(), "artifact saved");
    Ok(path)
}
