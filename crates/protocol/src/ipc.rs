//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between a user interface (TUI or CLI) and the core session loop.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: commands sent from the UI to the core
//! - `Event`: state changes sent from the core to the UI
//!
//! Communication is channel-based, so the UI stays responsive while stage
//! requests are outstanding.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

use crate::artifact_models::ArtifactKind;
use crate::config_models::Credentials;
use crate::payload_models::StagePayload;
use crate::session_models::{InputField, PipelineSnapshot};
use crate::stage_models::{Stage, StageStatus};

/// Operations sent from the UI to the core.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "beginStage",
///   "payload": { "stage": "PLAN_GENERATION" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Replace one of the user input fields.
    SetInput { field: InputField, value: String },

    /// Begin a pipeline stage.
    ///
    /// Ignored (with a `StageRejected` event) when the stage's gate is closed.
    BeginStage { stage: Stage },

    /// Download an artifact into a directory (the configured one if `None`).
    Download {
        artifact: ArtifactKind,
        dest_dir: Option<PathBuf>,
    },

    /// Persist credentials locally and push them to the backend.
    SaveCredentials { credentials: Credentials },

    /// Upload Gherkin feature files for end-to-end code generation.
    UploadSpecs { files: Vec<PathBuf> },

    /// Generate end-to-end test code from the uploaded feature files.
    GenerateCode,

    /// Request a full snapshot of the session state.
    GetSnapshot,

    /// Shut down the session loop.
    Shutdown,
}

/// Events sent from the core to the UI.
///
/// ```json
/// {
///   "type": "stageFailed",
///   "payload": { "stage": "CASE_GENERATION", "error": "boom" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A stage's stored status changed.
    StageStatusUpdate { stage: Stage, status: StageStatus },

    /// A stage succeeded; `payload` is now cached for preview.
    StageCompleted { stage: Stage, payload: StagePayload },

    /// A stage's attempt failed.
    StageFailed { stage: Stage, error: String },

    /// A stage was reset to `Idle` because an input it consumed changed.
    StageInvalidated { stage: Stage },

    /// A begin request was not accepted; nothing was sent to the backend.
    StageRejected { stage: Stage, reason: String },

    /// User input failed validation before any request was made.
    InputRejected { message: String },

    /// Full session state, in response to `GetSnapshot`.
    Snapshot { snapshot: PipelineSnapshot },

    /// An artifact was written to disk.
    ArtifactSaved { artifact: ArtifactKind, path: PathBuf },

    /// An artifact could not be downloaded.
    ArtifactFailed { artifact: ArtifactKind, error: String },

    /// Credentials were stored and accepted by the backend.
    CredentialsSaved,

    /// Credentials could not be saved.
    CredentialsFailed { error: String },

    /// Progress of the end-to-end automation flow.
    AutomationUpdate {
        status: StageStatus,
        message: Option<String>,
    },
}
