//! Session loop.
//!
//! Receives [`Op`]s from a UI, drives the [`Coordinator`] and the
//! automation flow, and reports results as [`Event`]s. Slow work runs on
//! spawned tasks so the loop never blocks on a request.

use cq_protocol::{ArtifactKind, Credentials, Event, Op, StageStatus};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::artifacts::{self, fetch_artifact, save_artifact, Artifact, ArtifactError};
use crate::automation::{AutomationError, E2eAutomation};
use crate::config::{AppConfig, ConfigError, CredentialStore};
use crate::coordinator::Coordinator;
use crate::service::StageService;

/// Capacity of the event channel created by [`Session::channel`].
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Reported when an upload or generation arrives while another is running.
pub const AUTOMATION_BUSY: &str = "E2E automation is already running";

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error(transparent)]
    Store(#[from] ConfigError),

    #[error("Failed to save API keys: {0}")]
    Backend(String),
}

/// Persist credentials locally, then push them to the backend.
pub async fn save_credentials(
    service: &dyn StageService,
    store: Option<&CredentialStore>,
    credentials: &Credentials,
) -> Result<(), CredentialsError> {
    if let Some(store) = store {
        store.save(credentials)?;
        debug!(path = %store.path().display(), "credentials stored");
    }
    service
        .save_credentials(credentials)
        .await
        .map_err(|e| CredentialsError::Backend(e.to_string()))?;
    info!("credentials saved");
    Ok(())
}

/// One user session: pipeline state, automation flow and credentials.
#[derive(Clone)]
pub struct Session {
    coordinator: Coordinator,
    automation: Arc<Mutex<E2eAutomation>>,
    credentials: Arc<Mutex<Credentials>>,
    store: Option<CredentialStore>,
    download_dir: PathBuf,
    events_tx: mpsc::Sender<Event>,
}

impl Session {
    /// Create the bounded event channel sessions report on.
    pub fn channel() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
        mpsc::channel(EVENT_CHANNEL_CAPACITY)
    }

    pub fn new(
        config: AppConfig,
        service: Arc<dyn StageService>,
        store: Option<CredentialStore>,
        events_tx: mpsc::Sender<Event>,
    ) -> Self {
        if !config.credentials.is_complete() {
            info!("API keys are not configured; save them before generating");
        }
        let coordinator = Coordinator::new(
            Arc::clone(&service),
            events_tx.clone(),
            config.request_timeout(),
        );
        Self {
            coordinator,
            automation: Arc::new(Mutex::new(E2eAutomation::new(service))),
            credentials: Arc::new(Mutex::new(config.credentials)),
            store,
            download_dir: config.global.download_dir,
            events_tx,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Process ops until `Shutdown` or until the sender is dropped.
    pub async fn run(self, mut op_rx: mpsc::UnboundedReceiver<Op>) {
        while let Some(op) = op_rx.recv().await {
            if !self.handle_op(op).await {
                break;
            }
        }
        debug!("session loop finished");
    }

    /// Handle one op. Returns `false` when the session should stop.
    pub async fn handle_op(&self, op: Op) -> bool {
        match op {
            Op::SetInput { field, value } => {
                self.coordinator.set_input(field, value).await;
            }
            Op::BeginStage { stage } => {
                // Rejections are reported as events by the coordinator.
                let _ = self.coordinator.begin_stage(stage).await;
            }
            Op::Download { artifact, dest_dir } => {
                let dest_dir = dest_dir.unwrap_or_else(|| self.download_dir.clone());
                let session = self.clone();
                tokio::spawn(async move { session.download(artifact, dest_dir).await });
            }
            Op::SaveCredentials { credentials } => {
                let session = self.clone();
                tokio::spawn(async move { session.save_credentials(credentials).await });
            }
            Op::UploadSpecs { files } => {
                if let Some(automation) = self.claim_automation().await {
                    let session = self.clone();
                    tokio::spawn(async move { session.upload_specs(automation, files).await });
                }
            }
            Op::GenerateCode => {
                if let Some(automation) = self.claim_automation().await {
                    let session = self.clone();
                    tokio::spawn(async move { session.generate_code(automation).await });
                }
            }
            Op::GetSnapshot => {
                let snapshot = self.coordinator.snapshot().await;
                self.emit(Event::Snapshot { snapshot }).await;
            }
            Op::Shutdown => return false,
        }
        true
    }

    async fn download(&self, artifact: ArtifactKind, dest_dir: PathBuf) {
        let fetched = if artifact == ArtifactKind::CodeArchive {
            self.download_code().await
        } else {
            fetch_artifact(&self.coordinator, artifact)
                .await
                .map_err(|e| e.to_string())
        };

        let result = match fetched {
            Ok(fetched) => save_artifact(&fetched, &dest_dir)
                .await
                .map_err(|e: ArtifactError| e.to_string()),
            Err(error) => Err(error),
        };

        match result {
            Ok(path) => self.emit(Event::ArtifactSaved { artifact, path }).await,
            Err(error) => {
                warn!(%artifact, %error, "download failed");
                self.emit(Event::ArtifactFailed { artifact, error }).await;
            }
        }
    }

    /// The automation lock is only held for the generated-code check.
    async fn download_code(&self) -> Result<Artifact, String> {
        if !self.automation.lock().await.is_generated() {
            return Err(AutomationError::NotGenerated.to_string());
        }
        let kind = ArtifactKind::CodeArchive;
        artifacts::download(self.coordinator.service().as_ref(), kind, kind.file_name(None))
            .await
            .map_err(|e| e.to_string())
    }

    async fn save_credentials(&self, credentials: Credentials) {
        let service = self.coordinator.service();
        let result = save_credentials(service.as_ref(), self.store.as_ref(), &credentials).await;
        match result {
            Ok(()) => {
                *self.credentials.lock().await = credentials;
                self.emit(Event::CredentialsSaved).await;
            }
            Err(e) => {
                warn!(error = %e, "saving credentials failed");
                self.emit(Event::CredentialsFailed {
                    error: e.to_string(),
                })
                .await;
            }
        }
    }

    /// Take the automation flow for one upload or generation.
    ///
    /// The guard is acquired before the op's task is spawned, so a second
    /// request arriving while one runs is rejected instead of queued.
    async fn claim_automation(&self) -> Option<OwnedMutexGuard<E2eAutomation>> {
        match Arc::clone(&self.automation).try_lock_owned() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("automation request rejected while another is running");
                self.emit_automation(StageStatus::InProgress, Some(AUTOMATION_BUSY.to_string()))
                    .await;
                None
            }
        }
    }

    /// The flow is released before the outcome is reported.
    async fn upload_specs(
        &self,
        mut automation: OwnedMutexGuard<E2eAutomation>,
        files: Vec<PathBuf>,
    ) {
        self.emit_automation(StageStatus::InProgress, None).await;
        let result = automation.upload(&files).await;
        let status = automation.status();
        drop(automation);

        match result {
            Ok(message) => self.emit_automation(status, Some(message)).await,
            Err(e) => {
                self.emit_automation(StageStatus::Failed, Some(e.to_string()))
                    .await
            }
        }
    }

    async fn generate_code(&self, mut automation: OwnedMutexGuard<E2eAutomation>) {
        let credentials = self.credentials.lock().await.clone();
        if !credentials.is_complete() {
            warn!("generating with incomplete API keys");
        }
        self.emit_automation(StageStatus::InProgress, None).await;
        let result = automation.generate(&credentials.llm_key).await;
        drop(automation);

        match result {
            Ok(()) => self.emit_automation(StageStatus::Ready, None).await,
            Err(e) => {
                self.emit_automation(StageStatus::Failed, Some(e.to_string()))
                    .await
            }
        }
    }

    async fn emit_automation(&self, status: StageStatus, message: Option<String>) {
        self.emit(Event::AutomationUpdate { status, message }).await;
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}
