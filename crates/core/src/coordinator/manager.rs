//! The async coordinator shared by every UI.
//!
//! Wraps a [`PipelineState`] behind a mutex, dispatches stage requests on
//! background tasks, and reports every transition on the event channel.

use cq_protocol::{
    Event, InputField, PipelineSnapshot, Stage, StagePayload, StageRecord, StageStatus, UserInput,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::coordinator::state::{BeginRejection, PipelineState};
use crate::engine::{run_stage, StageError};
use crate::service::StageService;

/// Handle to a dispatched stage request.
#[derive(Debug)]
pub struct StageTask {
    pub stage: Stage,
    pub attempt: Uuid,
    handle: JoinHandle<()>,
}

impl StageTask {
    /// Wait until the request has resolved and its transition is applied.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!(stage = %self.stage, error = %e, "stage task did not finish");
        }
    }
}

/// Owns the session state and drives stage requests.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct Coordinator {
    state: Arc<Mutex<PipelineState>>,
    service: Arc<dyn StageService>,
    events_tx: mpsc::Sender<Event>,
    timeout: Duration,
}

impl Coordinator {
    /// Create a coordinator with every stage `Idle`.
    ///
    /// # Arguments
    ///
    /// * `service` - Backend used by the stage runners
    /// * `events_tx` - Channel receiving every state change
    /// * `timeout` - Upper bound for a single stage attempt
    pub fn new(
        service: Arc<dyn StageService>,
        events_tx: mpsc::Sender<Event>,
        timeout: Duration,
    ) -> Self {
        Self::with_input(service, events_tx, timeout, UserInput::default())
    }

    /// Like [`new`](Self::new), starting from pre-filled input.
    pub fn with_input(
        service: Arc<dyn StageService>,
        events_tx: mpsc::Sender<Event>,
        timeout: Duration,
        input: UserInput,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(PipelineState::with_input(input))),
            service,
            events_tx,
            timeout,
        }
    }

    pub fn service(&self) -> Arc<dyn StageService> {
        Arc::clone(&self.service)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn snapshot(&self) -> PipelineSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn record(&self, stage: Stage) -> StageRecord {
        self.state.lock().await.record(stage).clone()
    }

    pub async fn input(&self) -> UserInput {
        self.state.lock().await.input().clone()
    }

    /// Replace one input field, invalidating the stages that consumed it.
    pub async fn set_input(&self, field: InputField, value: impl Into<String>) -> Vec<Stage> {
        let reset = self.state.lock().await.set_input(field, value);
        for stage in &reset {
            info!(%stage, "stage invalidated by input change");
            self.emit(Event::StageInvalidated { stage: *stage }).await;
        }
        reset
    }

    /// Adopt a whole new input, invalidating as [`set_input`](Self::set_input).
    pub async fn reset_on_input_change(&self, input: UserInput) -> Vec<Stage> {
        let reset = self.state.lock().await.reset_on_input_change(input);
        for stage in &reset {
            info!(%stage, "stage invalidated by input change");
            self.emit(Event::StageInvalidated { stage: *stage }).await;
        }
        reset
    }

    /// Begin `stage` and dispatch its request in the background.
    ///
    /// A rejected begin is reported with `StageRejected` (and
    /// `InputRejected` for invalid input) and leaves the state untouched.
    pub async fn begin_stage(&self, stage: Stage) -> Result<StageTask, BeginRejection> {
        let begun = {
            let mut state = self.state.lock().await;
            state
                .begin(stage)
                .map(|attempt| (attempt, state.input().clone()))
        };

        let (attempt, input) = match begun {
            Ok(begun) => begun,
            Err(rejection) => {
                info!(%stage, reason = %rejection, "begin rejected");
                if let BeginRejection::InvalidInput(message) = &rejection {
                    self.emit(Event::InputRejected {
                        message: message.clone(),
                    })
                    .await;
                }
                self.emit(Event::StageRejected {
                    stage,
                    reason: rejection.to_string(),
                })
                .await;
                return Err(rejection);
            }
        };

        info!(%stage, %attempt, "stage started");
        self.emit(Event::StageStatusUpdate {
            stage,
            status: StageStatus::InProgress,
        })
        .await;

        let coordinator = self.clone();
        let handle = tokio::spawn(async move {
            let limit = coordinator.timeout;
            let outcome = tokio::time::timeout(
                limit,
                run_stage(coordinator.service.as_ref(), stage, &input),
            )
            .await
            .unwrap_or_else(|_| Err(StageError::timed_out(stage, limit)));

            match outcome {
                Ok(payload) => {
                    coordinator.complete_stage(stage, attempt, payload).await;
                }
                Err(error) => {
                    coordinator.fail_stage(stage, attempt, error.message).await;
                }
            }
        });

        Ok(StageTask {
            stage,
            attempt,
            handle,
        })
    }

    /// Begin `stage` and wait for it to resolve.
    ///
    /// Returns the stage's record after the attempt.
    pub async fn run_stage(&self, stage: Stage) -> Result<StageRecord, BeginRejection> {
        self.begin_stage(stage).await?.wait().await;
        Ok(self.record(stage).await)
    }

    /// Apply a successful result. Returns `false` if it was stale.
    pub async fn complete_stage(&self, stage: Stage, attempt: Uuid, payload: StagePayload) -> bool {
        let applied = self
            .state
            .lock()
            .await
            .complete(stage, attempt, payload.clone());
        if !applied {
            warn!(%stage, %attempt, "discarding stale stage result");
            return false;
        }

        info!(%stage, bytes = payload.len(), "stage ready");
        self.emit(Event::StageStatusUpdate {
            stage,
            status: StageStatus::Ready,
        })
        .await;
        self.emit(Event::StageCompleted { stage, payload }).await;
        true
    }

    /// Apply a failure. Returns `false` if it was stale.
    pub async fn fail_stage(&self, stage: Stage, attempt: Uuid, message: impl Into<String>) -> bool {
        let message = message.into();
        let applied = self
            .state
            .lock()
            .await
            .fail(stage, attempt, message.clone());
        if !applied {
            warn!(%stage, %attempt, "discarding stale stage failure");
            return false;
        }

        warn!(%stage, error = %message, "stage failed");
        self.emit(Event::StageStatusUpdate {
            stage,
            status: StageStatus::Failed,
        })
        .await;
        self.emit(Event::StageFailed {
            stage,
            error: message,
        })
        .await;
        true
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}
