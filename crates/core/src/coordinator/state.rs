//! Pipeline state and its transitions.
//!
//! [`PipelineState`] owns every stage record and the user input of one
//! session. All transitions are synchronous reducers; the async
//! [`Coordinator`](super::Coordinator) wraps them with locking, request
//! dispatch and event emission.

use chrono::Utc;
use cq_protocol::{
    InputField, PipelineSnapshot, Stage, StagePayload, StageRecord, StageStatus, StageView,
    UserInput,
};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::validate_design_url;

/// Why a begin request was not accepted.
///
/// A rejected begin changes no stage status and issues no request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeginRejection {
    #[error("{stage} cannot begin until {upstream} is ready")]
    UpstreamNotReady { stage: Stage, upstream: Stage },

    #[error("{0} is already in progress")]
    AlreadyInProgress(Stage),

    #[error("{running} is in progress; wait for it to finish")]
    SessionBusy { running: Stage },

    #[error("{0}")]
    InvalidInput(String),
}

/// Session state: one record per stage plus the user input.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    records: [StageRecord; 5],
    input: UserInput,
    input_error: Option<String>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-filled input, every stage `Idle`.
    pub fn with_input(input: UserInput) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    pub fn record(&self, stage: Stage) -> &StageRecord {
        &self.records[stage.index()]
    }

    fn record_mut(&mut self, stage: Stage) -> &mut StageRecord {
        &mut self.records[stage.index()]
    }

    pub fn input(&self) -> &UserInput {
        &self.input
    }

    pub fn input_error(&self) -> Option<&str> {
        self.input_error.as_deref()
    }

    /// Stored status of `stage`.
    pub fn status(&self, stage: Stage) -> StageStatus {
        self.record(stage).status
    }

    /// Status as shown to the user.
    ///
    /// A stage that has not run reports `Waiting` while its upstream is not
    /// `Ready`.
    pub fn effective_status(&self, stage: Stage) -> StageStatus {
        match self.status(stage) {
            StageStatus::Idle if !self.gate_open(stage) => StageStatus::Waiting,
            status => status,
        }
    }

    /// Whether the direct upstream of `stage` is `Ready`.
    pub fn gate_open(&self, stage: Stage) -> bool {
        stage
            .upstream()
            .is_none_or(|upstream| self.status(upstream) == StageStatus::Ready)
    }

    /// The stage with an outstanding request, if any.
    pub fn in_flight(&self) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| self.status(*stage).is_in_progress())
    }

    /// Whether [`begin`](Self::begin) would be accepted, ignoring input
    /// validation.
    pub fn can_begin(&self, stage: Stage) -> bool {
        self.gate_open(stage) && self.in_flight().is_none()
    }

    /// Move `stage` to `InProgress` and return the new attempt id.
    pub fn begin(&mut self, stage: Stage) -> Result<Uuid, BeginRejection> {
        if self.status(stage).is_in_progress() {
            return Err(BeginRejection::AlreadyInProgress(stage));
        }
        if let Some(upstream) = stage.upstream() {
            if self.status(upstream) != StageStatus::Ready {
                return Err(BeginRejection::UpstreamNotReady { stage, upstream });
            }
        }
        if let Some(running) = self.in_flight() {
            return Err(BeginRejection::SessionBusy { running });
        }
        if stage == Stage::DesignExtraction {
            if let Err(message) = validate_design_url(&self.input.design_url) {
                self.input_error = Some(message.clone());
                return Err(BeginRejection::InvalidInput(message));
            }
        }

        self.input_error = None;
        let attempt = Uuid::new_v4();
        let record = self.record_mut(stage);
        record.status = StageStatus::InProgress;
        record.error = None;
        record.attempt = Some(attempt);
        record.started_at = Some(Utc::now());
        record.finished_at = None;
        Ok(attempt)
    }

    /// Whether `attempt` is the outstanding request of `stage`.
    pub fn is_current(&self, stage: Stage, attempt: Uuid) -> bool {
        let record = self.record(stage);
        record.status.is_in_progress() && record.attempt == Some(attempt)
    }

    /// Record a successful attempt. Returns `false` for a stale attempt.
    pub fn complete(&mut self, stage: Stage, attempt: Uuid, payload: StagePayload) -> bool {
        if !self.is_current(stage, attempt) {
            return false;
        }
        let record = self.record_mut(stage);
        record.status = StageStatus::Ready;
        record.error = None;
        record.payload = Some(payload);
        record.attempt = None;
        record.finished_at = Some(Utc::now());
        true
    }

    /// Record a failed attempt. Returns `false` for a stale attempt.
    ///
    /// The previously cached payload is kept, but downstream gates close
    /// because the stage is no longer `Ready`.
    pub fn fail(&mut self, stage: Stage, attempt: Uuid, message: impl Into<String>) -> bool {
        if !self.is_current(stage, attempt) {
            return false;
        }
        let record = self.record_mut(stage);
        record.status = StageStatus::Failed;
        record.error = Some(message.into());
        record.attempt = None;
        record.finished_at = Some(Utc::now());
        true
    }

    /// Replace one input field. Returns the stages that were reset.
    pub fn set_input(&mut self, field: InputField, value: impl Into<String>) -> Vec<Stage> {
        let mut input = self.input.clone();
        match field {
            InputField::DesignUrl => input.design_url = value.into(),
            InputField::FeatureDescription => input.feature_description = value.into(),
        }
        self.reset_on_input_change(input)
    }

    /// Adopt `input`, resetting every stage that consumed a changed field
    /// and everything downstream of it.
    ///
    /// Reset stages return to `Idle` with no payload or error; an
    /// outstanding attempt is revoked, so its result is discarded. Returns
    /// the stages that held any state before the reset, in pipeline order.
    pub fn reset_on_input_change(&mut self, input: UserInput) -> Vec<Stage> {
        let first = if input.design_url != self.input.design_url {
            self.input_error = None;
            Some(InputField::DesignUrl.consumer())
        } else if input.feature_description != self.input.feature_description {
            Some(InputField::FeatureDescription.consumer())
        } else {
            None
        };
        self.input = input;

        let Some(first) = first else {
            return Vec::new();
        };

        let mut reset = Vec::new();
        for stage in first.and_downstream() {
            let record = self.record_mut(stage);
            let touched = record.status != StageStatus::Idle
                || record.payload.is_some()
                || record.error.is_some();
            *record = StageRecord::default();
            if touched {
                reset.push(stage);
            }
        }
        reset
    }

    /// Read-only copy for the UIs.
    pub fn snapshot(&self) -> PipelineSnapshot {
        let stages = Stage::ALL
            .into_iter()
            .map(|stage| StageView {
                stage,
                status: self.effective_status(stage),
                can_begin: self.can_begin(stage),
                record: self.record(stage).clone(),
            })
            .collect();

        PipelineSnapshot {
            stages,
            input: self.input.clone(),
            input_error: self.input_error.clone(),
        }
    }
}
