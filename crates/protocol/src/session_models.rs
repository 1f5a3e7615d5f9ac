//! Per-session user input and read-only pipeline snapshots.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::stage_models::{Stage, StageRecord, StageStatus};

/// Free-form input collected from the user.
///
/// Both fields may be edited at any time; they are read when a stage that
/// consumes them begins.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct UserInput {
    /// Figma frame URL consumed by design extraction.
    pub design_url: String,

    /// Optional description consumed by feature representation.
    pub feature_description: String,
}

/// Which user input field changed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    DesignUrl,
    FeatureDescription,
}

impl InputField {
    /// The first stage that consumes this input.
    ///
    /// Changing the input invalidates this stage and everything after it.
    pub fn consumer(self) -> Stage {
        match self {
            InputField::DesignUrl => Stage::DesignExtraction,
            InputField::FeatureDescription => Stage::FeatureRepresentation,
        }
    }
}

/// What a UI needs to render one stage.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct StageView {
    pub stage: Stage,

    /// Effective status: `Waiting` when the stage has not run and its
    /// upstream is not `Ready`.
    pub status: StageStatus,

    /// Whether `begin` would currently be accepted.
    pub can_begin: bool,

    /// The stored record.
    pub record: StageRecord,
}

/// Read-only copy of the whole session state.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct PipelineSnapshot {
    /// One view per stage, in pipeline order.
    pub stages: Vec<StageView>,

    /// Current user input.
    pub input: UserInput,

    /// Last input validation error, cleared on the next accepted begin.
    pub input_error: Option<String>,
}

impl PipelineSnapshot {
    /// The view for a single stage.
    pub fn stage(&self, stage: Stage) -> &StageView {
        &self.stages[stage.index()]
    }

    /// Whether the final artifact is available.
    pub fn is_complete(&self) -> bool {
        self.stage(Stage::Completion).status == StageStatus::Ready
    }
}
