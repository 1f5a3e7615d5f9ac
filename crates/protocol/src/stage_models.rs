//! Pipeline stage and stage status models.
//!
//! The pipeline is a fixed, totally ordered sequence of five stages. Each
//! stage only depends on its immediate predecessor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::payload_models::StagePayload;

/// One step of the test-generation pipeline.
///
/// Variants are declared in pipeline order, so the derived `Ord` matches
/// the execution order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Turn a design-tool URL into structured design data.
    DesignExtraction,
    /// Derive a normalized feature representation from the design data.
    FeatureRepresentation,
    /// Generate a structured test plan from the feature representation.
    PlanGeneration,
    /// Generate BDD-style test cases from the test plan.
    CaseGeneration,
    /// Package the test cases as executable feature files.
    Completion,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::DesignExtraction,
        Stage::FeatureRepresentation,
        Stage::PlanGeneration,
        Stage::CaseGeneration,
        Stage::Completion,
    ];

    /// Zero-based position of this stage in the pipeline.
    pub fn index(self) -> usize {
        match self {
            Stage::DesignExtraction => 0,
            Stage::FeatureRepresentation => 1,
            Stage::PlanGeneration => 2,
            Stage::CaseGeneration => 3,
            Stage::Completion => 4,
        }
    }

    /// The stage that must be `Ready` before this one may begin.
    pub fn upstream(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::ALL[i])
    }

    /// The stage unlocked when this one becomes `Ready`.
    pub fn downstream(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    /// This stage followed by every stage after it.
    pub fn and_downstream(self) -> impl Iterator<Item = Stage> {
        Stage::ALL.into_iter().skip(self.index())
    }

    /// Human-readable label used by the UIs.
    pub fn label(self) -> &'static str {
        match self {
            Stage::DesignExtraction => "Design Extraction",
            Stage::FeatureRepresentation => "Feature Representation",
            Stage::PlanGeneration => "Test Plan Generation",
            Stage::CaseGeneration => "Test Case Generation",
            Stage::Completion => "Start Testing",
        }
    }

    /// Short name accepted on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            Stage::DesignExtraction => "extract",
            Stage::FeatureRepresentation => "feature",
            Stage::PlanGeneration => "plan",
            Stage::CaseGeneration => "cases",
            Stage::Completion => "complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a stage name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl fmt::Display for UnknownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown stage '{}', expected one of: extract, feature, plan, cases, complete",
            self.0
        )
    }
}

impl std::error::Error for UnknownStage {}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.short_name() == needle)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// Lifecycle status of a single stage.
///
/// Per stage: `Idle -> InProgress -> {Ready | Failed}`, and
/// `Failed -> InProgress` on manual retry. `Waiting` is never stored; it
/// is reported for a stage that has not run while its upstream is not
/// `Ready`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    /// Not started (or invalidated by an input change).
    #[default]
    Idle,
    /// Not started and blocked on an upstream stage.
    Waiting,
    /// A request for this stage is outstanding.
    InProgress,
    /// The last attempt succeeded; the downstream gate is open.
    Ready,
    /// The last attempt failed; the stage may be retried.
    Failed,
}

impl StageStatus {
    /// Whether a request is outstanding.
    pub fn is_in_progress(self) -> bool {
        self == StageStatus::InProgress
    }
}

/// Everything the coordinator tracks for one stage.
#[derive(Serialize, Deserialize, Debug, Clone, Default, TS)]
pub struct StageRecord {
    /// Stored status. Never `Waiting`.
    pub status: StageStatus,

    /// Message of the last failure, cleared when a new attempt begins.
    pub error: Option<String>,

    /// Last successful result, kept for preview and download.
    pub payload: Option<StagePayload>,

    /// Identifier of the outstanding request, if any.
    ///
    /// Results carrying any other attempt id are discarded.
    #[ts(type = "string | null")]
    pub attempt: Option<Uuid>,

    /// When the most recent attempt began.
    pub started_at: Option<DateTime<Utc>>,

    /// When the most recent attempt resolved.
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_links() {
        assert_eq!(Stage::DesignExtraction.upstream(), None);
        assert_eq!(
            Stage::PlanGeneration.upstream(),
            Some(Stage::FeatureRepresentation)
        );
        assert_eq!(
            Stage::CaseGeneration.downstream(),
            Some(Stage::Completion)
        );
        assert_eq!(Stage::Completion.downstream(), None);
        assert!(Stage::DesignExtraction < Stage::Completion);
    }

    #[test]
    fn test_and_downstream() {
        let stages: Vec<Stage> = Stage::PlanGeneration.and_downstream().collect();
        assert_eq!(
            stages,
            vec![
                Stage::PlanGeneration,
                Stage::CaseGeneration,
                Stage::Completion
            ]
        );
    }

    #[test]
    fn test_parse_short_names() {
        for stage in Stage::ALL {
            assert_eq!(stage.short_name().parse::<Stage>(), Ok(stage));
        }
        assert_eq!("PLAN".parse::<Stage>(), Ok(Stage::PlanGeneration));
        assert!("deploy".parse::<Stage>().is_err());
    }
}
