//! Downloadable artifacts served by the backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::stage_models::Stage;

/// A file the backend can serve for download.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Raw extracted design data.
    DesignJson,
    /// Generated feature representation.
    FeatureJson,
    /// Test plan as JSON.
    PlanJson,
    /// Test plan rendered as Markdown.
    PlanMarkdown,
    /// Test cases as JSON.
    CasesJson,
    /// Test cases rendered as Markdown.
    CasesMarkdown,
    /// Zip of Gherkin feature files, one per objective.
    FeatureArchive,
    /// Zip of generated end-to-end test code.
    CodeArchive,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 8] = [
        ArtifactKind::DesignJson,
        ArtifactKind::FeatureJson,
        ArtifactKind::PlanJson,
        ArtifactKind::PlanMarkdown,
        ArtifactKind::CasesJson,
        ArtifactKind::CasesMarkdown,
        ArtifactKind::FeatureArchive,
        ArtifactKind::CodeArchive,
    ];

    /// Backend path serving this artifact.
    pub fn path(self) -> &'static str {
        match self {
            ArtifactKind::DesignJson => "/data/figma",
            ArtifactKind::FeatureJson => "/data/feature",
            ArtifactKind::PlanJson => "/data/plan",
            ArtifactKind::PlanMarkdown => "/data/plan/markdown",
            ArtifactKind::CasesJson => "/data/cases",
            ArtifactKind::CasesMarkdown => "/data/cases/markdown",
            ArtifactKind::FeatureArchive => "/data/cases/feature",
            ArtifactKind::CodeArchive => "/data/code/py",
        }
    }

    /// The pipeline stage that must be `Ready` before this artifact exists.
    ///
    /// `None` for the code archive, which belongs to the automation flow.
    pub fn required_stage(self) -> Option<Stage> {
        match self {
            ArtifactKind::DesignJson => Some(Stage::DesignExtraction),
            ArtifactKind::FeatureJson => Some(Stage::FeatureRepresentation),
            ArtifactKind::PlanJson | ArtifactKind::PlanMarkdown => Some(Stage::PlanGeneration),
            ArtifactKind::CasesJson | ArtifactKind::CasesMarkdown => Some(Stage::CaseGeneration),
            ArtifactKind::FeatureArchive => Some(Stage::Completion),
            ArtifactKind::CodeArchive => None,
        }
    }

    /// File name used when saving the artifact.
    ///
    /// Design and feature downloads embed the Figma file key when known.
    /// Only `[A-Za-z0-9_-]` characters of the key are kept.
    pub fn file_name(self, file_key: Option<&str>) -> String {
        match self {
            ArtifactKind::DesignJson => {
                format!("figma-data-{}.json", key_segment(file_key, "unknown"))
            }
            ArtifactKind::FeatureJson => {
                format!("feature-data-{}.json", key_segment(file_key, "generated"))
            }
            ArtifactKind::PlanJson => "test-plan.json".to_string(),
            ArtifactKind::PlanMarkdown => "test-plan.md".to_string(),
            ArtifactKind::CasesJson => "test-cases.json".to_string(),
            ArtifactKind::CasesMarkdown => "test-cases.md".to_string(),
            ArtifactKind::FeatureArchive => "test-cases.zip".to_string(),
            ArtifactKind::CodeArchive => "e2e-test-code.zip".to_string(),
        }
    }

    /// Name accepted on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            ArtifactKind::DesignJson => "design",
            ArtifactKind::FeatureJson => "feature",
            ArtifactKind::PlanJson => "plan",
            ArtifactKind::PlanMarkdown => "plan-md",
            ArtifactKind::CasesJson => "cases",
            ArtifactKind::CasesMarkdown => "cases-md",
            ArtifactKind::FeatureArchive => "features",
            ArtifactKind::CodeArchive => "code",
        }
    }
}

fn key_segment(file_key: Option<&str>, default: &str) -> String {
    let key: String = file_key
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    if key.is_empty() {
        default.to_string()
    } else {
        key
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.short_name() == needle)
            .ok_or_else(|| {
                let names: Vec<&str> = ArtifactKind::ALL.iter().map(|k| k.short_name()).collect();
                format!("unknown artifact '{s}', expected one of: {}", names.join(", "))
            })
    }
}
