//! Stage payloads and typed views over them.
//!
//! The coordinator caches each stage's successful result as a
//! [`StagePayload`]. The typed views in this module are read-only
//! projections used for previews; they never replace the raw JSON. Object
//! keys keep the backend's order, so a download of a cached payload lists
//! objectives and fields in the order they were received.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use ts_rs::TS;

/// The cached result of a successful stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum StagePayload {
    /// A structured JSON document (design data, feature acknowledgement,
    /// test plan, or test cases).
    Json(Value),

    /// A binary archive ready to be saved to disk.
    Archive {
        /// Suggested file name for the archive.
        file_name: String,
        /// Raw archive bytes.
        bytes: Vec<u8>,
    },
}

impl StagePayload {
    /// The JSON document, if this payload is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            StagePayload::Json(value) => Some(value),
            StagePayload::Archive { .. } => None,
        }
    }

    /// Project the JSON payload onto a typed view.
    ///
    /// Returns `None` for archives or when the document has a different shape.
    pub fn view<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        self.as_json()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Size of the payload as it would be written to disk.
    pub fn len(&self) -> usize {
        match self {
            StagePayload::Json(value) => value.to_string().len(),
            StagePayload::Archive { bytes, .. } => bytes.len(),
        }
    }

    /// Whether the payload carries no data.
    pub fn is_empty(&self) -> bool {
        match self {
            StagePayload::Json(value) => value.is_null(),
            StagePayload::Archive { bytes, .. } => bytes.is_empty(),
        }
    }
}

/// Design data extracted from a Figma frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct DesignDocument {
    /// Key of the Figma file the frame belongs to.
    pub file_key: String,

    /// The raw Figma document.
    #[serde(default)]
    pub figma_data: Value,
}

impl DesignDocument {
    /// Name of the design file, when the backend included it.
    pub fn name(&self) -> Option<&str> {
        self.figma_data.get("name").and_then(Value::as_str)
    }
}

/// Testing details attached to a plan objective.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct TestItems {
    #[serde(rename = "Types_of_Testing", default)]
    pub types_of_testing: String,

    #[serde(rename = "Test_Approach", default)]
    pub test_approach: String,

    #[serde(rename = "Acceptance_Criteria", default)]
    pub acceptance_criteria: Vec<String>,
}

/// One objective of a test plan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PlanObjective {
    #[serde(rename = "Objective")]
    pub objective: String,

    #[serde(rename = "Scope", default)]
    pub scope: String,

    #[serde(rename = "Test_Items", default)]
    pub test_items: TestItems,
}

/// A structured test plan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct TestPlan {
    pub test_plan: Vec<PlanObjective>,
}

impl TestPlan {
    /// Render the plan as Markdown, one section per objective.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Test Plan\n\n");
        for (index, objective) in self.test_plan.iter().enumerate() {
            let items = &objective.test_items;
            let _ = write!(
                out,
                "## Objective {}\n\n### Overview\n{}\n\n### Scope\n{}\n\n",
                index + 1,
                objective.objective,
                objective.scope
            );
            let _ = write!(
                out,
                "### Test Items\n\n#### Types of Testing\n{}\n\n#### Test Approach\n{}\n\n#### Acceptance Criteria\n\n",
                items.types_of_testing, items.test_approach
            );
            for (idx, criteria) in items.acceptance_criteria.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", idx + 1, criteria);
            }
            out.push_str("\n---\n\n");
        }
        out
    }
}

/// A single BDD-style scenario.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct BddScenario {
    #[serde(rename = "Scenario")]
    pub scenario: String,

    #[serde(rename = "Given", default)]
    pub given: String,

    #[serde(rename = "And", default)]
    pub and: String,

    #[serde(rename = "When", default)]
    pub when: String,

    #[serde(rename = "Then", default)]
    pub then: String,
}

/// Test cases generated for one plan objective.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct CaseObjective {
    /// Summary of the feature under test.
    pub feature: String,

    /// Ordered scenarios.
    #[serde(default)]
    pub bdd_style_descriptions: Vec<BddScenario>,
}

/// Test cases keyed by objective name, in backend order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(transparent)]
pub struct TestCases(pub IndexMap<String, CaseObjective>);

impl TestCases {
    /// Total number of scenarios across all objectives.
    pub fn scenario_count(&self) -> usize {
        self.0
            .values()
            .map(|objective| objective.bdd_style_descriptions.len())
            .sum()
    }

    /// Render all objectives as Markdown with Gherkin code blocks.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Test Cases\n\n");
        for (key, objective) in &self.0 {
            let _ = write!(out, "## {key}\n\n### Feature\n{}\n\n", objective.feature);
            for (idx, scenario) in objective.bdd_style_descriptions.iter().enumerate() {
                let _ = write!(
                    out,
                    "### Scenario {}\n\n**Scenario:** {}\n\n```gherkin\nGiven {}\nAnd {}\nWhen {}\nThen {}\n```\n\n---\n\n",
                    idx + 1,
                    scenario.scenario,
                    scenario.given,
                    scenario.and,
                    scenario.when,
                    scenario.then
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_cases() -> Value {
        json!({
            "Login Flow": {
                "feature": "User can sign in",
                "bdd_style_descriptions": [{
                    "Scenario": "Valid credentials",
                    "Given": "the login page is open",
                    "And": "the user has an account",
                    "When": "they submit valid credentials",
                    "Then": "the dashboard is shown"
                }]
            }
        })
    }

    #[test]
    fn test_view_projects_test_cases() {
        let payload = StagePayload::Json(sample_cases());
        let cases: TestCases = payload.view().expect("cases view");
        assert_eq!(cases.scenario_count(), 1);
        assert_eq!(cases.0["Login Flow"].feature, "User can sign in");
    }

    #[test]
    fn test_view_of_archive_is_none() {
        let payload = StagePayload::Archive {
            file_name: "test-cases.zip".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert!(payload.view::<TestCases>().is_none());
        assert_eq!(payload.len(), 3);
    }

    fn numbered_objectives(count: usize) -> String {
        let entries: Vec<String> = (1..=count)
            .map(|n| {
                format!(
                    r#""Objective_{n}":{{"feature":"Feature {n}","bdd_style_descriptions":[]}}"#
                )
            })
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    #[test]
    fn test_objectives_keep_backend_order() {
        let raw = numbered_objectives(12);
        let expected: Vec<String> = (1..=12).map(|n| format!("Objective_{n}")).collect();

        let cases: TestCases = serde_json::from_str(&raw).expect("parse");
        let keys: Vec<&String> = cases.0.keys().collect();
        assert_eq!(keys, expected.iter().collect::<Vec<_>>());

        let md = cases.to_markdown();
        let tenth = md.find("## Objective_10\n").expect("objective 10");
        let second = md.find("## Objective_2\n").expect("objective 2");
        assert!(second < tenth);

        let value: Value = serde_json::from_str(&raw).expect("parse value");
        assert_eq!(serde_json::to_string(&value).expect("serialize"), raw);
    }

    #[test]
    fn test_plan_markdown_numbers_criteria() {
        let plan: TestPlan = serde_json::from_value(json!({
            "test_plan": [{
                "Objective": "Verify login",
                "Scope": "Login page",
                "Test_Items": {
                    "Types_of_Testing": "Functional",
                    "Test_Approach": "Manual",
                    "Acceptance_Criteria": ["Shows errors", "Redirects"]
                }
            }]
        }))
        .expect("parse plan");

        let md = plan.to_markdown();
        assert!(md.starts_with("# Test Plan\n\n## Objective 1\n"));
        assert!(md.contains("1. Shows errors\n2. Redirects\n"));
    }
}
