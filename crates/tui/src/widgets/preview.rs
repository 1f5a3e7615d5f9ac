//! Scrollable preview of the selected stage's result.
//!
//! Plans and test cases render as Markdown, design data as a short summary
//! followed by the raw JSON, and a failed stage shows its error.

use crossterm::event::{KeyCode, KeyEvent};
use cq_protocol::{DesignDocument, Stage, StagePayload, StageStatus, StageView, TestCases, TestPlan};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::event::EventStatus;

const PAGE: usize = 10;

/// Text shown for `view`.
pub fn preview_text(view: &StageView) -> String {
    if let Some(error) = &view.record.error {
        if view.status == StageStatus::Failed {
            return format!("Error: {error}\n\nPress Enter to retry.");
        }
    }

    match (&view.record.payload, view.status) {
        (_, StageStatus::InProgress) => format!("{} is running...", view.stage),
        (Some(payload), _) => payload_text(view.stage, payload),
        (None, StageStatus::Waiting) => match view.stage.upstream() {
            Some(upstream) => format!("Waiting for {upstream} to be ready."),
            None => String::new(),
        },
        (None, _) => format!("Press Enter to run {}.", view.stage),
    }
}

fn payload_text(stage: Stage, payload: &StagePayload) -> String {
    let json = match payload {
        StagePayload::Archive { file_name, bytes } => {
            return format!(
                "Feature archive ready: {file_name} ({} bytes)\n\nSave it with /download features",
                bytes.len()
            );
        }
        StagePayload::Json(value) => value,
    };
    let pretty = serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string());

    match stage {
        Stage::DesignExtraction => match payload.view::<DesignDocument>() {
            Some(design) => format!(
                "Design: {}\nFile key: {}\n\n{pretty}",
                design.name().unwrap_or("(unnamed)"),
                design.file_key
            ),
            None => pretty,
        },
        Stage::PlanGeneration => payload
            .view::<TestPlan>()
            .map(|plan| plan.to_markdown())
            .unwrap_or(pretty),
        Stage::CaseGeneration => payload
            .view::<TestCases>()
            .map(|cases| {
                format!(
                    "{} objectives, {} scenarios\n\n{}",
                    cases.0.len(),
                    cases.scenario_count(),
                    cases.to_markdown()
                )
            })
            .unwrap_or(pretty),
        Stage::FeatureRepresentation | Stage::Completion => pretty,
    }
}

#[derive(Debug, Default)]
pub struct Preview {
    pub scroll_offset: usize,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, view: Option<&StageView>) {
        let title = view
            .map(|view| format!("Preview - {}", view.stage))
            .unwrap_or_else(|| "Preview".to_string());
        let block = Block::default().borders(Borders::ALL).title(title);

        let text = view.map(preview_text).unwrap_or_default();
        let style = match view {
            Some(view) if view.status == StageStatus::Failed => Style::default().fg(Color::Red),
            _ => Style::default(),
        };
        let total_lines = text.lines().count();

        let paragraph = Paragraph::new(text)
            .block(block)
            .style(style)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll_offset.min(u16::MAX as usize) as u16, 0));
        frame.render_widget(paragraph, area);

        let visible_lines = area.height.saturating_sub(2) as usize;
        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(self.scroll_offset);
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    /// Scroll keys: PageUp/PageDown, Home/End.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::PageUp => self.scroll_offset = self.scroll_offset.saturating_sub(PAGE),
            KeyCode::PageDown => self.scroll_offset = self.scroll_offset.saturating_add(PAGE),
            KeyCode::Home => self.scroll_offset = 0,
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cq_protocol::StageRecord;
    use serde_json::json;

    fn view(stage: Stage, status: StageStatus, record: StageRecord) -> StageView {
        StageView {
            stage,
            status,
            can_begin: false,
            record,
        }
    }

    #[test]
    fn test_failed_stage_shows_error() {
        let record = StageRecord {
            status: StageStatus::Failed,
            error: Some("boom".to_string()),
            ..StageRecord::default()
        };
        let text = preview_text(&view(Stage::PlanGeneration, StageStatus::Failed, record));
        assert!(text.starts_with("Error: boom"));
    }

    #[test]
    fn test_plan_renders_as_markdown() {
        let record = StageRecord {
            status: StageStatus::Ready,
            payload: Some(StagePayload::Json(json!({
                "test_plan": [{
                    "Objective": "Verify guest checkout",
                    "Scope": "Checkout page",
                    "Test_Items": {
                        "Types_of_Testing": "Functional",
                        "Test_Approach": "UI tests",
                        "Acceptance_Criteria": ["Order is placed"]
                    }
                }]
            }))),
            ..StageRecord::default()
        };
        let text = preview_text(&view(Stage::PlanGeneration, StageStatus::Ready, record));
        assert!(text.contains("# Test Plan"));
        assert!(text.contains("Verify guest checkout"));
    }

    #[test]
    fn test_cases_preview_counts_scenarios() {
        let scenario = json!({
            "Scenario": "Pay by card",
            "Given": "a cart",
            "And": "a saved card",
            "When": "the user pays",
            "Then": "the order is placed"
        });
        let record = StageRecord {
            status: StageStatus::Ready,
            payload: Some(StagePayload::Json(json!({
                "Objective_1": {
                    "feature": "Checkout",
                    "bdd_style_descriptions": [scenario.clone(), scenario]
                },
                "Objective_2": { "feature": "Receipt", "bdd_style_descriptions": [] }
            }))),
            ..StageRecord::default()
        };
        let text = preview_text(&view(Stage::CaseGeneration, StageStatus::Ready, record));
        assert!(text.starts_with("2 objectives, 2 scenarios\n\n# Test Cases"));
    }

    #[test]
    fn test_waiting_stage_names_upstream() {
        let text = preview_text(&view(
            Stage::CaseGeneration,
            StageStatus::Waiting,
            StageRecord::default(),
        ));
        assert_eq!(text, "Waiting for Test Plan Generation to be ready.");
    }

    #[test]
    fn test_archive_summary() {
        let record = StageRecord {
            status: StageStatus::Ready,
            payload: Some(StagePayload::Archive {
                file_name: "test-cases.zip".to_string(),
                bytes: vec![1, 2, 3],
            }),
            ..StageRecord::default()
        };
        let text = preview_text(&view(Stage::Completion, StageStatus::Ready, record));
        assert!(text.contains("test-cases.zip (3 bytes)"));
    }

    #[test]
    fn test_scroll_keys() {
        let mut preview = Preview::new();
        assert_eq!(
            preview.handle_key_event(KeyEvent::from(KeyCode::PageDown)),
            EventStatus::Consumed
        );
        assert_eq!(preview.scroll_offset, PAGE);
        preview.handle_key_event(KeyEvent::from(KeyCode::PageUp));
        assert_eq!(preview.scroll_offset, 0);
        assert_eq!(
            preview.handle_key_event(KeyEvent::from(KeyCode::Char('x'))),
            EventStatus::NotConsumed
        );
    }
}
