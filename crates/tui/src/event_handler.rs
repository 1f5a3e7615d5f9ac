//! Event handling for the TUI.
//!
//! - Core events update the local [`ViewState`]
//! - Keyboard events edit the command line, move the selection, or send ops

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use cq_protocol::{Event, Op, PipelineSnapshot, Stage, StageStatus};
use std::collections::VecDeque;
use tokio::sync::mpsc::UnboundedSender;

use crate::widgets::{CommandComposer, Preview};

/// How many notices are kept for the status area.
const MAX_NOTICES: usize = 50;

/// A line in the status area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// What the TUI knows about the session.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Last snapshot received from the core.
    pub snapshot: Option<PipelineSnapshot>,
    /// Status of the E2E automation flow and its last message.
    pub automation: (StageStatus, Option<String>),
    /// Most recent notices, newest last.
    pub notices: VecDeque<Notice>,
}

impl ViewState {
    pub fn notify(&mut self, text: impl Into<String>) {
        self.push(text.into(), false);
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        self.push(text.into(), true);
    }

    fn push(&mut self, text: String, is_error: bool) {
        self.notices.push_back(Notice { text, is_error });
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    /// Whether the selected stage may be begun right now.
    pub fn can_begin(&self, stage: Stage) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.stage(stage).can_begin)
    }
}

/// Apply an event from the core.
///
/// Returns `true` when the local snapshot is stale and should be refreshed.
pub fn handle_core_event(view: &mut ViewState, event: Event) -> bool {
    match event {
        Event::StageStatusUpdate { stage, status } => {
            if let Some(snapshot) = view.snapshot.as_mut() {
                snapshot.stages[stage.index()].status = status;
            }
            true
        }
        Event::StageCompleted { stage, .. } => {
            view.notify(format!("{stage} is ready"));
            true
        }
        Event::StageFailed { stage, error } => {
            view.notify_error(format!("{stage} failed: {error}"));
            true
        }
        Event::StageInvalidated { stage } => {
            view.notify(format!("{stage} was reset because its input changed"));
            true
        }
        Event::StageRejected { reason, .. } => {
            view.notify_error(reason);
            false
        }
        Event::InputRejected { message } => {
            view.notify_error(message);
            true
        }
        Event::Snapshot { snapshot } => {
            view.snapshot = Some(snapshot);
            false
        }
        Event::ArtifactSaved { artifact, path } => {
            view.notify(format!("Saved {artifact} to {}", path.display()));
            false
        }
        Event::ArtifactFailed { error, .. } => {
            view.notify_error(error);
            false
        }
        Event::CredentialsSaved => {
            view.notify("API keys saved successfully!");
            false
        }
        Event::CredentialsFailed { error } => {
            view.notify_error(error);
            false
        }
        Event::AutomationUpdate { status, message } => {
            if let Some(text) = &message {
                if status == StageStatus::Failed {
                    view.notify_error(text.clone());
                } else {
                    view.notify(text.clone());
                }
            }
            view.automation = (status, message);
            false
        }
    }
}

/// Mutable TUI pieces a key press can touch.
pub struct KeyContext<'a> {
    pub composer: &'a mut CommandComposer,
    pub selected: &'a mut usize,
    pub preview: &'a mut Preview,
    pub view: &'a mut ViewState,
    pub op_tx: &'a UnboundedSender<Op>,
}

/// Handle a keyboard event from the user.
///
/// Returns `true` if the application should exit.
pub fn handle_keyboard_event(key_event: KeyEvent, cx: KeyContext<'_>) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    if cx.composer.should_show_popup() {
        match key_event.code {
            KeyCode::Up => {
                cx.composer.move_selection_up();
                return false;
            }
            KeyCode::Down => {
                cx.composer.move_selection_down();
                return false;
            }
            KeyCode::Tab => {
                cx.composer.complete_with_selection();
                return false;
            }
            _ => {}
        }
    }

    if cx.preview.handle_key_event(key_event).is_consumed() {
        return false;
    }

    match key_event.code {
        KeyCode::Esc if cx.composer.is_empty() => return true,
        KeyCode::Esc => cx.composer.clear(),
        KeyCode::Char('q') if cx.composer.is_empty() => return true,
        KeyCode::Up => {
            *cx.selected = cx.selected.saturating_sub(1);
            cx.preview.scroll_to_top();
        }
        KeyCode::Down => {
            if *cx.selected + 1 < Stage::ALL.len() {
                *cx.selected += 1;
            }
            cx.preview.scroll_to_top();
        }
        KeyCode::Left => cx.composer.move_cursor_left(),
        KeyCode::Right => cx.composer.move_cursor_right(),
        KeyCode::Tab => cx.composer.complete_with_selection(),
        KeyCode::Char(c) => cx.composer.insert_char(c),
        KeyCode::Backspace => cx.composer.delete_char(),
        KeyCode::Enter => submit_command(cx),
        _ => {}
    }

    false
}

/// Submit the command line, or run the selected stage when it is empty.
fn submit_command(cx: KeyContext<'_>) {
    let stage = Stage::ALL[(*cx.selected).min(Stage::ALL.len() - 1)];

    if cx.composer.is_empty() {
        if cx.view.can_begin(stage) {
            let _ = cx.op_tx.send(Op::BeginStage { stage });
        } else {
            cx.view
                .notify_error(format!("{stage} cannot be run right now"));
        }
        return;
    }

    match cx.composer.parse_command(stage) {
        Ok(Some(Op::GenerateCode | Op::UploadSpecs { .. }))
            if cx.view.automation.0.is_in_progress() =>
        {
            cx.view.notify_error("E2E automation is already running");
        }
        Ok(Some(op)) => {
            let _ = cx.op_tx.send(op);
        }
        Ok(None) => {}
        Err(message) => cx.view.notify_error(message),
    }
    cx.composer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cq_protocol::{StageRecord, StageView, UserInput};
    use tokio::sync::mpsc::unbounded_channel;

    fn snapshot_with_gate(open: Stage) -> PipelineSnapshot {
        PipelineSnapshot {
            stages: Stage::ALL
                .into_iter()
                .map(|stage| StageView {
                    stage,
                    status: StageStatus::Idle,
                    can_begin: stage == open,
                    record: StageRecord::default(),
                })
                .collect(),
            input: UserInput::default(),
            input_error: None,
        }
    }

    struct Harness {
        composer: CommandComposer,
        selected: usize,
        preview: Preview,
        view: ViewState,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                composer: CommandComposer::new(),
                selected: 0,
                preview: Preview::new(),
                view: ViewState::default(),
            }
        }

        fn press(&mut self, code: KeyCode, op_tx: &UnboundedSender<Op>) -> bool {
            handle_keyboard_event(
                KeyEvent::from(code),
                KeyContext {
                    composer: &mut self.composer,
                    selected: &mut self.selected,
                    preview: &mut self.preview,
                    view: &mut self.view,
                    op_tx,
                },
            )
        }
    }

    #[test]
    fn test_quit_keys() {
        let (op_tx, _op_rx) = unbounded_channel();
        let mut harness = Harness::new();
        assert!(harness.press(KeyCode::Char('q'), &op_tx));
        assert!(harness.press(KeyCode::Esc, &op_tx));
    }

    #[test]
    fn test_q_is_text_while_typing() {
        let (op_tx, _op_rx) = unbounded_channel();
        let mut harness = Harness::new();
        harness.press(KeyCode::Char('/'), &op_tx);
        assert!(!harness.press(KeyCode::Char('q'), &op_tx));
        assert_eq!(harness.composer.input(), "/q");

        assert!(!harness.press(KeyCode::Esc, &op_tx), "Esc clears first");
        assert!(harness.composer.is_empty());
    }

    #[test]
    fn test_navigation_is_bounded() {
        let (op_tx, _op_rx) = unbounded_channel();
        let mut harness = Harness::new();
        harness.press(KeyCode::Up, &op_tx);
        assert_eq!(harness.selected, 0);
        for _ in 0..10 {
            harness.press(KeyCode::Down, &op_tx);
        }
        assert_eq!(harness.selected, Stage::ALL.len() - 1);
    }

    #[test]
    fn test_enter_runs_stage_only_when_gate_open() {
        let (op_tx, mut op_rx) = unbounded_channel();
        let mut harness = Harness::new();
        harness.view.snapshot = Some(snapshot_with_gate(Stage::DesignExtraction));

        harness.selected = Stage::PlanGeneration.index();
        harness.press(KeyCode::Enter, &op_tx);
        assert!(op_rx.try_recv().is_err());
        assert!(harness.view.notices.back().is_some_and(|n| n.is_error));

        harness.selected = Stage::DesignExtraction.index();
        harness.press(KeyCode::Enter, &op_tx);
        assert!(matches!(
            op_rx.try_recv(),
            Ok(Op::BeginStage {
                stage: Stage::DesignExtraction
            })
        ));
    }

    #[test]
    fn test_typed_command_is_sent() {
        let (op_tx, mut op_rx) = unbounded_channel();
        let mut harness = Harness::new();
        for c in "/code".chars() {
            harness.press(KeyCode::Char(c), &op_tx);
        }
        harness.press(KeyCode::Enter, &op_tx);

        assert!(matches!(op_rx.try_recv(), Ok(Op::GenerateCode)));
        assert!(harness.composer.is_empty());
    }

    #[test]
    fn test_code_command_blocked_while_automation_runs() {
        let (op_tx, mut op_rx) = unbounded_channel();
        let mut harness = Harness::new();
        handle_core_event(
            &mut harness.view,
            Event::AutomationUpdate {
                status: StageStatus::InProgress,
                message: None,
            },
        );

        for c in "/code".chars() {
            harness.press(KeyCode::Char(c), &op_tx);
        }
        harness.press(KeyCode::Enter, &op_tx);

        assert!(op_rx.try_recv().is_err());
        assert!(harness.composer.is_empty());
        assert!(harness.view.notices.back().is_some_and(|n| n.is_error));

        handle_core_event(
            &mut harness.view,
            Event::AutomationUpdate {
                status: StageStatus::Ready,
                message: None,
            },
        );
        for c in "/code".chars() {
            harness.press(KeyCode::Char(c), &op_tx);
        }
        harness.press(KeyCode::Enter, &op_tx);
        assert!(matches!(op_rx.try_recv(), Ok(Op::GenerateCode)));
    }

    #[test]
    fn test_failure_event_adds_error_notice() {
        let mut view = ViewState::default();
        let refresh = handle_core_event(
            &mut view,
            Event::StageFailed {
                stage: Stage::CaseGeneration,
                error: "boom".to_string(),
            },
        );
        assert!(refresh);
        let notice = view.notices.back().expect("notice");
        assert!(notice.is_error);
        assert_eq!(notice.text, "Test Case Generation failed: boom");
    }

    #[test]
    fn test_snapshot_event_replaces_view() {
        let mut view = ViewState::default();
        let refresh = handle_core_event(
            &mut view,
            Event::Snapshot {
                snapshot: snapshot_with_gate(Stage::FeatureRepresentation),
            },
        );
        assert!(!refresh);
        assert!(view.can_begin(Stage::FeatureRepresentation));
        assert!(!view.can_begin(Stage::DesignExtraction));
    }

    #[test]
    fn test_notices_are_capped() {
        let mut view = ViewState::default();
        for i in 0..(MAX_NOTICES + 5) {
            view.notify(format!("notice {i}"));
        }
        assert_eq!(view.notices.len(), MAX_NOTICES);
        assert_eq!(view.notices.front().map(|n| n.text.as_str()), Some("notice 5"));
    }
}
