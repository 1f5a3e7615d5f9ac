//! TUI application state and event loop.
//!
//! The [`App`] never mutates pipeline state itself: it sends [`Op`]s to the
//! session and re-renders from the snapshots the session sends back.

use anyhow::Result;
use crossterm::event::KeyEvent;
use cq_protocol::{Event, Op, Stage, StageStatus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedSender};
use tokio_stream::StreamExt;

use crate::event_handler::{self, KeyContext, ViewState};
use crate::tui::{Tui, TuiEvent};
use crate::widgets::pipeline_board::{render_pipeline_board, status_label, status_style};
use crate::widgets::{CommandComposer, Preview};

const NOTICE_LINES: u16 = 4;

pub struct App {
    pub view: ViewState,
    /// Index into [`Stage::ALL`] of the highlighted stage.
    pub selected_index: usize,
    pub composer: CommandComposer,
    pub preview: Preview,
    pub op_tx: UnboundedSender<Op>,
    pub event_rx: Receiver<Event>,
    pub should_exit: bool,
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: Receiver<Event>) -> Self {
        Self {
            view: ViewState::default(),
            selected_index: 0,
            composer: CommandComposer::new(),
            preview: Preview::new(),
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    pub fn selected_stage(&self) -> Stage {
        Stage::ALL[self.selected_index.min(Stage::ALL.len() - 1)]
    }

    /// Main event loop.
    ///
    /// Ends when the user quits or the session closes its event channel.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();

        let _ = self.op_tx.send(Op::GetSnapshot);
        tui.frame_requester().schedule_frame();

        while !self.should_exit {
            select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        self.handle_core_event(event);
                        tui.frame_requester().schedule_frame();
                    }
                    None => self.should_exit = true,
                },
                Some(tui_event) = tui_events.next() => {
                    self.handle_tui_event(tui, tui_event)?;
                }
            }
        }

        let _ = self.op_tx.send(Op::Shutdown);
        Ok(())
    }

    fn handle_core_event(&mut self, event: Event) {
        if event_handler::handle_core_event(&mut self.view, event) {
            let _ = self.op_tx.send(Op::GetSnapshot);
        }
    }

    fn handle_tui_event(&mut self, tui: &mut Tui, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => {
                self.handle_key_event(key_event);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Paste(text) => {
                self.composer.insert_str(&text);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Draw => tui.draw(|frame| self.render(frame))?,
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        self.should_exit = event_handler::handle_keyboard_event(
            key_event,
            KeyContext {
                composer: &mut self.composer,
                selected: &mut self.selected_index,
                preview: &mut self.preview,
                view: &mut self.view,
                op_tx: &self.op_tx,
            },
        );
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(Stage::ALL.len() as u16 + 3),
                Constraint::Min(5),
                Constraint::Length(NOTICE_LINES + 2),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.render_inputs(frame, chunks[0]);
        render_pipeline_board(
            frame,
            chunks[1],
            self.view.snapshot.as_ref(),
            self.selected_index,
        );
        let stage_view = self
            .view
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.stage(self.selected_stage()));
        self.preview.render(frame, chunks[2], stage_view);
        self.render_notices(frame, chunks[3]);
        self.composer.render(chunks[4], frame.buffer_mut());

        if self.composer.should_show_popup() {
            let height = (self.composer.suggestions().len() as u16 + 2).min(chunks[2].height);
            let popup = Rect {
                x: chunks[4].x,
                y: chunks[4].y.saturating_sub(height),
                width: chunks[4].width,
                height,
            };
            self.composer.render_popup(popup, frame.buffer_mut());
        }
    }

    fn render_inputs(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(Color::Cyan);
        let (url, description, error) = match &self.view.snapshot {
            Some(snapshot) => (
                snapshot.input.design_url.as_str(),
                snapshot.input.feature_description.as_str(),
                snapshot.input_error.as_deref(),
            ),
            None => ("", "", None),
        };

        let mut url_line = vec![Span::styled("Figma URL:   ", label), Span::raw(url)];
        if let Some(error) = error {
            url_line.push(Span::styled(
                format!("  ({error})"),
                Style::default().fg(Color::Red),
            ));
        }
        let lines = vec![
            Line::from(url_line),
            Line::from(vec![
                Span::styled("Description: ", label),
                Span::raw(description),
            ]),
        ];

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Input (/url, /desc)"));
        frame.render_widget(paragraph, area);
    }

    fn render_notices(&self, frame: &mut Frame, area: Rect) {
        let (status, _) = &self.view.automation;
        let title = if *status == StageStatus::Idle {
            "Messages".to_string()
        } else {
            format!("Messages | E2E code: {}", status_label(*status))
        };

        let lines: Vec<Line> = self
            .view
            .notices
            .iter()
            .rev()
            .take(NOTICE_LINES as usize)
            .rev()
            .map(|notice| {
                let style = if notice.is_error {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                Line::styled(notice.text.clone(), style)
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(status_style(*status)),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}
