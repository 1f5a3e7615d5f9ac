//! Pipeline board: one row per stage with its status and gate.

use chrono::Local;
use cq_protocol::{PipelineSnapshot, StageStatus, StageView};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

/// Colour used for a stage status.
pub fn status_style(status: StageStatus) -> Style {
    match status {
        StageStatus::Idle => Style::default().fg(Color::White),
        StageStatus::Waiting => Style::default().fg(Color::DarkGray),
        StageStatus::InProgress => Style::default().fg(Color::Yellow),
        StageStatus::Ready => Style::default().fg(Color::Green),
        StageStatus::Failed => Style::default().fg(Color::Red),
    }
}

/// Short label for a stage status.
pub fn status_label(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Idle => "Idle",
        StageStatus::Waiting => "Waiting",
        StageStatus::InProgress => "Running...",
        StageStatus::Ready => "Ready",
        StageStatus::Failed => "Failed",
    }
}

fn gate_cell(view: &StageView) -> Cell<'static> {
    if view.can_begin {
        Cell::from("open").style(Style::default().fg(Color::Green))
    } else {
        Cell::from("locked").style(Style::default().fg(Color::DarkGray))
    }
}

fn finished_cell(view: &StageView) -> Cell<'static> {
    let text = view
        .record
        .finished_at
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default();
    Cell::from(text)
}

/// Render the board for `snapshot`, highlighting row `selected`.
pub fn render_pipeline_board(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&PipelineSnapshot>,
    selected: usize,
) {
    let rows: Vec<Row> = snapshot
        .map(|snapshot| {
            snapshot
                .stages
                .iter()
                .map(|view| {
                    Row::new(vec![
                        Cell::from(format!("{}", view.stage.index() + 1)),
                        Cell::from(view.stage.label()),
                        Cell::from(status_label(view.status)).style(status_style(view.status)),
                        gate_cell(view),
                        finished_cell(view),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Stage"),
        Cell::from("Status"),
        Cell::from("Gate"),
        Cell::from("Finished"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let widths = [
        Constraint::Length(3),
        Constraint::Percentage(45),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Pipeline"))
        .row_highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut state = TableState::default();
    if snapshot.is_some() {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
