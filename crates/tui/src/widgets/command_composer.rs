//! Command line with slash command autocomplete.
//!
//! Parses what the user typed into an [`Op`] for the session loop.

use cq_protocol::{ArtifactKind, Credentials, InputField, Op, Stage};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::path::PathBuf;

/// Available slash commands with their descriptions.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/url <figma-url>", "Set the Figma design URL"),
    ("/desc <text>", "Set the feature description"),
    ("/run [stage]", "Run the selected (or named) stage"),
    ("/download <artifact> [dir]", "Save an artifact to disk"),
    ("/keys <figma-token> <gemini-key>", "Save API credentials"),
    ("/upload <file.feature>...", "Upload feature files for E2E code"),
    ("/code", "Generate E2E test code"),
    ("/code-download [dir]", "Save the generated code archive"),
];

#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    input: String,
    /// Cursor position, in characters.
    cursor: usize,
    show_popup: bool,
    selected_index: usize,
}

impl CommandComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup
    }

    /// Commands whose name starts with what has been typed so far.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        let Some(typed) = self.input.split_whitespace().next() else {
            return Vec::new();
        };
        if !typed.starts_with('/') {
            return Vec::new();
        }

        COMMANDS
            .iter()
            .filter(|(usage, _)| command_name(usage).starts_with(typed))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map_or(self.input.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor += 1;
        self.update_popup_state();
    }

    /// Insert pasted text at the cursor, flattening newlines.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.input.remove(at);
            self.update_popup_state();
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Replace the typed command with the selected suggestion (Tab).
    pub fn complete_with_selection(&mut self) {
        if let Some((usage, _)) = self.selected_suggestion() {
            self.input = format!("{} ", command_name(usage));
            self.cursor = self.input.chars().count();
            self.show_popup = false;
            self.selected_index = 0;
        }
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');

        let count = self.suggestions().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Command (Enter runs selected stage, / for commands, q to quit)");

        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(format!("> {}", self.input))
            .style(Style::default().fg(Color::Yellow))
            .render(inner, buf);
    }

    /// Render the suggestion list just above `area`'s bottom edge.
    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.show_popup {
            return;
        }
        let suggestions = self.suggestions();
        if suggestions.is_empty() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(area);
        block.render(area, buf);

        for (i, (usage, description)) in suggestions.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.y + inner.height {
                break;
            }
            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let line = Line::from(vec![
                Span::styled(format!("{usage:<34}"), style),
                Span::styled(description.to_string(), style.fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Parse the current input into an [`Op`].
    ///
    /// `selected` is the stage highlighted on the board, used by a bare
    /// `/run`. Returns `Ok(None)` for blank input.
    pub fn parse_command(&self, selected: Stage) -> Result<Option<Op>, String> {
        parse_command(&self.input, selected)
    }
}

fn command_name(usage: &str) -> &str {
    usage.split_whitespace().next().unwrap_or(usage)
}

/// Parse one command line into an [`Op`].
pub fn parse_command(input: &str, selected: Stage) -> Result<Option<Op>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if !input.starts_with('/') {
        return Err("Commands must start with '/'. Type / to list them.".to_string());
    }

    let (command, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    let op = match command {
        "/url" => Op::SetInput {
            field: InputField::DesignUrl,
            value: args.first().ok_or("Missing Figma URL")?.to_string(),
        },
        "/desc" => Op::SetInput {
            field: InputField::FeatureDescription,
            value: rest.to_string(),
        },
        "/run" => {
            let stage = match args.first() {
                Some(name) => name.parse::<Stage>().map_err(|e| e.to_string())?,
                None => selected,
            };
            Op::BeginStage { stage }
        }
        "/download" => {
            let artifact = args
                .first()
                .ok_or("Missing artifact name")?
                .parse::<ArtifactKind>()?;
            Op::Download {
                artifact,
                dest_dir: args.get(1).map(PathBuf::from),
            }
        }
        "/keys" => match args.as_slice() {
            [design_token, llm_key] => Op::SaveCredentials {
                credentials: Credentials {
                    design_token: design_token.to_string(),
                    llm_key: llm_key.to_string(),
                },
            },
            _ => return Err("Usage: /keys <figma-token> <gemini-key>".to_string()),
        },
        "/upload" => Op::UploadSpecs {
            files: args.iter().map(PathBuf::from).collect(),
        },
        "/code" => Op::GenerateCode,
        "/code-download" => Op::Download {
            artifact: ArtifactKind::CodeArchive,
            dest_dir: args.first().map(PathBuf::from),
        },
        other => return Err(format!("Unknown command: {other}")),
    };
    Ok(Some(op))
}
