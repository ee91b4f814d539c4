//! # Tool call row
//!
//! Renders a tool invocation as a single line: icon, verb, tool name, a dim
//! summary of the streamed arguments, and a trailing status glyph.
//!
//! The glyph follows a fixed 3-way rule:
//!
//! | input state      | message is latest | status            | glyph        |
//! |------------------|-------------------|-------------------|--------------|
//! | input-streaming  | yes               | submitted/streaming | busy spinner |
//! | input-streaming  | yes               | ready/error       | stopped      |
//! | input-streaming  | no                | any               | stopped      |
//! | output-available | any               | any               | check        |

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::client::{Status, ToolCallPart, ToolState};

/// Braille spinner shown while a call's input is still streaming.
pub const SPINNER_FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Max chars of the argument summary before truncation.
const MAX_ARGS_CHARS: usize = 32;

const fn tool_style() -> Style {
    Style::new().fg(Color::Yellow)
}

/// Trailing status glyph for a tool call, or `None` for states this UI does
/// not recognize.
pub fn status_glyph(
    state: ToolState,
    is_latest_message: bool,
    status: Status,
    spinner_frame: usize,
) -> Option<Span<'static>> {
    match state {
        ToolState::InputStreaming if is_latest_message && status.is_busy() => {
            let frame = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
            Some(Span::styled(
                frame.to_string(),
                Style::default().fg(Color::Yellow),
            ))
        }
        ToolState::InputStreaming => {
            Some(Span::styled("◼", Style::default().fg(Color::Red)))
        }
        ToolState::OutputAvailable => {
            Some(Span::styled("✓", Style::default().fg(Color::Green)))
        }
    }
}

/// Builds the one-line row for a tool call part.
pub fn row_line(
    part: &ToolCallPart,
    is_latest_message: bool,
    status: Status,
    spinner_frame: usize,
) -> Line<'static> {
    let verb = match part.state {
        ToolState::InputStreaming => "Calling ",
        ToolState::OutputAvailable => "Called ",
    };

    let mut spans = vec![
        Span::styled("⚙ ", tool_style()),
        Span::styled(verb, Style::default().fg(Color::DarkGray)),
        Span::styled(part.name.clone(), tool_style().add_modifier(Modifier::BOLD)),
    ];

    let args = summarize_args(&part.input);
    if !args.is_empty() {
        spans.push(Span::styled(
            format!(" {args}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        ));
    }

    if let Some(glyph) = status_glyph(part.state, is_latest_message, status, spinner_frame) {
        spans.push(Span::raw(" "));
        spans.push(glyph);
    }

    Line::from(spans)
}

/// Inline `(k: v, k: v)` summary of the call's JSON arguments. Partial or
/// non-JSON input falls back to raw truncation; empty input renders nothing.
fn summarize_args(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return format!("({})", truncate(trimmed, MAX_ARGS_CHARS));
    };

    let body = match value {
        serde_json::Value::Object(map) if !map.is_empty() => map
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    format!("({})", truncate(&body, MAX_ARGS_CHARS))
}

fn truncate(s: &str, budget: usize) -> String {
    if s.chars().count() <= budget {
        return s.to_string();
    }
    let cut: String = s.chars().take(budget.saturating_sub(1)).collect();
    format!("{cut}…")
}
