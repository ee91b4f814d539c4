//! # Message block
//!
//! Turns one [`UiMessage`] into pre-rendered part blocks. Building is the
//! expensive step (markdown parsing, height measurement), so the list keeps
//! the result in an equality-gated cache; cheap per-frame details (spinner
//! glyphs, reveal heights) are applied at render time from the live part
//! data.
//!
//! Visual treatment by part tag:
//! - text: markdown; user content in a bordered box, assistant content plain
//!   behind a `✦` avatar gutter.
//! - reasoning: header + collapsible body (see `reasoning.rs`).
//! - tool-call: single status row (see `tool_call.rs`).
//! - any other tag: renders nothing.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Span, Text};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::client::{Part, Role, UiMessage};
use crate::tui::markdown;

/// Columns reserved for the assistant avatar gutter.
pub const AVATAR_GUTTER: u16 = 2;
/// Horizontal overhead of a boxed user part: borders + padding.
pub const BOX_OVERHEAD_H: u16 = 4;
/// Vertical overhead of a boxed user part: top + bottom border.
pub const BOX_OVERHEAD_V: u16 = 2;

/// Glyph drawn next to assistant messages.
pub const AVATAR: &str = "✦";

/// One pre-rendered part. `Tool` and `Hidden` carry no build output — tool
/// rows are a single line rebuilt each frame so their spinner can move.
pub enum BuiltPart {
    Text {
        text: Text<'static>,
        boxed: bool,
        height: u16,
    },
    Reasoning {
        body: Text<'static>,
        body_height: u16,
    },
    Tool,
    Hidden,
}

/// A message's parts, pre-rendered for a specific content width.
pub struct BuiltMessage {
    pub role: Role,
    pub parts: Vec<BuiltPart>,
}

impl BuiltMessage {
    /// Width available to part content inside a message block.
    pub fn part_width(role: Role, block_width: u16) -> u16 {
        match role {
            Role::Assistant => block_width.saturating_sub(AVATAR_GUTTER),
            Role::User => block_width,
        }
    }
}

/// Pure build step: same `(message, width)` always yields the same blocks.
pub fn build_message(message: &UiMessage, block_width: u16) -> BuiltMessage {
    let part_width = BuiltMessage::part_width(message.role, block_width);
    let parts = message
        .parts
        .iter()
        .map(|part| build_part(part, message.role, part_width))
        .collect();
    BuiltMessage {
        role: message.role,
        parts,
    }
}

fn build_part(part: &Part, role: Role, width: u16) -> BuiltPart {
    match part {
        Part::Text { text } => {
            let boxed = role == Role::User;
            let base_fg = if boxed { Color::Green } else { Color::White };
            let rendered = markdown::render(text, base_fg);
            let height = if boxed {
                wrapped_height(&rendered, width.saturating_sub(BOX_OVERHEAD_H)) + BOX_OVERHEAD_V
            } else {
                wrapped_height(&rendered, width)
            };
            BuiltPart::Text {
                text: rendered,
                boxed,
                height,
            }
        }
        Part::Reasoning { text } => {
            let body = markdown::render(text, Color::DarkGray);
            let body_height =
                wrapped_height(&body, width.saturating_sub(super::reasoning::BODY_INDENT));
            BuiltPart::Reasoning { body, body_height }
        }
        Part::ToolCall(_) => BuiltPart::Tool,
        Part::Unknown { .. } => BuiltPart::Hidden,
    }
}

/// Rows the text occupies when wrapped to `width`.
fn wrapped_height(text: &Text<'static>, width: u16) -> u16 {
    if width == 0 {
        return 1;
    }
    let count = Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(width);
    (count as u16).max(1)
}

/// Renders a pre-built text part.
pub struct TextPartView<'a> {
    pub text: &'a Text<'static>,
    pub boxed: bool,
}

impl<'a> Widget for TextPartView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let paragraph = Paragraph::new(self.text.clone()).wrap(Wrap { trim: false });
        if self.boxed {
            let border_style = Style::default().fg(Color::Green);
            let block = Block::bordered()
                .border_type(ratatui::widgets::BorderType::Rounded)
                .border_style(border_style)
                .padding(Padding::horizontal(1));
            paragraph.block(block).render(area, buf);
        } else {
            paragraph.render(area, buf);
        }
    }
}

/// The assistant avatar, drawn in the gutter next to the first part.
pub fn avatar_span() -> Span<'static> {
    Span::styled(AVATAR, Style::default().fg(Color::Magenta))
}
