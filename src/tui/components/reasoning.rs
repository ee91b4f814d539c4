//! # Reasoning part
//!
//! Header plus collapsible body for a model reasoning trace.
//!
//! While the part is actively streaming, the header shows an indeterminate
//! spinner and the body is forced open. Once settled, the header becomes a
//! toggle (chevron) and expansion is user-controlled, collapsed by default.
//! The open/close motion is an eased height reveal with the body dimmed
//! while in motion — cosmetic only.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Widget, Wrap};

use super::tool_call::SPINNER_FRAMES;

/// Header height in rows. The body sits below it.
pub const HEADER_HEIGHT: u16 = 1;
/// Horizontal room taken by the body's left border + pad.
pub const BODY_INDENT: u16 = 2;

/// Builds the header line for a reasoning part.
pub fn header_line(active: bool, expanded: bool, spinner_frame: usize) -> Line<'static> {
    if active {
        let frame = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
        return Line::from(vec![
            Span::styled("Reasoning ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(frame.to_string(), Style::default().fg(Color::DarkGray)),
        ]);
    }
    let chevron = if expanded { "▾" } else { "▸" };
    Line::from(vec![
        Span::styled(
            "Reasoned for a few seconds ",
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(chevron.to_string(), Style::default().fg(Color::DarkGray)),
    ])
}

/// The partially revealed body: pre-rendered markdown clipped to the reveal
/// height, dimmed while the transition is still running.
pub struct ReasoningBody<'a> {
    pub body: &'a Text<'static>,
    pub in_motion: bool,
}

impl<'a> Widget for ReasoningBody<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let mut style = Style::default().fg(Color::DarkGray);
        if self.in_motion {
            style = style.add_modifier(Modifier::DIM);
        }
        // Border + pad together consume BODY_INDENT columns, matching the
        // width the body was measured at.
        let block = Block::new()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(Color::DarkGray))
            .padding(Padding::left(1));
        Paragraph::new(self.body.clone())
            .style(style)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}
