//! # InputBox Component
//!
//! Composer at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input
//! - Handle editing (backspace, delete, cursor movement, paste)
//! - Handle submission (Enter)
//! - Grow with its content up to a cap, then scroll internally
//!
//! Submission is unconditional: Enter fires even with an empty buffer, and
//! the buffer is cleared at that moment. Whether a send actually happens is
//! the event loop's call (it drops submits while a response is in flight).

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally by the bordered block
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
const VERTICAL_OVERHEAD: u16 = 2;
/// Content lines shown before internal scrolling kicks in
const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from area edge to content (border width)
const BORDER_OFFSET: u16 = 1;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User pressed Enter. Carries the buffer contents, possibly empty.
    Submit(String),
    /// Text or cursor changed
    ContentChanged,
}

/// Text input component.
pub struct InputBox {
    /// Text buffer (Internal State)
    pub buffer: String,
    /// Cursor position as byte offset in buffer (0..=buffer.len())
    pos: usize,
    /// Line offset for internal scrolling (0 when content fits)
    scroll_offset: u16,
    /// Cached area width from last render, for vertical cursor movement
    last_width: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pos: 0,
            scroll_offset: 0,
            last_width: 80,
        }
    }

    /// Height the box wants for its current content, borders included.
    /// Clamped to `[1 + overhead, MAX_VISIBLE_LINES + overhead]`.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let lines = wrap_line_count(&self.buffer, inner_width(area_width));
        lines.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Visible slice of the wrapped buffer for the current scroll offset.
    fn visible_text(&self, area_width: u16) -> String {
        if self.scroll_offset == 0 {
            return self.buffer.clone();
        }
        let width = inner_width(area_width);
        if width == 0 {
            return String::new();
        }
        let lines = textwrap::wrap(&self.buffer, wrap_options(width));
        let start = self.scroll_offset as usize;
        let end = (start + MAX_VISIBLE_LINES as usize).min(lines.len());
        lines[start..end].join("\n")
    }

    /// Keeps the cursor line inside the visible window.
    fn update_scroll_offset(&mut self, area_width: u16) {
        let width = inner_width(area_width);
        if wrap_line_count(&self.buffer, width) <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }
        let line = self.cursor_line(width);
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = line.saturating_sub(MAX_VISIBLE_LINES - 1);
        }
    }

    /// Wrapped line (0-based) the cursor sits on.
    fn cursor_line(&self, width: u16) -> u16 {
        if width == 0 {
            return 0;
        }
        let before = &self.buffer[..self.pos];
        let lines = textwrap::wrap(before, wrap_options(width));
        let mut line = lines.len().saturating_sub(1) as u16;
        // textwrap drops an empty line after a trailing newline
        if self.pos > 0
            && self.buffer.as_bytes()[self.pos - 1] == b'\n'
            && !lines.last().is_some_and(|l| l.is_empty())
        {
            line += 1;
        }
        line
    }

    /// Moves the cursor one wrapped line up or down, keeping the column
    /// where possible. Returns false at the boundary.
    fn move_vertically(&mut self, down: bool) -> bool {
        let width = inner_width(self.last_width);
        if width == 0 || self.buffer.is_empty() {
            return false;
        }
        let lines = textwrap::wrap(&self.buffer, wrap_options(width));
        if lines.is_empty() {
            return false;
        }

        // Byte span of a wrapped line plus the newline it may swallow.
        let span = |line: &str, offset: usize| {
            let newline = offset + line.len() < self.buffer.len()
                && self.buffer.as_bytes()[offset + line.len()] == b'\n';
            line.len() + usize::from(newline)
        };

        let mut offset = 0;
        let mut current = 0;
        let mut column = 0;
        for (idx, line) in lines.iter().enumerate() {
            if offset + line.len() >= self.pos {
                current = idx;
                column = self.pos - offset;
                break;
            }
            offset += span(line, offset);
        }

        let target = match (down, current) {
            (false, 0) => return false,
            (false, c) => c - 1,
            (true, c) if c + 1 >= lines.len() => return false,
            (true, c) => c + 1,
        };

        let mut target_start = 0;
        for line in lines.iter().take(target) {
            target_start += span(line, target_start);
        }
        self.pos = target_start + column.min(lines[target].len());
        true
    }

    /// Screen coordinates for the terminal cursor.
    fn cursor_screen_pos(&self, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        if width == 0 {
            return (area.x + BORDER_OFFSET, area.y + BORDER_OFFSET);
        }

        let line = self.cursor_line(width);

        // Column counts chars from the last hard newline; the wrapped line
        // length can't be used because textwrap trims trailing spaces.
        let before = &self.buffer[..self.pos];
        let logical_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let logical = &before[logical_start..];
        let segments = textwrap::wrap(logical, wrap_options(width));
        let column = if segments.is_empty() {
            0
        } else {
            let prior: usize = segments
                .iter()
                .take(segments.len() - 1)
                .map(|s| s.width())
                .sum();
            logical.width().saturating_sub(prior) as u16
        };

        let visible_line = line.saturating_sub(self.scroll_offset);
        (
            area.x + BORDER_OFFSET + column,
            area.y + BORDER_OFFSET + visible_line,
        )
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        self.last_width = area.width;
        self.update_scroll_offset(area.width);

        let block = Block::bordered()
            .border_type(ratatui::widgets::BorderType::Rounded)
            .title("Message");
        let input = Paragraph::new(self.visible_text(area.width))
            .block(block)
            .style(Style::default().fg(Color::Green));
        frame.render_widget(input, area);

        let (x, y) = self.cursor_screen_pos(area);
        frame.set_cursor_position((x, y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.pos, *c);
                self.pos += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.pos, text);
                self.pos += text.len();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.pos > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(prev..self.pos);
                self.pos = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.pos < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(self.pos..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.pos > 0).then(|| {
                self.pos = prev_char_boundary(&self.buffer, self.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.pos < self.buffer.len()).then(|| {
                self.pos = next_char_boundary(&self.buffer, self.pos);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.pos]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                (self.pos != line_start).then(|| {
                    self.pos = line_start;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.pos..]
                    .find('\n')
                    .map(|i| self.pos + i)
                    .unwrap_or(self.buffer.len());
                (self.pos != line_end).then(|| {
                    self.pos = line_end;
                    InputEvent::ContentChanged
                })
            }
            TuiEvent::CursorUp => self
                .move_vertically(false)
                .then_some(InputEvent::ContentChanged),
            TuiEvent::CursorDown => self
                .move_vertically(true)
                .then_some(InputEvent::ContentChanged),
            TuiEvent::Submit => {
                // Empty input submits too.
                let text = std::mem::take(&mut self.buffer);
                self.pos = 0;
                self.scroll_offset = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Wrapped line count, accounting for the trailing newline textwrap drops.
fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }
    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }
    count
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn typing_and_erasing() {
        let mut input = InputBox::new();
        assert_eq!(
            input.handle_event(&TuiEvent::InputChar('h')),
            Some(InputEvent::ContentChanged)
        );
        input.handle_event(&TuiEvent::InputChar('i'));
        assert_eq!(input.buffer, "hi");

        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.buffer, "h");
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.handle_event(&TuiEvent::Backspace), None);
    }

    #[test]
    fn multibyte_editing_respects_boundaries() {
        let mut input = InputBox::new();
        input.handle_event(&TuiEvent::InputChar('é'));
        input.handle_event(&TuiEvent::InputChar('x'));
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::CursorLeft);
        input.handle_event(&TuiEvent::Delete);
        assert_eq!(input.buffer, "x");
    }

    #[test]
    fn submit_returns_buffer_and_clears() {
        let mut input = InputBox::new();
        input.buffer = "hello".into();
        input.pos = 5;

        match input.handle_event(&TuiEvent::Submit) {
            Some(InputEvent::Submit(text)) => assert_eq!(text, "hello"),
            other => panic!("expected Submit, got {other:?}"),
        }
        assert!(input.buffer.is_empty());
        assert_eq!(input.pos, 0);
    }

    #[test]
    fn empty_submit_still_fires() {
        let mut input = InputBox::new();
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(InputEvent::Submit(String::new()))
        );
    }

    #[test]
    fn paste_inserts_at_cursor() {
        let mut input = InputBox::new();
        input.buffer = "ad".into();
        input.pos = 1;
        input.handle_event(&TuiEvent::Paste("bc".into()));
        assert_eq!(input.buffer, "abcd");
        assert_eq!(input.pos, 3);
    }

    #[test]
    fn height_grows_then_caps() {
        let mut input = InputBox::new();
        assert_eq!(input.calculate_height(40), 1 + VERTICAL_OVERHEAD);

        input.buffer = "a\nb\nc".into();
        assert_eq!(input.calculate_height(40), 3 + VERTICAL_OVERHEAD);

        input.buffer = "a\nb\nc\nd\ne\nf\ng".into();
        assert_eq!(
            input.calculate_height(40),
            MAX_VISIBLE_LINES + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn home_and_end_work_per_line() {
        let mut input = InputBox::new();
        input.buffer = "ab\ncd".into();
        input.pos = 4; // between 'c' and 'd'
        input.handle_event(&TuiEvent::CursorHome);
        assert_eq!(input.pos, 3);
        input.handle_event(&TuiEvent::CursorEnd);
        assert_eq!(input.pos, 5);
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut input = InputBox::new();
        input.buffer = "abcd\nef".into();
        input.pos = 2; // on 'c'
        input.last_width = 40;

        input.handle_event(&TuiEvent::CursorDown);
        assert_eq!(input.pos, 7); // clamped to end of "ef"
        input.handle_event(&TuiEvent::CursorUp);
        assert_eq!(input.pos, 2);
    }

    #[test]
    fn render_shows_buffer() {
        let backend = TestBackend::new(40, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut input = InputBox::new();
        input.buffer = "draft".into();

        terminal.draw(|f| input.render(f, f.area())).unwrap();

        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("draft"));
        assert!(text.contains("Message"));
    }
}
