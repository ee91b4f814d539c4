//! # Toast Component
//!
//! Transient error notice shown top-center over the conversation. Created
//! when a stream fails, dismissed with Esc or after a timeout.

use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::tui::component::Component;

/// Shown when a failure carries no message of its own.
pub const FALLBACK_ERROR_TEXT: &str = "An error occured, please try again later.";

/// How long a toast stays up without being dismissed.
const TOAST_LIFETIME: Duration = Duration::from_secs(6);

const MAX_WIDTH: u16 = 60;

pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

impl Toast {
    /// An error toast; an empty message falls back to the generic text.
    pub fn error(message: &str) -> Self {
        let message = if message.is_empty() {
            FALLBACK_ERROR_TEXT.to_string()
        } else {
            message.to_string()
        };
        Self {
            message,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_LIFETIME
    }
}

impl Component for Toast {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = MAX_WIDTH.min(area.width.saturating_sub(4));
        if width == 0 {
            return;
        }
        let inner = width.saturating_sub(4);
        let text_rows = (self.message.len() as u16 / inner.max(1)) + 1;
        let height = (text_rows + 2).min(area.height);

        let [top] = Layout::vertical([Constraint::Length(height)]).areas(area);
        let [overlay] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(top);

        frame.render_widget(Clear, overlay);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error ")
            .padding(Padding::horizontal(1));
        let body = Paragraph::new(self.message.clone())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Left)
            .block(block);
        frame.render_widget(body, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn empty_message_uses_fallback_text() {
        assert_eq!(Toast::error("").message, FALLBACK_ERROR_TEXT);
    }

    #[test]
    fn non_empty_message_is_kept_verbatim() {
        assert_eq!(Toast::error("rate limited").message, "rate limited");
        assert_eq!(Toast::error("   ").message, "   ");
    }

    #[test]
    fn expires_after_lifetime() {
        let toast = Toast::error("boom");
        let now = toast.shown_at;
        assert!(!toast.is_expired(now));
        assert!(!toast.is_expired(now + TOAST_LIFETIME - Duration::from_millis(1)));
        assert!(toast.is_expired(now + TOAST_LIFETIME));
    }

    #[test]
    fn renders_message_in_overlay() {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut toast = Toast::error("");
        terminal.draw(|f| toast.render(f, f.area())).unwrap();

        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>();
        assert!(text.contains("An error occured"));
        assert!(text.contains("Error"));
    }
}
