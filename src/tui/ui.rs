//! # UI Layout
//!
//! Top-level frame composition: title bar, conversation area (overview or
//! message list), input box, and the overlays (toast, model picker) drawn
//! last so they sit on top.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::client::{ChatClient, Status};
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, ModelPicker, Overview};

/// Splits the frame into title / conversation / input rows. Shared with the
/// event loop so mouse hit testing sees the same rects the renderer drew.
pub fn layout_areas(area: Rect, input_height: u16) -> (Rect, Rect, Rect) {
    let [title, main, input] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(input_height),
    ])
    .areas(area);
    (title, main, input)
}

pub fn draw_ui(
    frame: &mut Frame,
    client: &ChatClient,
    tui: &mut TuiState,
    spinner_frame: usize,
    now: Instant,
) {
    let area = frame.area();
    let input_height = tui.input_box.calculate_height(area.width);
    let (title_area, main_area, input_area) = layout_areas(area, input_height);

    draw_title(frame, title_area, &tui.selected_model, client.status());

    if client.messages().is_empty() {
        Overview.render(frame, main_area);
    } else {
        let mut list = MessageList {
            state: &mut tui.message_list,
            messages: client.messages(),
            status: client.status(),
            spinner_frame,
            now,
        };
        list.render(frame, main_area);
    }

    tui.input_box.render(frame, input_area);

    // Overlays last.
    if let Some(toast) = tui.toast.as_mut() {
        toast.render(frame, main_area);
    }
    if let Some(picker) = tui.picker.as_mut() {
        ModelPicker::new(picker, &tui.selected_model).render(frame, area);
    }
}

fn draw_title(frame: &mut Frame, area: Rect, model: &str, status: Status) {
    let mut spans = vec![
        Span::styled(
            " Parley ",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("model: {model}"),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let label = status.label();
    if !label.is_empty() {
        let color = match status {
            Status::Error => Color::Red,
            _ => Color::Yellow,
        };
        spans.push(Span::styled(
            format!("  [{label}]"),
            Style::default().fg(color),
        ));
    }
    if status.is_busy() {
        spans.push(Span::styled(
            "  Esc to stop",
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
