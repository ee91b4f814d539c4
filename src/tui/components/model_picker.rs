//! # Model Picker Component
//!
//! Centered overlay for switching models at runtime. Opened with Ctrl+M.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `ModelPickerState` lives in `TuiState` while the overlay is open
//! - `ModelPicker` is created each frame with borrowed state

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::config::ModelEntry;
use crate::tui::event::TuiEvent;

/// Persistent state for the model picker overlay.
pub struct ModelPickerState {
    pub models: Vec<ModelEntry>,
    pub selected: usize,
    pub list_state: ListState,
}

impl ModelPickerState {
    /// Opens the picker with the current model pre-selected.
    pub fn new(models: Vec<ModelEntry>, current: &str) -> Self {
        let selected = models
            .iter()
            .position(|m| m.name == current)
            .unwrap_or(0);
        let mut list_state = ListState::default();
        if !models.is_empty() {
            list_state.select(Some(selected));
        }
        Self {
            models,
            selected,
            list_state,
        }
    }

    pub fn handle_event(&mut self, event: &TuiEvent) -> Option<ModelPickerEvent> {
        match event {
            TuiEvent::Escape => Some(ModelPickerEvent::Dismiss),
            TuiEvent::CursorUp | TuiEvent::ScrollUp => {
                if !self.models.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::CursorDown | TuiEvent::ScrollDown => {
                if !self.models.is_empty() {
                    self.selected = (self.selected + 1).min(self.models.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::Submit => self
                .models
                .get(self.selected)
                .map(|model| ModelPickerEvent::Select(model.clone())),
            _ => None,
        }
    }
}

/// Events emitted by the model picker.
pub enum ModelPickerEvent {
    Select(ModelEntry),
    Dismiss,
}

/// Transient render wrapper for the model picker overlay.
pub struct ModelPicker<'a> {
    state: &'a mut ModelPickerState,
    current_model: &'a str,
}

impl<'a> ModelPicker<'a> {
    pub fn new(state: &'a mut ModelPickerState, current_model: &'a str) -> Self {
        Self {
            state,
            current_model,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let height = (self.state.models.len() as u16 + 2).clamp(5, area.height);
        let overlay = centered_rect(50, height, area);

        // Clear underlying content
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Models ")
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(" Enter Select  Esc Back ").centered())
            .padding(Padding::horizontal(1));

        if self.state.models.is_empty() {
            let empty = Paragraph::new(
                "No models configured.\nAdd [[models]] entries to ~/.parley/config.toml",
            )
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        let items: Vec<ListItem> = self
            .state
            .models
            .iter()
            .enumerate()
            .map(|(i, model)| {
                let is_active = model.name == self.current_model;
                let style = if i == self.state.selected {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else if is_active {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::Gray)
                };

                let mut spans = vec![Span::styled(model.name.clone(), style)];
                if let Some(desc) = &model.description {
                    spans.push(Span::styled(
                        format!("  {desc}"),
                        if i == self.state.selected {
                            style
                        } else {
                            Style::default().fg(Color::DarkGray)
                        },
                    ));
                }
                if is_active {
                    spans.push(Span::styled(" *", style));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}

/// Centered rect: fixed height, percentage width.
fn centered_rect(percent_x: u16, height: u16, outer: Rect) -> Rect {
    let [center_v] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(outer);
    let [center] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(center_v);
    center
}
