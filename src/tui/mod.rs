//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI, and
//! routes keyboard and mouse events to the components and the chat client.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The event loop uses conditional redraw to avoid unnecessary work:
//!
//! - **Animating** (streaming response, reveal transition, toast): draws
//!   every ~80ms so spinners and the expand/collapse motion stay smooth.
//! - **Idle**: sleeps up to 500ms, only redraws on events.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous
//! redraws.

pub mod animate;
pub mod component;
pub mod components;
pub mod event;
pub mod markdown;
pub mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::info;

use crate::client::{ChatClient, ChatOptions, ChatRequest, ChatTransport};
use crate::config::ResolvedConfig;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    InputBox, InputEvent, MessageListState, ModelPickerEvent, ModelPickerState, Toast,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of the conversation data).
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Model used for the next send; session-scoped, changed via the picker.
    pub selected_model: String,
    /// Model picker overlay (None = hidden)
    pub picker: Option<ModelPickerState>,
    /// Error toast (None = hidden)
    pub toast: Option<Toast>,
}

impl TuiState {
    pub fn new(selected_model: String) -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            selected_model,
            picker: None,
            toast: None,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // The keyboard enhancement flags let terminals report Ctrl+M as
        // distinct from Enter; terminals without the protocol ignore them.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig, transport: Arc<dyn ChatTransport>) -> std::io::Result<()> {
    let mut client = ChatClient::new(transport);

    // Stream failures surface as toasts; the callback can't borrow the TUI
    // state, so errors travel over a channel drained each loop turn.
    let (toast_tx, toast_rx) = mpsc::channel::<String>();
    client.on_error(move |msg| {
        let _ = toast_tx.send(msg.to_string());
    });

    let mut tui = TuiState::new(config.default_model.clone());

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    loop {
        let now = Instant::now();

        if tui.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            tui.toast = None;
            needs_redraw = true;
        }

        let animating =
            client.is_busy() || tui.toast.is_some() || tui.message_list.is_animating(now);
        if animating {
            needs_redraw = true;
        }

        // Only draw when something changed
        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &client, &mut tui, spinner_frame, now))?;
            needs_redraw = false;
        }

        // Dynamic poll timeout: short when animating (~12fps), long when idle
        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        let mut should_quit = false;
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            // Resize just needs a redraw (already flagged above)
            if matches!(event, TuiEvent::Resize) {
                continue;
            }

            // ForceQuit (Ctrl+C) always quits
            if matches!(event, TuiEvent::ForceQuit) {
                should_quit = true;
                continue;
            }

            if matches!(event, TuiEvent::OpenModelPicker) {
                tui.picker = Some(ModelPickerState::new(
                    config.models.clone(),
                    &tui.selected_model,
                ));
                continue;
            }

            // When the picker is open, it captures all events
            if let Some(picker) = tui.picker.as_mut() {
                if let Some(picker_event) = picker.handle_event(&event) {
                    match picker_event {
                        ModelPickerEvent::Select(entry) => {
                            info!("model switched to {}", entry.name);
                            tui.selected_model = entry.name;
                            tui.picker = None;
                        }
                        ModelPickerEvent::Dismiss => {
                            tui.picker = None;
                        }
                    }
                }
                continue;
            }

            // Click on a settled reasoning header toggles it
            if let TuiEvent::MouseClick(_col, row) = event {
                let frame_area = terminal.get_frame().area();
                let input_height = tui.input_box.calculate_height(frame_area.width);
                let (_, main_area, _) = ui::layout_areas(frame_area, input_height);
                if row >= main_area.y && row < main_area.y + main_area.height {
                    let content_y =
                        (row - main_area.y) + tui.message_list.scroll_state.offset().y;
                    if let Some(key) = tui.message_list.hit_test_reasoning(content_y, now) {
                        tui.message_list.toggle_reasoning(key, now);
                    }
                }
                continue;
            }

            // Scroll events always go to the message list
            if matches!(
                event,
                TuiEvent::ScrollUp
                    | TuiEvent::ScrollDown
                    | TuiEvent::ScrollPageUp
                    | TuiEvent::ScrollPageDown
            ) {
                tui.message_list.handle_event(&event);
                continue;
            }

            // Esc: stop a running stream, otherwise dismiss the toast
            if matches!(event, TuiEvent::Escape) {
                if client.is_busy() {
                    client.stop();
                } else if tui.toast.is_some() {
                    tui.toast = None;
                }
                continue;
            }

            // InputBox handles everything else
            if let Some(input_event) = tui.input_box.handle_event(&event) {
                match input_event {
                    InputEvent::Submit(text) => {
                        // The box already cleared itself; a busy client just
                        // drops the send.
                        if !client.is_busy() {
                            tui.message_list.stick_to_bottom = true;
                            client.send_message(
                                ChatRequest { text },
                                ChatOptions {
                                    selected_model: tui.selected_model.clone(),
                                },
                            );
                        }
                    }
                    InputEvent::ContentChanged => {}
                }
            }
        }

        if should_quit {
            break;
        }

        // Apply streamed events from the background tasks
        if client.pump() {
            needs_redraw = true;
        }
        while let Ok(message) = toast_rx.try_recv() {
            tui.toast = Some(Toast::error(&message));
            needs_redraw = true;
        }
    }

    ratatui::restore();
    Ok(())
}
