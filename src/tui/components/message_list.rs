//! # MessageList Component
//!
//! Scrollable view of conversation history.
//!
//! ## Responsibilities
//!
//! - Display the message blocks with their parts
//! - Manage scrolling specific logic
//! - Hit testing for mouse interactions
//! - Equality-gated build cache per message
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the live conversation
//! data as props.
//!
//! Since `Component::render` takes `&mut self`, we can safely mutate the state
//! (including the build cache and scroll state) during the render pass,
//! aligning with Ratatui's `StatefulWidget` pattern.
//!
//! ## Build cache
//!
//! Each message keeps a [`CachedMessage`]: the status and parts it was last
//! built against, plus the pre-rendered blocks. A message is rebuilt only
//! when its parts or the conversation status changed since the last frame
//! (or the content width changed, which invalidates everything). During
//! streaming only the growing tail message fails the equality check, so the
//! settled history is never re-parsed.
//!
//! Reveal animation state lives outside the cache on purpose: a running
//! expand/collapse changes display heights every frame, but never the built
//! text, so it must not force rebuilds.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::client::{Part, Status, UiMessage};
use crate::tui::animate::{Transition, revealed_rows};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::{
    AVATAR_GUTTER, BuiltMessage, BuiltPart, TextPartView, avatar_span, build_message,
};
use crate::tui::components::reasoning::{self, HEADER_HEIGHT, ReasoningBody};
use crate::tui::components::tool_call;
use crate::tui::event::TuiEvent;

/// Blank rows between consecutive message blocks.
const MESSAGE_GAP: u16 = 1;

/// A (message index, part index) pair identifying one reasoning part.
type PartKey = (usize, usize);

/// One message's build-cache entry: the inputs it was built from and the
/// resulting blocks. Rebuilt only when the inputs stop comparing equal.
struct CachedMessage {
    status: Status,
    parts: Vec<Part>,
    built: BuiltMessage,
}

/// Layout, scroll, and expansion state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Per-message build cache
    blocks: Vec<CachedMessage>,
    /// Width the cache was built for
    built_width: u16,
    /// Total message builds performed (exposed for cache tests)
    pub rebuild_count: usize,
    /// Reasoning parts currently shown open
    expanded: HashSet<PartKey>,
    /// Running (or settled) reveal transitions per reasoning part
    transitions: HashMap<PartKey, Transition>,
    /// The reasoning part being streamed right now, if any
    active_reasoning: Option<PartKey>,
    /// Display height of each message block (including trailing gap)
    pub heights: Vec<u16>,
    /// Cumulative heights for binary-searched visibility and hit testing
    pub prefix_heights: Vec<u16>,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true, // Start attached to bottom
            viewport_height: 0,
            blocks: Vec::new(),
            built_width: 0,
            rebuild_count: 0,
            expanded: HashSet::new(),
            transitions: HashMap::new(),
            active_reasoning: None,
            heights: Vec::new(),
            prefix_heights: Vec::new(),
        }
    }

    /// Brings the build cache, expansion state, and layout in line with the
    /// conversation. Called once per frame before drawing.
    pub fn sync(&mut self, messages: &[UiMessage], status: Status, width: u16, now: Instant) {
        if width != self.built_width {
            self.blocks.clear();
            self.built_width = width;
        }
        self.blocks.truncate(messages.len());

        for (i, message) in messages.iter().enumerate() {
            let fresh = match self.blocks.get(i) {
                Some(cached) => cached.status != status || cached.parts != message.parts,
                None => true,
            };
            if fresh {
                let entry = CachedMessage {
                    status,
                    parts: message.parts.clone(),
                    built: build_message(message, width),
                };
                self.rebuild_count += 1;
                if i < self.blocks.len() {
                    self.blocks[i] = entry;
                } else {
                    self.blocks.push(entry);
                }
            }
        }

        self.update_active_reasoning(messages, status, now);
        self.rebuild_heights(now);
    }

    /// Tracks the actively streaming reasoning part: the last part of the
    /// latest message while status is `Streaming`. Activation forces the
    /// part open; deactivation collapses it, in both cases through the
    /// reveal transition.
    fn update_active_reasoning(&mut self, messages: &[UiMessage], status: Status, now: Instant) {
        let wanted = if status == Status::Streaming {
            messages.last().and_then(|m| {
                let pi = m.parts.len().checked_sub(1)?;
                matches!(m.parts[pi], Part::Reasoning { .. })
                    .then_some((messages.len() - 1, pi))
            })
        } else {
            None
        };

        if wanted == self.active_reasoning {
            return;
        }
        if let Some(old) = self.active_reasoning.take() {
            self.expanded.remove(&old);
            self.transitions
                .entry(old)
                .or_insert_with(|| Transition::settled(true))
                .toward(false, now);
        }
        if let Some(new) = wanted {
            self.expanded.insert(new);
            self.transitions
                .entry(new)
                .or_insert_with(|| Transition::settled(false))
                .toward(true, now);
        }
        self.active_reasoning = wanted;
    }

    /// User toggle for a settled reasoning part. Ignored while the part is
    /// still streaming (it is forced open).
    pub fn toggle_reasoning(&mut self, key: PartKey, now: Instant) {
        if self.active_reasoning == Some(key) {
            return;
        }
        let open = !self.expanded.contains(&key);
        if open {
            self.expanded.insert(key);
        } else {
            self.expanded.remove(&key);
        }
        self.transitions
            .entry(key)
            .or_insert_with(|| Transition::settled(!open))
            .toward(open, now);
    }

    pub fn is_expanded(&self, key: PartKey) -> bool {
        self.expanded.contains(&key)
    }

    /// True while any reveal transition is mid-flight; drives the fast
    /// frame cadence in the event loop.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.transitions.values().any(|t| t.is_animating(now))
    }

    fn reveal_fraction(&self, key: PartKey, now: Instant) -> f32 {
        match self.transitions.get(&key) {
            Some(t) => t.fraction_at(now),
            None if self.expanded.contains(&key) => 1.0,
            None => 0.0,
        }
    }

    /// Rows the part occupies on screen right now, reveal included.
    fn part_display_height(&self, key: PartKey, part: &BuiltPart, now: Instant) -> u16 {
        match part {
            BuiltPart::Text { height, .. } => *height,
            BuiltPart::Reasoning { body_height, .. } => {
                let revealed = revealed_rows(*body_height, self.reveal_fraction(key, now));
                HEADER_HEIGHT + revealed
            }
            BuiltPart::Tool => 1,
            BuiltPart::Hidden => 0,
        }
    }

    fn rebuild_heights(&mut self, now: Instant) {
        self.heights = (0..self.blocks.len())
            .map(|mi| {
                let block = &self.blocks[mi];
                let body: u16 = block
                    .built
                    .parts
                    .iter()
                    .enumerate()
                    .map(|(pi, part)| self.part_display_height((mi, pi), part, now))
                    .sum();
                body + MESSAGE_GAP
            })
            .collect();
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    /// Maps a content-space row to the reasoning part whose header sits on
    /// it, if any. `content_y` already includes the scroll offset.
    pub fn hit_test_reasoning(&self, content_y: u16, now: Instant) -> Option<PartKey> {
        let mi = self.prefix_heights.partition_point(|&end| end <= content_y);
        let block = self.blocks.get(mi)?;
        let mut y = if mi == 0 {
            0
        } else {
            self.prefix_heights[mi - 1]
        };
        for (pi, part) in block.built.parts.iter().enumerate() {
            let h = self.part_display_height((mi, pi), part, now);
            if matches!(part, BuiltPart::Reasoning { .. })
                && content_y >= y
                && content_y < y + HEADER_HEIGHT
            {
                return Some((mi, pi));
            }
            y += h;
        }
        None
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    /// Prevents overscrolling past the last message.
    pub fn clamp_scroll(&mut self) {
        let total: u16 = self.heights.iter().sum();
        let max_y = total.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the
    /// bottom. Called on scroll-down events so that scrolling past the end
    /// re-pins to bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let total: u16 = self.heights.iter().sum();
        let max_y = total.saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Messages whose rows overlap the viewport, with half a viewport of
    /// buffer on each side.
    fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    // Mutable reference to persistent state
    pub state: &'a mut MessageListState,
    pub messages: &'a [UiMessage],
    pub status: Status,
    pub spinner_frame: usize,
    pub now: Instant,
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        self.state
            .sync(self.messages, self.status, content_width, self.now);

        let total_height: u16 = self.state.heights.iter().sum();
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible = self.state.visible_range(scroll_offset, area.height);

        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height.max(1)))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let latest = self.messages.len().saturating_sub(1);
        for mi in visible {
            let mut y = if mi == 0 {
                0
            } else {
                self.state.prefix_heights[mi - 1]
            };
            let block = &self.state.blocks[mi];
            let message = &self.messages[mi];
            let is_latest = mi == latest;

            let (x, part_width) = if block.built.role == crate::client::Role::Assistant {
                (AVATAR_GUTTER, content_width.saturating_sub(AVATAR_GUTTER))
            } else {
                (0, content_width)
            };
            if block.built.role == crate::client::Role::Assistant {
                let avatar = Paragraph::new(Line::from(avatar_span()));
                scroll_view.render_widget(avatar, Rect::new(0, y, AVATAR_GUTTER, 1));
            }

            for (pi, part) in block.built.parts.iter().enumerate() {
                let key = (mi, pi);
                let h = self.state.part_display_height(key, part, self.now);
                if h == 0 {
                    continue;
                }
                match part {
                    BuiltPart::Text { text, boxed, .. } => {
                        let view = TextPartView { text, boxed: *boxed };
                        scroll_view.render_widget(view, Rect::new(x, y, part_width, h));
                    }
                    BuiltPart::Reasoning { body, .. } => {
                        let active = self.state.active_reasoning == Some(key);
                        let expanded = self.state.is_expanded(key);
                        let header = Paragraph::new(reasoning::header_line(
                            active,
                            expanded,
                            self.spinner_frame,
                        ));
                        scroll_view
                            .render_widget(header, Rect::new(x, y, part_width, HEADER_HEIGHT));

                        let revealed = h - HEADER_HEIGHT;
                        if revealed > 0 {
                            let in_motion = self
                                .state
                                .transitions
                                .get(&key)
                                .is_some_and(|t| t.is_animating(self.now));
                            let view = ReasoningBody { body, in_motion };
                            scroll_view.render_widget(
                                view,
                                Rect::new(x, y + HEADER_HEIGHT, part_width, revealed),
                            );
                        }
                    }
                    BuiltPart::Tool => {
                        if let Some(Part::ToolCall(call)) = message.parts.get(pi) {
                            let row = Paragraph::new(tool_call::row_line(
                                call,
                                is_latest,
                                self.status,
                                self.spinner_frame,
                            ));
                            scroll_view.render_widget(row, Rect::new(x, y, part_width, 1));
                        }
                    }
                    BuiltPart::Hidden => {}
                }
                y += h;
            }
        }

        // Auto-scroll logic (Mutation)
        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler lives on `MessageListState` rather than `MessageList`: event
/// handling needs the persistent scroll state, and the transient component
/// is recreated each frame with fresh props.
impl EventHandler for MessageListState {
    type Event = (); // scroll handled internally; clicks routed by the parent

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
                None
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
                None
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
                None
            }
            _ => None,
        }
    }
}
