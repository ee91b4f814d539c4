//! Parley: a terminal chat interface over a pluggable streaming transport.
//!
//! The crate splits into three layers:
//! - [`client`] — conversation state and the `ChatTransport` seam.
//! - [`config`] — TOML config and the model catalog.
//! - [`tui`] — the ratatui adapter: components, event loop, markdown.

pub mod client;
pub mod config;
pub mod tui;

#[cfg(test)]
pub mod test_support;
