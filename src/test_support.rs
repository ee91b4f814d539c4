//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::client::{ChatClient, ChatTransport, OutboundRequest, StreamEvent, TransportError};

/// A transport that never produces events, for tests that only exercise
/// client-side state.
pub struct NoopTransport;

#[async_trait]
impl ChatTransport for NoopTransport {
    fn name(&self) -> &str {
        "noop"
    }

    async fn stream(
        &self,
        _request: OutboundRequest,
        _sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A transport that replays a fixed script of events.
pub struct ScriptedTransport {
    pub events: Vec<StreamEvent>,
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(
        &self,
        _request: OutboundRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        for event in self.events.clone() {
            sender
                .send(event)
                .await
                .map_err(|_| TransportError::ChannelClosed)?;
        }
        Ok(())
    }
}

/// Creates a ChatClient backed by a NoopTransport.
pub fn noop_client() -> ChatClient {
    ChatClient::new(Arc::new(NoopTransport))
}

/// Creates a ChatClient that will replay the given events on send.
pub fn scripted_client(events: Vec<StreamEvent>) -> ChatClient {
    ChatClient::new(Arc::new(ScriptedTransport { events }))
}
