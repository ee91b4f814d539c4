//! # Echo transport
//!
//! The built-in offline transport. Streams a short reasoning trace and then
//! echoes the user's message back word by word, pacing deltas with small
//! sleeps so the streaming UI paths are exercised. Wire a real backend by
//! implementing [`ChatTransport`] and passing it to `tui::run`.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;

use super::chat::{ChatTransport, OutboundRequest, TransportError};
use super::types::{Part, Role, StreamEvent};

const DELTA_PACING: Duration = Duration::from_millis(40);

pub struct EchoTransport;

impl EchoTransport {
    async fn emit(
        sender: &Sender<StreamEvent>,
        event: StreamEvent,
    ) -> Result<(), TransportError> {
        sender
            .send(event)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

#[async_trait]
impl ChatTransport for EchoTransport {
    fn name(&self) -> &str {
        "echo"
    }

    async fn stream(
        &self,
        request: OutboundRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| {
                m.parts.iter().find_map(|p| match p {
                    Part::Text { text } => Some(text.clone()),
                    _ => None,
                })
            })
            .unwrap_or_default();

        for chunk in ["Echoing the ", "last user ", "message."] {
            Self::emit(&sender, StreamEvent::ReasoningDelta(chunk.into())).await?;
            sleep(DELTA_PACING).await;
        }

        if prompt.is_empty() {
            Self::emit(
                &sender,
                StreamEvent::TextDelta("You sent an empty message.".into()),
            )
            .await?;
        } else {
            for word in prompt.split_inclusive(' ') {
                Self::emit(&sender, StreamEvent::TextDelta(word.to_string())).await?;
                sleep(DELTA_PACING).await;
            }
        }

        Self::emit(&sender, StreamEvent::Finished).await
    }
}
