//! # Chat client
//!
//! The streaming-chat boundary the UI talks to. `ChatTransport` is the seam:
//! implementors turn an outbound request into a stream of [`StreamEvent`]s.
//! `ChatClient` owns the live message list and status, forwards transport
//! events onto a channel the UI event loop drains, and exposes the
//! send/stop/error surface the controller needs.
//!
//! No retries, no persistence, no timeouts here: a failed stream flips the
//! status to Error and fires the registered error callback, nothing else.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc;

use async_trait::async_trait;
use log::{debug, info, warn};

use super::types::{ChatOptions, ChatRequest, Role, Status, StreamEvent, UiMessage};

/// Errors a transport can report. Exactly one kind is handled by the UI
/// ("send/stream failure"); the variants exist so transports can be precise
/// in logs.
#[derive(Debug)]
pub enum TransportError {
    /// The transport could not start the exchange (bad model id, no backend).
    Unavailable(String),
    /// The stream broke mid-response.
    Stream(String),
    /// The receiving side went away.
    ChannelClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Unavailable(msg) => write!(f, "transport unavailable: {msg}"),
            TransportError::Stream(msg) => write!(f, "stream error: {msg}"),
            TransportError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Everything a transport needs to fulfill one exchange.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Full conversation history, most recent message last.
    pub messages: Vec<UiMessage>,
    /// Model identifier selected for this exchange.
    pub model: String,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Returns the name of the transport, for logging.
    fn name(&self) -> &str;

    /// Streams one model response, sending events to the provided channel.
    /// Must terminate the stream with `Finished` or `Failed`.
    async fn stream(
        &self,
        request: OutboundRequest,
        sender: tokio::sync::mpsc::Sender<StreamEvent>,
    ) -> Result<(), TransportError>;
}

type ErrorCallback = Box<dyn FnMut(&str)>;

/// Conversation handle: message list, status, and the in-flight exchange.
///
/// Single-threaded by design. The async transport work happens on spawned
/// tokio tasks; their events land on an internal channel and are applied when
/// the UI calls [`pump`](Self::pump) from its own event loop.
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
    messages: Vec<UiMessage>,
    status: Status,
    event_tx: mpsc::Sender<(u64, StreamEvent)>,
    event_rx: mpsc::Receiver<(u64, StreamEvent)>,
    on_error: Option<ErrorCallback>,
    /// Abort handles for the current exchange, used by `stop`.
    abort_handles: Vec<tokio::task::AbortHandle>,
    /// Exchange counter. Events are tagged with the generation they belong
    /// to; `pump` ignores events from any earlier exchange, so a cancelled
    /// or superseded stream cannot touch the status after the fact.
    generation: u64,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            transport,
            messages: Vec::new(),
            status: Status::Ready,
            event_tx,
            event_rx,
            on_error: None,
            abort_handles: Vec::new(),
            generation: 0,
        }
    }

    pub fn messages(&self) -> &[UiMessage] {
        &self.messages
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    /// Registers the callback invoked when a stream fails.
    pub fn on_error(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    /// Appends the user's message and spawns the transport stream.
    ///
    /// The request text is sent exactly as given — an empty submission still
    /// produces a request with an empty text field.
    pub fn send_message(&mut self, request: ChatRequest, options: ChatOptions) {
        info!(
            "send_message: {} chars, model {}",
            request.text.len(),
            options.selected_model
        );
        self.messages.push(UiMessage::user(request.text));
        self.status = Status::Submitted;
        self.generation += 1;

        let outbound = OutboundRequest {
            messages: self.messages.clone(),
            model: options.selected_model,
        };
        self.abort_handles = spawn_stream(
            self.transport.clone(),
            outbound,
            self.event_tx.clone(),
            self.generation,
        );
    }

    /// Drains pending stream events into the message list.
    /// Returns true if anything changed (the UI should redraw).
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok((generation, event)) = self.event_rx.try_recv() {
            if generation != self.generation {
                debug!("pump: dropping stale {:?} (gen {generation})", event);
                continue;
            }
            debug!("pump: applying {:?}", event);
            self.apply(event);
            changed = true;
        }
        changed
    }

    /// Cancels the in-flight exchange. Fire-and-forget: tasks are aborted and
    /// a busy status settles to Ready; already-applied parts stay as they are.
    /// Bumping the generation strands any events the aborted tasks already
    /// queued, so a later `pump` cannot flip the status busy again.
    pub fn stop(&mut self) {
        if self.abort_handles.is_empty() && !self.status.is_busy() {
            return;
        }
        info!("stop: aborting {} stream tasks", self.abort_handles.len());
        for handle in self.abort_handles.drain(..) {
            handle.abort();
        }
        self.generation += 1;
        if self.status.is_busy() {
            self.status = Status::Ready;
        }
    }

    fn apply(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::TextDelta(chunk) => {
                self.status = Status::Streaming;
                self.last_assistant().push_text_delta(&chunk);
            }
            StreamEvent::ReasoningDelta(chunk) => {
                self.status = Status::Streaming;
                self.last_assistant().push_reasoning_delta(&chunk);
            }
            StreamEvent::ToolCallStart { name } => {
                self.status = Status::Streaming;
                self.last_assistant().begin_tool_call(name);
            }
            StreamEvent::ToolInputDelta(chunk) => {
                self.last_assistant().push_tool_input_delta(&chunk);
            }
            StreamEvent::ToolOutput(output) => {
                self.last_assistant().finish_tool_call(output);
            }
            StreamEvent::Finished => {
                self.status = Status::Ready;
            }
            StreamEvent::Failed(message) => {
                warn!("stream failed: {message}");
                self.status = Status::Error;
                if let Some(callback) = self.on_error.as_mut() {
                    callback(&message);
                }
            }
        }
    }

    /// The assistant message deltas append to, created on first use.
    fn last_assistant(&mut self) -> &mut UiMessage {
        let needs_new = !matches!(
            self.messages.last(),
            Some(msg) if msg.role == Role::Assistant
        );
        if needs_new {
            self.messages.push(UiMessage::assistant());
        }
        self.messages.last_mut().expect("just ensured non-empty")
    }
}

/// Spawns the transport stream plus a forwarding task, mirroring the two-task
/// shape: the transport writes to an async channel, the forwarder moves events
/// onto the sync channel the UI loop drains.
fn spawn_stream(
    transport: Arc<dyn ChatTransport>,
    request: OutboundRequest,
    tx: mpsc::Sender<(u64, StreamEvent)>,
    generation: u64,
) -> Vec<tokio::task::AbortHandle> {
    let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::channel::<StreamEvent>(100);

    // Transport errors go through the chunk channel so the forwarder sees a
    // real terminal event and never races it with the fallback Finished.
    let error_tx = chunk_tx.clone();
    let stream_handle = tokio::spawn(async move {
        if let Err(e) = transport.stream(request, chunk_tx).await {
            info!("transport error: {e}");
            if error_tx.send(StreamEvent::Failed(e.to_string())).await.is_err() {
                warn!("failed to report transport error: forwarder gone");
            }
        }
    });

    let forward_handle = tokio::spawn(async move {
        let mut saw_terminal = false;
        let mut forwarded = 0usize;
        while let Some(event) = chunk_rx.recv().await {
            forwarded += 1;
            saw_terminal = matches!(event, StreamEvent::Finished | StreamEvent::Failed(_));
            if tx.send((generation, event)).is_err() {
                warn!("failed to forward stream event: receiver dropped");
                return;
            }
            if saw_terminal {
                break;
            }
        }
        // Channel closed without a terminal event: settle the status anyway.
        if !saw_terminal && tx.send((generation, StreamEvent::Finished)).is_err() {
            warn!("failed to send fallback Finished: receiver dropped");
        }
        debug!("stream forwarding done: {forwarded} events");
    });

    vec![stream_handle.abort_handle(), forward_handle.abort_handle()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::types::{Part, ToolState};
    use crate::test_support::noop_client;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn inject(client: &mut ChatClient, events: &[StreamEvent]) {
        for event in events {
            client
                .event_tx
                .send((client.generation, event.clone()))
                .unwrap();
        }
    }

    #[test]
    fn new_client_is_ready_and_empty() {
        let client = noop_client();
        assert_eq!(client.status(), Status::Ready);
        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn send_message_appends_user_message_and_submits() {
        let mut client = noop_client();
        client.send_message(
            ChatRequest {
                text: "Hello".into(),
            },
            ChatOptions {
                selected_model: "test-model".into(),
            },
        );
        assert_eq!(client.status(), Status::Submitted);
        assert_eq!(client.messages().len(), 1);
        assert_eq!(client.messages()[0].role, Role::User);
        assert_eq!(
            client.messages()[0].parts,
            vec![Part::Text {
                text: "Hello".into()
            }]
        );
    }

    #[tokio::test]
    async fn empty_submission_still_sends_empty_text() {
        let mut client = noop_client();
        client.send_message(
            ChatRequest { text: "".into() },
            ChatOptions {
                selected_model: "test-model".into(),
            },
        );
        assert_eq!(
            client.messages()[0].parts,
            vec![Part::Text { text: "".into() }]
        );
        assert_eq!(client.status(), Status::Submitted);
    }

    #[test]
    fn deltas_flip_status_to_streaming_and_build_parts() {
        let mut client = noop_client();
        client.status = Status::Submitted;
        inject(
            &mut client,
            &[
                StreamEvent::ReasoningDelta("Let me ".into()),
                StreamEvent::ReasoningDelta("think.".into()),
                StreamEvent::TextDelta("Answer".into()),
            ],
        );
        assert!(client.pump());
        assert_eq!(client.status(), Status::Streaming);

        let msg = client.messages().last().unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(
            msg.parts,
            vec![
                Part::Reasoning {
                    text: "Let me think.".into()
                },
                Part::Text {
                    text: "Answer".into()
                },
            ]
        );
    }

    #[test]
    fn finished_settles_to_ready() {
        let mut client = noop_client();
        client.status = Status::Streaming;
        inject(&mut client, &[StreamEvent::Finished]);
        client.pump();
        assert_eq!(client.status(), Status::Ready);
    }

    #[test]
    fn failed_sets_error_status_and_fires_callback() {
        let mut client = noop_client();
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        client.on_error(move |msg| sink.borrow_mut().push(msg.to_string()));

        client.status = Status::Streaming;
        inject(&mut client, &[StreamEvent::Failed("boom".into())]);
        client.pump();

        assert_eq!(client.status(), Status::Error);
        assert_eq!(seen.borrow().as_slice(), ["boom".to_string()]);
    }

    #[test]
    fn tool_events_target_the_trailing_part() {
        let mut client = noop_client();
        inject(
            &mut client,
            &[
                StreamEvent::ToolCallStart {
                    name: "get_weather".into(),
                },
                StreamEvent::ToolInputDelta(r#"{"city":"Paris"}"#.into()),
                StreamEvent::ToolOutput(r#"{"temp": 21}"#.into()),
                StreamEvent::TextDelta("It is 21C.".into()),
            ],
        );
        client.pump();

        let msg = client.messages().last().unwrap();
        assert_eq!(msg.parts.len(), 2);
        let Part::ToolCall(tc) = &msg.parts[0] else {
            panic!("expected tool call part");
        };
        assert_eq!(tc.state, ToolState::OutputAvailable);
        assert_eq!(tc.output.as_deref(), Some(r#"{"temp": 21}"#));
    }

    #[test]
    fn pump_without_events_reports_no_change() {
        let mut client = noop_client();
        assert!(!client.pump());
    }

    #[test]
    fn stale_events_after_stop_do_not_reopen_the_stream() {
        let mut client = noop_client();
        client.status = Status::Streaming;
        // A delta the forwarder queued before the tasks were aborted.
        inject(&mut client, &[StreamEvent::TextDelta("late".into())]);

        client.stop();
        assert_eq!(client.status(), Status::Ready);

        assert!(!client.pump());
        assert_eq!(client.status(), Status::Ready);
        assert!(client.messages().is_empty());
    }

    #[test]
    fn events_from_a_superseded_exchange_are_dropped() {
        let mut client = noop_client();
        client.status = Status::Streaming;
        inject(&mut client, &[StreamEvent::Failed("old stream".into())]);

        // A new submission bumps the generation, stranding the old failure.
        client.generation += 1;
        client.status = Status::Submitted;

        client.pump();
        assert_eq!(client.status(), Status::Submitted);
    }

    #[test]
    fn stop_settles_busy_status() {
        let mut client = noop_client();
        client.status = Status::Streaming;
        client.stop();
        assert_eq!(client.status(), Status::Ready);

        // Stopping an idle client changes nothing.
        client.status = Status::Error;
        client.stop();
        assert_eq!(client.status(), Status::Error);
    }
}
