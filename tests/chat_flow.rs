//! End-to-end conversation flows against a scripted transport.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use parley::client::{
    ChatClient, ChatOptions, ChatRequest, ChatTransport, OutboundRequest, Part, Role, Status,
    StreamEvent, ToolState, TransportError,
};
use parley::tui::component::EventHandler;
use parley::tui::components::input_box::{InputBox, InputEvent};
use parley::tui::components::toast::{FALLBACK_ERROR_TEXT, Toast};
use parley::tui::event::TuiEvent;

/// Replays a fixed script and records every request it was handed.
struct ScriptedTransport {
    events: Vec<StreamEvent>,
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(
        &self,
        request: OutboundRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request);
        for event in self.events.clone() {
            sender
                .send(event)
                .await
                .map_err(|_| TransportError::ChannelClosed)?;
        }
        Ok(())
    }
}

/// Fails the exchange before producing any events.
struct FailingTransport;

#[async_trait]
impl ChatTransport for FailingTransport {
    fn name(&self) -> &str {
        "failing"
    }

    async fn stream(
        &self,
        _request: OutboundRequest,
        _sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unavailable("no backend".into()))
    }
}

/// Sends one delta, then stalls until aborted.
struct StallingTransport;

#[async_trait]
impl ChatTransport for StallingTransport {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn stream(
        &self,
        _request: OutboundRequest,
        sender: Sender<StreamEvent>,
    ) -> Result<(), TransportError> {
        sender
            .send(StreamEvent::TextDelta("partial".into()))
            .await
            .map_err(|_| TransportError::ChannelClosed)?;
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

fn scripted(events: Vec<StreamEvent>) -> (ChatClient, Arc<Mutex<Vec<OutboundRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let transport = ScriptedTransport {
        events,
        requests: requests.clone(),
    };
    (ChatClient::new(Arc::new(transport)), requests)
}

/// Pumps the client until it settles at `target` or the deadline passes.
async fn pump_until(client: &mut ChatClient, target: Status) {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        client.pump();
        if client.status() == target {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "client never reached {target:?}, stuck at {:?}",
            client.status()
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

fn send(client: &mut ChatClient, text: &str) {
    client.send_message(
        ChatRequest { text: text.into() },
        ChatOptions {
            selected_model: "gpt-4o-mini".into(),
        },
    );
}

#[tokio::test]
async fn hello_round_trip() {
    let (mut client, requests) = scripted(vec![
        StreamEvent::TextDelta("Hi ".into()),
        StreamEvent::TextDelta("there!".into()),
        StreamEvent::Finished,
    ]);

    send(&mut client, "Hello");
    assert_eq!(client.status(), Status::Submitted);

    pump_until(&mut client, Status::Ready).await;

    // The transport saw the full history and the selected model.
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert_eq!(
        requests[0].messages.last().unwrap().parts,
        vec![Part::Text {
            text: "Hello".into()
        }]
    );

    // One user message, one assistant message with the merged text part.
    assert_eq!(client.messages().len(), 2);
    let reply = &client.messages()[1];
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(
        reply.parts,
        vec![Part::Text {
            text: "Hi there!".into()
        }]
    );
}

#[tokio::test]
async fn empty_submission_sends_empty_text() {
    let (mut client, requests) = scripted(vec![StreamEvent::Finished]);
    send(&mut client, "");
    pump_until(&mut client, Status::Ready).await;

    let requests = requests.lock().unwrap();
    assert_eq!(
        requests[0].messages.last().unwrap().parts,
        vec![Part::Text { text: "".into() }]
    );
}

#[tokio::test]
async fn reasoning_then_answer_builds_two_parts() {
    let (mut client, _) = scripted(vec![
        StreamEvent::ReasoningDelta("Considering".into()),
        StreamEvent::ReasoningDelta(" the question.".into()),
        StreamEvent::TextDelta("42".into()),
        StreamEvent::Finished,
    ]);
    send(&mut client, "What is the answer?");
    pump_until(&mut client, Status::Ready).await;

    let reply = client.messages().last().unwrap();
    assert_eq!(
        reply.parts,
        vec![
            Part::Reasoning {
                text: "Considering the question.".into()
            },
            Part::Text { text: "42".into() },
        ]
    );
}

#[tokio::test]
async fn tool_call_reaches_output_available() {
    let (mut client, _) = scripted(vec![
        StreamEvent::ToolCallStart {
            name: "get_weather".into(),
        },
        StreamEvent::ToolInputDelta(r#"{"city":"#.into()),
        StreamEvent::ToolInputDelta(r#""Paris"}"#.into()),
        StreamEvent::ToolOutput(r#"{"temp":21}"#.into()),
        StreamEvent::TextDelta("21C in Paris.".into()),
        StreamEvent::Finished,
    ]);
    send(&mut client, "Weather in Paris?");
    pump_until(&mut client, Status::Ready).await;

    let reply = client.messages().last().unwrap();
    let Part::ToolCall(call) = &reply.parts[0] else {
        panic!("expected a tool call part, got {:?}", reply.parts[0]);
    };
    assert_eq!(call.name, "get_weather");
    assert_eq!(call.state, ToolState::OutputAvailable);
    assert_eq!(call.input, r#"{"city":"Paris"}"#);
    assert_eq!(call.output.as_deref(), Some(r#"{"temp":21}"#));
    assert_eq!(
        reply.parts[1],
        Part::Text {
            text: "21C in Paris.".into()
        }
    );
}

#[tokio::test]
async fn failure_sets_error_and_blank_message_gets_fallback_toast() {
    let (mut client, _) = scripted(vec![StreamEvent::Failed("".into())]);
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_error(move |msg| sink.lock().unwrap().push(msg.to_string()));

    send(&mut client, "Hello");
    pump_until(&mut client, Status::Error).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), [String::new()]);
    assert_eq!(Toast::error(&seen[0]).message, FALLBACK_ERROR_TEXT);
}

#[tokio::test]
async fn failure_with_message_keeps_it_verbatim() {
    let (mut client, _) = scripted(vec![StreamEvent::Failed("model overloaded".into())]);
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_error(move |msg| sink.lock().unwrap().push(msg.to_string()));

    send(&mut client, "Hello");
    pump_until(&mut client, Status::Error).await;

    assert_eq!(Toast::error(&seen.lock().unwrap()[0]).message, "model overloaded");
}

#[tokio::test]
async fn transport_error_leaves_status_at_error() {
    let mut client = ChatClient::new(Arc::new(FailingTransport));
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_error(move |msg| sink.lock().unwrap().push(msg.to_string()));

    send(&mut client, "Hello");
    pump_until(&mut client, Status::Error).await;

    // Let both stream tasks finish, then pump again: nothing the forwarder
    // wound down with may settle the failed exchange back to Ready.
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.pump();
    assert_eq!(client.status(), Status::Error);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["transport unavailable: no backend".to_string()]
    );
}

#[tokio::test]
async fn stop_stays_settled_after_a_late_pump() {
    let mut client = ChatClient::new(Arc::new(StallingTransport));
    send(&mut client, "Hello");

    // Wait for the delta to land on the client's channel, then cancel
    // without draining it first.
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.stop();
    assert_eq!(client.status(), Status::Ready);

    client.pump();
    assert_eq!(client.status(), Status::Ready);
    assert!(!client.is_busy());
}

#[tokio::test]
async fn stop_settles_a_submitted_exchange() {
    // A script that never terminates on its own.
    let (mut client, _) = scripted(vec![]);
    send(&mut client, "Hello");
    assert!(client.is_busy());

    client.stop();
    assert_eq!(client.status(), Status::Ready);
}

#[tokio::test]
async fn input_clears_at_submit_even_while_busy() {
    let (mut client, requests) = scripted(vec![StreamEvent::TextDelta("...".into())]);
    let mut input = InputBox::new();

    for c in "Hello".chars() {
        input.handle_event(&TuiEvent::InputChar(c));
    }
    if let Some(InputEvent::Submit(text)) = input.handle_event(&TuiEvent::Submit) {
        send(&mut client, &text);
    }
    assert!(input.buffer.is_empty(), "input clears at submit time");

    // A second submit while busy: the box clears, but no request goes out.
    for c in "again".chars() {
        input.handle_event(&TuiEvent::InputChar(c));
    }
    if let Some(InputEvent::Submit(text)) = input.handle_event(&TuiEvent::Submit) {
        if !client.is_busy() {
            send(&mut client, &text);
        }
    }
    assert!(input.buffer.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.pump();
    assert_eq!(requests.lock().unwrap().len(), 1);
    assert_eq!(client.messages().iter().filter(|m| m.role == Role::User).count(), 1);
}
