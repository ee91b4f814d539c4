use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// Lifecycle stage of the current exchange, as reported by the chat client.
/// Process-wide for the conversation: there is at most one exchange in flight.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "streaming")]
    Streaming,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "error")]
    Error,
}

impl Status {
    /// A request has been sent but the stream has not settled yet.
    pub fn is_busy(self) -> bool {
        matches!(self, Status::Submitted | Status::Streaming)
    }

    /// Short label for the title bar. Empty when there is nothing to report.
    pub fn label(self) -> &'static str {
        match self {
            Status::Submitted => "sending",
            Status::Streaming => "streaming",
            Status::Ready => "",
            Status::Error => "error",
        }
    }
}

/// Lifecycle state of a tool invocation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    /// The model is still emitting the call's input arguments.
    #[serde(rename = "input-streaming")]
    InputStreaming,
    /// The call completed and its result is attached.
    #[serde(rename = "output-available")]
    OutputAvailable,
}

/// A model-issued request to invoke an external capability.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCallPart {
    pub name: String,
    pub state: ToolState,
    /// Raw input arguments as streamed (usually a JSON string, possibly partial).
    pub input: String,
    pub output: Option<String>,
}

/// One semantically distinct fragment of a message.
///
/// The tag set is open-ended: variants this UI does not understand arrive as
/// `Unknown` and render as nothing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum Part {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "reasoning")]
    Reasoning { text: String },
    #[serde(rename = "tool-call")]
    ToolCall(ToolCallPart),
    #[serde(rename = "unknown")]
    Unknown { tag: String },
}

/// A single conversation message: identifier, role, and ordered parts.
///
/// Messages are insertion-ordered and never reordered; parts are append-only
/// while a response streams. The delta helpers below maintain the invariant
/// that only the last part can be in-progress.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UiMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl UiMessage {
    pub fn user(text: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            parts: vec![Part::Text { text }],
        }
    }

    pub fn assistant() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            parts: Vec::new(),
        }
    }

    /// Appends a text delta to the trailing text part, or opens a new one.
    pub fn push_text_delta(&mut self, chunk: &str) {
        if let Some(Part::Text { text }) = self.parts.last_mut() {
            text.push_str(chunk);
            return;
        }
        self.parts.push(Part::Text {
            text: chunk.to_string(),
        });
    }

    /// Appends a reasoning delta to the trailing reasoning part, or opens a new one.
    pub fn push_reasoning_delta(&mut self, chunk: &str) {
        if let Some(Part::Reasoning { text }) = self.parts.last_mut() {
            text.push_str(chunk);
            return;
        }
        self.parts.push(Part::Reasoning {
            text: chunk.to_string(),
        });
    }

    /// Opens a new tool call part in the input-streaming state.
    pub fn begin_tool_call(&mut self, name: String) {
        self.parts.push(Part::ToolCall(ToolCallPart {
            name,
            state: ToolState::InputStreaming,
            input: String::new(),
            output: None,
        }));
    }

    /// Appends an input delta to the trailing tool call, if it is still open.
    pub fn push_tool_input_delta(&mut self, chunk: &str) {
        if let Some(Part::ToolCall(tc)) = self.parts.last_mut()
            && tc.state == ToolState::InputStreaming
        {
            tc.input.push_str(chunk);
        }
    }

    /// Completes the trailing tool call with its output.
    pub fn finish_tool_call(&mut self, output: String) {
        if let Some(Part::ToolCall(tc)) = self.parts.last_mut() {
            tc.state = ToolState::OutputAvailable;
            tc.output = Some(output);
        }
    }
}

/// Outbound request shape: the message text the user submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub text: String,
}

/// Per-request configuration payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub selected_model: String,
}

/// Events emitted by a transport while a response streams.
///
/// Deltas always target the last part of the last message; the transport is
/// expected to emit them in order and terminate with `Finished` or `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    ReasoningDelta(String),
    ToolCallStart { name: String },
    ToolInputDelta(String),
    ToolOutput(String),
    Finished,
    Failed(String),
}
