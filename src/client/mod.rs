pub mod chat;
pub mod echo;
pub mod types;

pub use chat::{ChatClient, ChatTransport, OutboundRequest, TransportError};
pub use echo::EchoTransport;
pub use types::{
    ChatOptions, ChatRequest, Part, Role, Status, StreamEvent, ToolCallPart, ToolState, UiMessage,
};
