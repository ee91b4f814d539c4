//! UI components. Persistent state structs live alongside their transient
//! render wrappers; see `component.rs` for the pattern.

pub mod input_box;
pub mod message;
pub mod message_list;
pub mod model_picker;
pub mod overview;
pub mod reasoning;
pub mod toast;
pub mod tool_call;

pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use model_picker::{ModelPicker, ModelPickerEvent, ModelPickerState};
pub use overview::Overview;
pub use toast::Toast;
