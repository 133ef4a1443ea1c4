pub mod events;
pub mod session;
pub mod tool;
pub mod types;

pub use events::{ImageParams, StreamEvent};
pub use session::{ChatSession, ImageRef, StoredMessage, ToolSelection};
pub use tool::{ToolCallRequest, ToolCallResult, ToolDefinition};
pub use types::{ChatMode, ConversationTurn, MessageRole, ToolCallInvocation};
