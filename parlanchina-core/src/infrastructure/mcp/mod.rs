//! MCP client: JSON-RPC over stdio pipes or an SSE event stream.

pub mod client;
pub mod error;
pub mod protocol;
pub mod sse;
pub mod stdio;
pub mod transport;

pub use client::McpSession;
pub use error::ToolInvokeError;
pub use protocol::ToolDescriptor;
pub use transport::McpTransport;
