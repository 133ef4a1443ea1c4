use super::error::ToolInvokeError;
use async_trait::async_trait;
use serde_json::Value;

/// Bidirectional JSON-RPC message pipe to one tool server.
#[async_trait]
pub trait McpTransport: Send {
    async fn send(&mut self, message: &Value) -> Result<(), ToolInvokeError>;

    /// Next JSON message from the server, or `None` once the stream ends.
    async fn receive(&mut self) -> Result<Option<Value>, ToolInvokeError>;

    async fn close(&mut self);
}
