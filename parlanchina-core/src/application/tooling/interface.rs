use crate::domain::{ToolCallResult, ToolDefinition};
use crate::infrastructure::mcp::ToolInvokeError;
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value};

/// Access to the configured tool servers.
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    fn is_enabled(&self) -> bool;

    fn server_names(&self) -> Vec<String>;

    /// Tools served by one server; empty when MCP is disabled.
    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ToolInvokeError>;

    /// Invokes one tool. Failures are reported through `display_text`.
    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: JsonMap<String, Value>,
    ) -> ToolCallResult;
}
