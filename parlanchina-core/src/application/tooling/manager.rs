use super::interface::ToolServerInterface;
use crate::config::McpRegistry;
use crate::domain::{ToolCallResult, ToolDefinition};
use crate::infrastructure::mcp::{McpSession, ToolInvokeError};
use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Opens one short-lived MCP connection per listing or call.
pub struct ConnectionManager {
    registry: Arc<McpRegistry>,
    timeout: Duration,
}

impl ConnectionManager {
    pub fn new(registry: Arc<McpRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &Arc<McpRegistry> {
        &self.registry
    }

    async fn with_timeout<T>(
        &self,
        server: &str,
        operation: impl Future<Output = Result<T, ToolInvokeError>>,
    ) -> Result<T, ToolInvokeError> {
        timeout(self.timeout, operation)
            .await
            .unwrap_or_else(|_| {
                Err(ToolInvokeError::Timeout {
                    server: server.to_string(),
                    seconds: self.timeout.as_secs(),
                })
            })
    }
}

#[async_trait]
impl ToolServerInterface for ConnectionManager {
    fn is_enabled(&self) -> bool {
        self.registry.is_enabled()
    }

    fn server_names(&self) -> Vec<String> {
        self.registry.snapshot().server_names()
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ToolInvokeError> {
        let snapshot = self.registry.snapshot();
        if !snapshot.is_enabled() {
            return Ok(Vec::new());
        }
        let config = snapshot
            .server(server)
            .cloned()
            .ok_or_else(|| ToolInvokeError::NotConfigured {
                server: server.to_string(),
            })?;

        let descriptors = self
            .with_timeout(server, async {
                let mut session = McpSession::connect(&config).await?;
                let listed = session.list_tools().await;
                session.close().await;
                listed
            })
            .await?;

        info!(server, tools = descriptors.len(), "Listed MCP tools");
        Ok(descriptors
            .into_iter()
            .map(|tool| {
                ToolDefinition::remote(server, tool.name, tool.description, tool.input_schema)
            })
            .collect())
    }

    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: JsonMap<String, Value>,
    ) -> ToolCallResult {
        let snapshot = self.registry.snapshot();
        if !snapshot.is_enabled() {
            let reason = snapshot
                .disabled_reason()
                .unwrap_or("no servers are configured");
            return ToolCallResult::failure(server, tool, format!("MCP is disabled: {reason}"));
        }
        let Some(config) = snapshot.server(server).cloned() else {
            let err = ToolInvokeError::NotConfigured {
                server: server.to_string(),
            };
            return ToolCallResult::failure(server, tool, failure_text(server, tool, &err));
        };

        let outcome = self
            .with_timeout(server, async {
                let mut session = McpSession::connect(&config).await?;
                let called = session.call_tool(tool, arguments).await;
                session.close().await;
                called
            })
            .await;

        match outcome {
            Ok(result) => {
                info!(server, tool, "MCP tool call completed");
                let display =
                    format!("Result from {server}/{tool}:\n{}", serialize_result(&result));
                ToolCallResult::new(server, tool, result, display)
            }
            Err(err) => {
                warn!(server, tool, %err, "MCP tool call failed");
                ToolCallResult::failure(server, tool, failure_text(server, tool, &err))
            }
        }
    }
}

fn failure_text(server: &str, tool: &str, err: &ToolInvokeError) -> String {
    format!("Failed to run {tool} on {server}: {err}")
}

/// Pretty JSON for display, degrading to compact text if pretty printing fails.
pub fn serialize_result(result: &Value) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
}
