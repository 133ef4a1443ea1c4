use super::error::ToolInvokeError;
use super::protocol::{self, Inbound, ToolDescriptor};
use super::sse::SseTransport;
use super::stdio::StdioTransport;
use super::transport::McpTransport;
use crate::config::{ServerConfig, TransportConfig};
use serde_json::{Map as JsonMap, Value, json};
use tracing::{debug, warn};

/// Upper bound on `tools/list` pages followed for one listing.
const MAX_TOOL_PAGES: usize = 64;

/// One initialized connection to a tool server, scoped to a single operation.
pub struct McpSession {
    server: String,
    transport: Box<dyn McpTransport>,
    next_id: u64,
}

impl McpSession {
    /// Opens the configured transport and performs the initialize handshake.
    pub async fn connect(config: &ServerConfig) -> Result<Self, ToolInvokeError> {
        let transport: Box<dyn McpTransport> = match &config.transport {
            TransportConfig::Stdio { command, args, env } => Box::new(StdioTransport::spawn(
                &config.name,
                command,
                args,
                env,
            )?),
            TransportConfig::Sse { url, headers } => {
                Box::new(SseTransport::connect(&config.name, url, headers).await?)
            }
        };
        Self::with_transport(&config.name, transport).await
    }

    /// Runs the handshake over an already opened transport.
    pub async fn with_transport(
        server: &str,
        transport: Box<dyn McpTransport>,
    ) -> Result<Self, ToolInvokeError> {
        let mut session = Self {
            server: server.to_string(),
            transport,
            next_id: 1,
        };
        if let Err(err) = session.initialize().await {
            session.close().await;
            return Err(err);
        }
        Ok(session)
    }

    async fn initialize(&mut self) -> Result<(), ToolInvokeError> {
        let params = protocol::initialize_params(&self.server);
        let result = self.request("initialize", params).await?;
        if let Some(version) = result.get("protocolVersion").and_then(Value::as_str) {
            debug!(server = %self.server, version, "MCP session initialized");
        }
        let initialized = protocol::notification("notifications/initialized", json!({}));
        self.transport.send(&initialized).await
    }

    /// Lists every tool the server exposes, following `nextCursor`.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..MAX_TOOL_PAGES {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.request("tools/list", params).await?;
            let (page, next) = protocol::parse_tools_page(&result);
            tools.extend(page);
            match next {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => return Ok(tools),
            }
        }
        warn!(server = %self.server, "tools/list pagination limit reached");
        Ok(tools)
    }

    pub async fn call_tool(
        &mut self,
        tool: &str,
        arguments: JsonMap<String, Value>,
    ) -> Result<Value, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": Value::Object(arguments),
        });
        self.request("tools/call", params).await
    }

    pub async fn close(mut self) {
        self.transport.close().await;
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.next_id;
        self.next_id += 1;
        self.transport
            .send(&protocol::request(id, method, params))
            .await?;

        loop {
            let Some(message) = self.transport.receive().await? else {
                return Err(ToolInvokeError::Terminated {
                    server: self.server.clone(),
                });
            };
            match protocol::classify(message) {
                Inbound::Response { id: response_id, outcome } => {
                    if !protocol::id_matches(&response_id, id) {
                        debug!(server = %self.server, %response_id, "response for unknown request");
                        continue;
                    }
                    return outcome.map_err(|failure| ToolInvokeError::Rpc {
                        server: self.server.clone(),
                        code: failure.code,
                        message: failure.message,
                    });
                }
                Inbound::Request { id: request_id, method } => {
                    self.answer_server_request(request_id, &method).await?;
                }
                Inbound::Notification { method } => {
                    debug!(server = %self.server, method, "received notification from server");
                }
                Inbound::Unknown => {
                    debug!(server = %self.server, "ignoring unrecognized message");
                }
            }
        }
    }

    async fn answer_server_request(
        &mut self,
        id: Value,
        method: &str,
    ) -> Result<(), ToolInvokeError> {
        let reply = if method == "ping" {
            protocol::ping_reply(id)
        } else {
            warn!(server = %self.server, method, "server sent unsupported request");
            protocol::method_not_found(id, method)
        };
        self.transport.send(&reply).await
    }
}
