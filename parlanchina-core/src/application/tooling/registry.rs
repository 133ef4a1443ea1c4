use super::interface::ToolServerInterface;
use super::internal::InternalToolExecutor;
use super::naming::ToolNameMap;
use crate::domain::tool::split_tool_id;
use crate::domain::{ToolCallRequest, ToolCallResult, ToolDefinition, ToolSelection};
use serde_json::{Map as JsonMap, Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Tools resolved for one dispatch turn.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTools {
    pub definitions: Vec<ToolDefinition>,
    /// Function-tool payloads offered to the model.
    pub schemas: Vec<Value>,
    pub names: ToolNameMap,
}

impl ResolvedTools {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Safe names offered to the model, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        self.names.names().map(str::to_string).collect()
    }
}

/// Merges built-in tools and MCP servers into one id space.
pub struct ToolRegistry {
    internal: InternalToolExecutor,
    servers: Arc<dyn ToolServerInterface>,
}

impl ToolRegistry {
    pub fn new(internal: InternalToolExecutor, servers: Arc<dyn ToolServerInterface>) -> Self {
        Self { internal, servers }
    }

    pub fn internal_tools(&self) -> &[ToolDefinition] {
        self.internal.catalog().tools()
    }

    pub fn internal_ids(&self) -> Vec<String> {
        self.internal.catalog().ids()
    }

    pub fn servers(&self) -> &Arc<dyn ToolServerInterface> {
        &self.servers
    }

    /// Resolves the enabled ids into definitions, schemas and safe names.
    ///
    /// Deterministic for a fixed selection: internal tools first, then MCP
    /// tools, each in sorted id order. Every server is listed at most once.
    pub async fn resolve(&self, selection: &ToolSelection) -> ResolvedTools {
        let mut definitions = Vec::new();
        let mut seen = HashSet::new();

        for id in &selection.internal {
            match self.internal.catalog().definition(id) {
                Some(definition) if seen.insert(definition.id.clone()) => {
                    definitions.push(definition.clone())
                }
                Some(_) => {}
                None => debug!(tool = %id, "Skipping unknown internal tool"),
            }
        }

        let mut by_server: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for id in &selection.mcp {
            match split_tool_id(id) {
                Some((server, tool)) => by_server.entry(server).or_default().push(tool),
                None => debug!(tool = %id, "Skipping tool id without server prefix"),
            }
        }

        for (server, wanted) in by_server {
            let listed = match self.servers.list_tools(server).await {
                Ok(tools) => tools,
                Err(err) => {
                    warn!(server, %err, "Failed to list MCP tools; skipping server");
                    continue;
                }
            };
            let by_name: HashMap<&str, &ToolDefinition> =
                listed.iter().map(|tool| (tool.name.as_str(), tool)).collect();
            for tool in wanted {
                match by_name.get(tool) {
                    Some(definition) if seen.insert(definition.id.clone()) => {
                        definitions.push((*definition).clone())
                    }
                    Some(_) => {}
                    None => debug!(server, tool, "Skipping tool not offered by server"),
                }
            }
        }

        let names = ToolNameMap::build(definitions.iter().map(|tool| tool.id.as_str()));
        let schemas = definitions
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": names.safe_name(&tool.id).unwrap_or(tool.id.as_str()),
                        "description": tool.description,
                        "parameters": tool.schema,
                    }
                })
            })
            .collect();

        ResolvedTools {
            definitions,
            schemas,
            names,
        }
    }

    /// Every tool of every configured server.
    pub async fn list_all_tools(&self) -> Vec<ToolDefinition> {
        if !self.servers.is_enabled() {
            return Vec::new();
        }
        let mut tools = Vec::new();
        for server in self.servers.server_names() {
            match self.servers.list_tools(&server).await {
                Ok(listed) => tools.extend(listed),
                Err(err) => warn!(server = %server, %err, "Failed to list MCP tools"),
            }
        }
        tools
    }

    /// Runs a canonical tool id. Never fails; errors come back as text.
    pub async fn execute(&self, request: ToolCallRequest) -> ToolCallResult {
        if request.is_internal() {
            return self
                .internal
                .execute(&request.tool_id, &request.arguments)
                .await;
        }
        let ToolCallRequest { tool_id, arguments } = request;
        match split_tool_id(&tool_id) {
            Some((server, tool)) => self.servers.call_tool(server, tool, arguments).await,
            None => ToolCallResult::failure(
                "",
                tool_id.as_str(),
                format!("Tool name {tool_id} is not in server.tool format."),
            ),
        }
    }
}
