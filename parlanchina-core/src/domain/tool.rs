use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value, json};

/// Prefix shared by every built-in tool id.
pub const INTERNAL_PREFIX: &str = "internal";

/// A callable, schema-described tool in the merged id space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// `internal.<name>` or `<server>.<tool>`.
    pub id: String,
    pub server: Option<String>,
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl ToolDefinition {
    pub fn internal(
        short_name: &str,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            id: format!("{INTERNAL_PREFIX}.{short_name}"),
            server: None,
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    pub fn remote(
        server: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Option<Value>,
    ) -> Self {
        let server = server.into();
        let name = name.into();
        Self {
            id: format!("{server}.{name}"),
            server: Some(server),
            name,
            description: description.into(),
            schema: schema
                .filter(Value::is_object)
                .unwrap_or_else(empty_object_schema),
        }
    }
}

pub fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Splits a canonical tool id into `(namespace, tool)` at the first dot.
pub fn split_tool_id(id: &str) -> Option<(&str, &str)> {
    id.split_once('.')
        .filter(|(namespace, tool)| !namespace.is_empty() && !tool.is_empty())
}

pub fn is_internal_id(id: &str) -> bool {
    matches!(split_tool_id(id), Some((INTERNAL_PREFIX, _)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub tool_id: String,
    pub arguments: JsonMap<String, Value>,
}

impl ToolCallRequest {
    pub fn new(tool_id: impl Into<String>, arguments: JsonMap<String, Value>) -> Self {
        Self {
            tool_id: tool_id.into(),
            arguments,
        }
    }

    pub fn is_internal(&self) -> bool {
        is_internal_id(&self.tool_id)
    }
}

/// Outcome of one tool invocation. `display_text` is never empty, failures
/// included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult {
    pub server_name: String,
    pub tool_name: String,
    pub raw_result: Value,
    pub display_text: String,
    /// Set for failures reported as text and for MCP results flagged
    /// `isError: true`.
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn new(
        server_name: impl Into<String>,
        tool_name: impl Into<String>,
        raw_result: Value,
        display_text: impl Into<String>,
    ) -> Self {
        let server_name = server_name.into();
        let tool_name = tool_name.into();
        let mut display_text = display_text.into();
        if display_text.trim().is_empty() {
            display_text = format!("{server_name}/{tool_name} returned no output.");
        }
        let is_error = raw_result.get("isError").and_then(Value::as_bool) == Some(true);
        Self {
            server_name,
            tool_name,
            raw_result,
            display_text,
            is_error,
        }
    }

    pub fn failure(
        server_name: impl Into<String>,
        tool_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            is_error: true,
            ..Self::new(server_name, tool_name, Value::Null, message)
        }
    }
}
