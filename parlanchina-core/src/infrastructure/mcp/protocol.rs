//! JSON-RPC 2.0 message shapes used by the MCP client.

use serde_json::{Value, json};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const JSONRPC_VERSION: &str = "2.0";
pub const METHOD_NOT_FOUND: i64 = -32601;

pub fn request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
        "params": params,
    })
}

pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}

pub fn initialize_params(server: &str) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": format!("parlanchina-{server}"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {}
    })
}

pub fn ping_reply(id: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": {},
    })
}

pub fn method_not_found(id: Value, method: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": {
            "code": METHOD_NOT_FOUND,
            "message": format!("client does not implement method '{method}'"),
        },
    })
}

/// A message received from a server, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response {
        id: Value,
        outcome: Result<Value, RpcFailure>,
    },
    Request {
        id: Value,
        method: String,
    },
    Notification {
        method: String,
    },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFailure {
    pub code: i64,
    pub message: String,
}

pub fn classify(mut value: Value) -> Inbound {
    let method = value
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);
    let id = value.get_mut("id").map(Value::take).filter(|id| !id.is_null());

    match (id, method) {
        (Some(id), Some(method)) => Inbound::Request { id, method },
        (None, Some(method)) => Inbound::Notification { method },
        (Some(id), None) => {
            let outcome = match value.get("error") {
                Some(error) => Err(RpcFailure {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                }),
                None => Ok(value.get_mut("result").map(Value::take).unwrap_or(Value::Null)),
            };
            Inbound::Response { id, outcome }
        }
        (None, None) => Inbound::Unknown,
    }
}

/// Whether a response id refers to the request we issued.
pub fn id_matches(id: &Value, expected: u64) -> bool {
    match id {
        Value::Number(number) => number.as_u64() == Some(expected),
        Value::String(text) => text.parse::<u64>().ok() == Some(expected),
        _ => false,
    }
}

/// A tool as described by a `tools/list` page.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Option<Value>,
}

/// Parses one `tools/list` page, returning the tools and the next cursor.
pub fn parse_tools_page(result: &Value) -> (Vec<ToolDescriptor>, Option<String>) {
    let tools = result
        .get("tools")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|tool| {
                    let name = tool.get("name").and_then(Value::as_str)?;
                    let description = tool
                        .get("description")
                        .and_then(Value::as_str)
                        .filter(|text| !text.is_empty())
                        .or_else(|| tool.get("title").and_then(Value::as_str))
                        .unwrap_or_default()
                        .to_string();
                    let input_schema = tool
                        .get("inputSchema")
                        .or_else(|| tool.get("input_schema"))
                        .filter(|schema| schema.is_object())
                        .cloned();
                    Some(ToolDescriptor {
                        name: name.to_string(),
                        description,
                        input_schema,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let cursor = result
        .get("nextCursor")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_string);
    (tools, cursor)
}
