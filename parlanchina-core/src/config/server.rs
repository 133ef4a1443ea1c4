use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// How a tool server is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    Sse {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

impl TransportConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportConfig::Stdio { .. } => "stdio",
            TransportConfig::Sse { .. } => "sse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub description: Option<String>,
    pub transport: TransportConfig,
}

impl ServerConfig {
    pub fn summary(&self) -> ServerSummary {
        ServerSummary {
            name: self.name.clone(),
            transport_type: self.transport.kind().to_string(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    pub name: String,
    pub transport_type: String,
    pub description: Option<String>,
}

pub(crate) const MISSING_SERVERS_REASON: &str = "mcp.json missing 'servers' array; MCP disabled";

/// Parses a tool-server document into servers keyed by name.
///
/// Accepts a `servers` array, a `servers` map keyed by name, or a legacy
/// `mcpServers` map. Invalid entries are dropped with a warning. Returns the
/// disabled reason when the document has no recognizable server list.
pub(crate) fn parse_servers(document: &Value) -> Result<BTreeMap<String, ServerConfig>, String> {
    let entries = collect_entries(document).ok_or_else(|| MISSING_SERVERS_REASON.to_string())?;

    let mut servers = BTreeMap::new();
    for entry in entries {
        if let Some(server) = parse_entry(&entry) {
            servers.insert(server.name.clone(), server);
        }
    }
    Ok(servers)
}

fn collect_entries(document: &Value) -> Option<Vec<Value>> {
    match document.get("servers") {
        Some(Value::Array(items)) => return Some(items.clone()),
        Some(Value::Object(map)) => {
            info!("Loaded MCP config using map-style servers format");
            return Some(named_entries(map, true));
        }
        _ => {}
    }

    if let Some(Value::Object(map)) = document.get("mcpServers") {
        info!("Loaded MCP config using legacy mcpServers format");
        return Some(named_entries(map, false));
    }
    None
}

/// Turns `{name: {...}}` maps into list entries with a nested transport.
fn named_entries(map: &Map<String, Value>, keep_description: bool) -> Vec<Value> {
    map.iter()
        .filter_map(|(name, config)| {
            let config = config.as_object()?;
            let mut entry = Map::new();
            entry.insert("name".into(), Value::String(name.clone()));
            if keep_description {
                if let Some(Value::String(description)) = config.get("description") {
                    entry.insert("description".into(), Value::String(description.clone()));
                }
            }
            let transport = match config.get("transport") {
                Some(nested @ Value::Object(_)) => nested.clone(),
                _ => flat_transport(config, Some("stdio")),
            };
            entry.insert("transport".into(), transport);
            Some(Value::Object(entry))
        })
        .collect()
}

fn flat_transport(config: &Map<String, Value>, default_type: Option<&str>) -> Value {
    let mut transport = Map::new();
    let kind = config
        .get("type")
        .cloned()
        .or_else(|| default_type.map(|t| Value::String(t.to_string())))
        .unwrap_or(Value::Null);
    transport.insert("type".into(), kind);
    for key in ["command", "args", "env", "url", "headers"] {
        if let Some(value) = config.get(key) {
            transport.insert(key.into(), value.clone());
        }
    }
    Value::Object(transport)
}

fn parse_entry(entry: &Value) -> Option<ServerConfig> {
    let entry = entry.as_object()?;
    let Some(name) = entry.get("name").and_then(Value::as_str) else {
        warn!("Skipping MCP server entry without a name");
        return None;
    };
    let description = entry
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    let transport = match entry.get("transport") {
        Some(Value::Object(nested)) => Value::Object(nested.clone()),
        _ if entry.contains_key("type") => flat_transport(entry, None),
        _ => {
            warn!(server = %name, "Skipping MCP server: no transport");
            return None;
        }
    };

    let transport = parse_transport(name, &transport)?;
    Some(ServerConfig {
        name: name.to_string(),
        description,
        transport,
    })
}

fn parse_transport(server: &str, transport: &Value) -> Option<TransportConfig> {
    match transport.get("type").and_then(Value::as_str) {
        Some("stdio") => {
            let Some(command) = transport.get("command").and_then(Value::as_str) else {
                warn!(server = %server, "Skipping MCP server: stdio transport missing command");
                return None;
            };
            let args = transport
                .get("args")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(|arg| expand(&coerce(arg))).collect())
                .unwrap_or_default();
            Some(TransportConfig::Stdio {
                command: expand(command),
                args,
                env: string_map(transport.get("env")),
            })
        }
        Some("sse") => {
            let Some(url) = transport.get("url").and_then(Value::as_str) else {
                warn!(server = %server, "Skipping MCP server: sse transport missing url");
                return None;
            };
            Some(TransportConfig::Sse {
                url: expand(url),
                headers: string_map(transport.get("headers")),
            })
        }
        other => {
            warn!(
                server = %server,
                transport = ?other,
                "Skipping MCP server: unknown transport type"
            );
            None
        }
    }
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), coerce(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn coerce(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn expand(raw: &str) -> String {
    shellexpand::full(raw)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
