// SSE transport tests against a small axum MCP server.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use parlanchina_core::application::tooling::{ConnectionManager, ToolServerInterface};
use parlanchina_core::config::McpRegistry;
use parlanchina_core::infrastructure::mcp::{McpSession, ToolInvokeError};
use serde_json::{Map, Value, json};
use std::convert::Infallible;
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Answers JSON-RPC requests POSTed to `/messages` on the `/sse` stream.
#[derive(Clone, Default)]
struct SseServer {
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<Value>>>>,
    authorization: Arc<Mutex<Vec<String>>>,
}

async fn open_stream(
    State(server): State<SseServer>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        server.authorization.lock().unwrap().push(value.to_string());
    }
    let (tx, rx) = mpsc::unbounded_channel::<Value>();
    *server.outbound.lock().unwrap() = Some(tx);

    let endpoint = stream::once(async {
        Ok(Event::default()
            .event("endpoint")
            .data("/messages?session_id=1"))
    });
    let messages = stream::unfold(rx, |mut rx| async move {
        let message = rx.recv().await?;
        let event = Event::default().event("message").data(message.to_string());
        Some((Ok(event), rx))
    });
    Sse::new(endpoint.chain(messages))
}

async fn post_message(
    State(server): State<SseServer>,
    Json(message): Json<Value>,
) -> (StatusCode, String) {
    let Some(id) = message.get("id").cloned() else {
        return (StatusCode::ACCEPTED, String::new());
    };
    let result = match message["method"].as_str().unwrap_or_default() {
        "initialize" => json!({"protocolVersion": "2025-06-18", "capabilities": {}}),
        "tools/list" => json!({"tools": [{
            "name": "lookup",
            "description": "Look up a record",
            "inputSchema": {"type": "object", "properties": {"key": {"type": "string"}}}
        }]}),
        "tools/call" if message["params"]["name"] == "broken" => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        }
        "tools/call" => {
            let key = message["params"]["arguments"]["key"]
                .as_str()
                .unwrap_or("nothing");
            json!({"content": [{"type": "text", "text": format!("found {key}")}], "isError": false})
        }
        _ => return (StatusCode::BAD_REQUEST, "unknown method".to_string()),
    };
    if let Some(tx) = server.outbound.lock().unwrap().as_ref() {
        let _ = tx.send(json!({"jsonrpc": "2.0", "id": id, "result": result}));
    }
    (StatusCode::ACCEPTED, String::new())
}

struct Fixture {
    server: SseServer,
    registry: Arc<McpRegistry>,
    _dir: TempDir,
}

impl Fixture {
    async fn start() -> Self {
        let server = SseServer::default();
        let app = Router::new()
            .route("/sse", get(open_stream))
            .route("/messages", post(post_message))
            .with_state(server.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("mcp.json");
        let document = json!({"servers": [
            {
                "name": "remote",
                "transport": {
                    "type": "sse",
                    "url": format!("http://{addr}/sse"),
                    "headers": {"Authorization": "Bearer t"}
                }
            },
            {
                "name": "gone",
                "transport": {"type": "sse", "url": format!("http://{addr}/missing")}
            }
        ]});
        fs::write(&path, document.to_string()).expect("write mcp.json");

        Self {
            server,
            registry: Arc::new(McpRegistry::new(path)),
            _dir: dir,
        }
    }

    fn manager(&self) -> ConnectionManager {
        ConnectionManager::new(self.registry.clone(), Duration::from_secs(10))
    }
}

#[tokio::test]
async fn lists_tools_over_sse() {
    let fixture = Fixture::start().await;

    let tools = fixture.manager().list_tools("remote").await.expect("listing");

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].id, "remote.lookup");
    assert_eq!(tools[0].description, "Look up a record");
    assert_eq!(tools[0].schema["properties"]["key"]["type"], "string");
    assert_eq!(
        *fixture.server.authorization.lock().unwrap(),
        vec!["Bearer t".to_string()]
    );
}

#[tokio::test]
async fn calls_a_tool_over_sse() {
    let fixture = Fixture::start().await;
    let mut arguments = Map::new();
    arguments.insert("key".into(), Value::String("q3".into()));

    let result = fixture.manager().call_tool("remote", "lookup", arguments).await;

    assert_eq!(result.raw_result["content"][0]["text"], "found q3");
    assert!(result.display_text.starts_with("Result from remote/lookup:\n"));
    assert!(!result.is_error);
}

#[tokio::test]
async fn rejected_post_becomes_failure_text() {
    let fixture = Fixture::start().await;

    let result = fixture.manager().call_tool("remote", "broken", Map::new()).await;

    assert!(
        result
            .display_text
            .starts_with("Failed to run broken on remote: MCP server 'remote' transport error: POST ")
    );
    assert!(result.display_text.contains("500"));
    assert!(result.display_text.ends_with("boom"));
    assert!(result.is_error);
}

#[tokio::test]
async fn session_connects_directly_from_server_config() {
    let fixture = Fixture::start().await;
    let config = fixture.registry.server("remote").expect("configured");

    let mut session = McpSession::connect(&config).await.expect("handshake");
    let tools = session.list_tools().await.expect("listing");
    session.close().await;

    assert_eq!(tools[0].name, "lookup");
}

#[tokio::test]
async fn missing_stream_is_a_transport_error() {
    let fixture = Fixture::start().await;

    let err = fixture.manager().list_tools("gone").await.expect_err("no stream");

    assert!(matches!(err, ToolInvokeError::Transport { ref server, .. } if server == "gone"));
}
