// HTTP API tests - the router served on an ephemeral port.

#[path = "../common/mod.rs"]
mod common;

use common::{FakeProvider, chat_service, write_echo_config};
use parlanchina_core::config::McpRegistry;
use parlanchina_core::domain::StreamEvent;
use parlanchina_core::infrastructure::model::AssistantTurn;
use parlanchina_core::infrastructure::server;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    client: reqwest::Client,
    image_dir: PathBuf,
    _dir: TempDir,
}

impl TestServer {
    async fn start(provider: FakeProvider, with_mcp: bool) -> Self {
        let dir = tempdir().expect("tempdir");
        let mcp_path = if with_mcp {
            write_echo_config(dir.path())
        } else {
            dir.path().join("absent-mcp.json")
        };
        let registry = Arc::new(McpRegistry::new(mcp_path));
        let image_dir = dir.path().join("images");
        let chat = chat_service(Arc::new(provider), registry.clone(), &image_dir);
        let app = server::app(chat, registry, image_dir.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("serve");
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            image_dir,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn create_session(&self) -> String {
        let response = self
            .client
            .post(self.url("/sessions"))
            .json(&json!({"title": "Test chat"}))
            .send()
            .await
            .expect("create session");
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.expect("json");
        body["id"].as_str().expect("id").to_string()
    }

    async fn post_message(&self, id: &str, message: &str) -> StatusCode {
        self.client
            .post(self.url(&format!("/chat/{id}")))
            .json(&json!({"message": message}))
            .send()
            .await
            .expect("post message")
            .status()
    }

    async fn stream(&self, id: &str) -> (String, Vec<Value>) {
        let response = self
            .client
            .get(self.url(&format!("/chat/{id}/stream")))
            .send()
            .await
            .expect("open stream");
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.expect("body");
        let events = body
            .lines()
            .map(|line| serde_json::from_str(line).expect("ndjson line"))
            .collect();
        (content_type, events)
    }
}

fn event_types(events: &[Value]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| event["type"].as_str())
        .collect()
}

#[tokio::test]
async fn session_lifecycle() {
    let server = TestServer::start(FakeProvider::new(), false).await;
    let id = server.create_session().await;

    let session: Value = server
        .client
        .get(server.url(&format!("/sessions/{id}")))
        .send()
        .await
        .expect("get session")
        .json()
        .await
        .expect("json");
    assert_eq!(session["title"], "Test chat");
    assert_eq!(session["mode"], "ask");
    assert_eq!(session["messages"], json!([]));

    let listed: Value = server
        .client
        .get(server.url("/sessions"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json");
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let deleted = server
        .client
        .delete(server.url(&format!("/sessions/{id}")))
        .send()
        .await
        .expect("delete");
    assert_eq!(deleted.status(), StatusCode::OK);

    let missing = server
        .client
        .get(server.url(&format!("/sessions/{id}")))
        .send()
        .await
        .expect("get deleted");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.expect("json");
    assert!(body["error"].as_str().unwrap_or_default().contains(&id));
}

#[tokio::test]
async fn empty_messages_are_rejected() {
    let server = TestServer::start(FakeProvider::new(), false).await;
    let id = server.create_session().await;
    assert_eq!(server.post_message(&id, "   ").await, StatusCode::BAD_REQUEST);
    assert_eq!(
        server.post_message("no-such-session", "hi").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn ask_mode_streams_ndjson_and_persists_the_answer() {
    let provider = FakeProvider::new().with_stream(vec![
        StreamEvent::text_delta("Hel"),
        StreamEvent::text_delta("lo"),
        StreamEvent::text_done("Hello"),
    ]);
    let server = TestServer::start(provider, false).await;
    let id = server.create_session().await;
    assert_eq!(server.post_message(&id, "Say hello").await, StatusCode::OK);

    let (content_type, events) = server.stream(&id).await;
    assert!(content_type.starts_with("application/x-ndjson"));
    assert_eq!(event_types(&events), vec!["text_delta", "text_delta", "text_done"]);
    assert_eq!(events[2]["text"], "Hello");
    assert_eq!(events[2]["images"], json!([]));

    let session: Value = server
        .client
        .get(server.url(&format!("/sessions/{id}")))
        .send()
        .await
        .expect("get session")
        .json()
        .await
        .expect("json");
    let messages = session["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello");
}

#[tokio::test]
async fn agent_mode_replays_the_final_answer() {
    let provider = FakeProvider::new().with_chat(vec![AssistantTurn::text("Agent answer")]);
    let server = TestServer::start(provider, false).await;
    let id = server.create_session().await;

    let mode = server
        .client
        .put(server.url(&format!("/chat/{id}/mode")))
        .json(&json!({"mode": "agent"}))
        .send()
        .await
        .expect("set mode");
    assert_eq!(mode.status(), StatusCode::OK);
    assert_eq!(server.post_message(&id, "Do the thing").await, StatusCode::OK);

    let (_, events) = server.stream(&id).await;
    assert_eq!(event_types(&events), vec!["text_delta", "text_done"]);
    assert_eq!(events[0]["text"], "Agent answer");
    assert_eq!(events[1]["text"], "Agent answer");
}

#[tokio::test]
async fn tool_selection_can_be_replaced() {
    let server = TestServer::start(FakeProvider::new(), false).await;
    let id = server.create_session().await;

    let response = server
        .client
        .put(server.url(&format!("/chat/{id}/tools")))
        .json(&json!({"internal": [], "mcp": ["reports.summary"]}))
        .send()
        .await
        .expect("set tools");
    assert_eq!(response.status(), StatusCode::OK);
    let selection: Value = response.json().await.expect("json");
    assert_eq!(selection, json!({"internal": [], "mcp": ["reports.summary"]}));

    let missing = server
        .client
        .put(server.url("/chat/unknown/tools"))
        .json(&json!({"internal": []}))
        .send()
        .await
        .expect("set tools");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn disabled_mcp_is_reported() {
    let server = TestServer::start(FakeProvider::new(), false).await;
    let servers: Value = server
        .client
        .get(server.url("/mcp/servers"))
        .send()
        .await
        .expect("list servers")
        .json()
        .await
        .expect("json");
    assert_eq!(servers["enabled"], false);
    assert!(servers["reason"].as_str().unwrap_or_default().contains("not found"));
    assert_eq!(servers["servers"], json!([]));

    let tools: Value = server
        .client
        .get(server.url("/tools"))
        .send()
        .await
        .expect("tools")
        .json()
        .await
        .expect("json");
    assert_eq!(tools["internal"][0]["id"], "internal.image");
    assert_eq!(tools["mcp"], json!([]));
}

#[cfg(unix)]
#[tokio::test]
async fn mcp_routes_reach_the_stdio_server() {
    let server = TestServer::start(FakeProvider::new(), true).await;

    let servers: Value = server
        .client
        .get(server.url("/mcp/servers"))
        .send()
        .await
        .expect("list servers")
        .json()
        .await
        .expect("json");
    assert_eq!(servers["enabled"], true);
    assert_eq!(servers["servers"][0]["name"], "demo");
    assert_eq!(servers["servers"][0]["transport_type"], "stdio");

    let tools: Value = server
        .client
        .get(server.url("/mcp/servers/demo/tools"))
        .send()
        .await
        .expect("list tools")
        .json()
        .await
        .expect("json");
    assert_eq!(tools[0]["id"], "demo.echo");

    let missing = server
        .client
        .get(server.url("/mcp/servers/ghost/tools"))
        .send()
        .await
        .expect("list tools");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let called: Value = server
        .client
        .post(server.url("/mcp/servers/demo/tools/echo"))
        .json(&json!({"text": "ping"}))
        .send()
        .await
        .expect("call tool")
        .json()
        .await
        .expect("json");
    assert_eq!(called["server_name"], "demo");
    assert!(called["display_text"].as_str().unwrap_or_default().contains("pong"));
    assert_eq!(called["is_error"], false);
}

#[tokio::test]
async fn images_are_served_from_the_image_dir() {
    let server = TestServer::start(FakeProvider::new(), false).await;
    fs::create_dir_all(&server.image_dir).expect("image dir");
    fs::write(server.image_dir.join("chart.png"), b"png-bytes").expect("write image");

    let found = server
        .client
        .get(server.url("/images/chart.png"))
        .send()
        .await
        .expect("image request");
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(&found.bytes().await.expect("bytes")[..], b"png-bytes");

    let missing = server
        .client
        .get(server.url("/images/none.png"))
        .send()
        .await
        .expect("image request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
