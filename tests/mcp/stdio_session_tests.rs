// Stdio transport tests against a small shell-script MCP server.

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use common::write_echo_config;
use parlanchina_core::application::tooling::{ConnectionManager, ToolServerInterface};
use parlanchina_core::config::McpRegistry;
use parlanchina_core::infrastructure::mcp::{McpSession, ToolInvokeError};
use serde_json::{Map, Value, json};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn manager(path: std::path::PathBuf) -> ConnectionManager {
    ConnectionManager::new(Arc::new(McpRegistry::new(path)), Duration::from_secs(10))
}

#[tokio::test]
async fn lists_tools_over_stdio() {
    let dir = tempdir().expect("tempdir");
    let manager = manager(write_echo_config(dir.path()));

    let tools = manager.list_tools("demo").await.expect("listing");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].id, "demo.echo");
    assert_eq!(tools[0].server.as_deref(), Some("demo"));
    assert_eq!(tools[0].description, "Echo a fixed reply");
    assert_eq!(tools[0].schema["properties"]["text"]["type"], "string");
}

#[tokio::test]
async fn calls_a_tool_over_stdio() {
    let dir = tempdir().expect("tempdir");
    let manager = manager(write_echo_config(dir.path()));

    let mut arguments = Map::new();
    arguments.insert("text".into(), Value::String("ping".into()));
    let result = manager.call_tool("demo", "echo", arguments).await;

    assert_eq!(result.server_name, "demo");
    assert_eq!(result.tool_name, "echo");
    assert_eq!(
        result.raw_result,
        json!({"content": [{"type": "text", "text": "pong"}]})
    );
    assert!(result.display_text.starts_with("Result from demo/echo:\n"));
    assert!(result.display_text.contains("pong"));
}

#[tokio::test]
async fn session_connects_directly_from_server_config() {
    let dir = tempdir().expect("tempdir");
    let registry = McpRegistry::new(write_echo_config(dir.path()));
    let config = registry.server("demo").expect("configured");

    let mut session = McpSession::connect(&config).await.expect("handshake");
    let tools = session.list_tools().await.expect("listing");
    session.close().await;
    assert_eq!(tools[0].name, "echo");
}

#[tokio::test]
async fn unknown_server_is_not_configured() {
    let dir = tempdir().expect("tempdir");
    let manager = manager(write_echo_config(dir.path()));

    let err = manager.list_tools("missing").await.expect_err("unknown server");
    assert!(matches!(err, ToolInvokeError::NotConfigured { ref server } if server == "missing"));

    let result = manager.call_tool("missing", "echo", Map::new()).await;
    assert!(result.display_text.starts_with("Failed to run echo on missing"));
}

#[tokio::test]
async fn missing_command_reports_failure_text() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("mcp.json");
    fs::write(
        &path,
        json!({"servers": [{
            "name": "ghost",
            "transport": {"type": "stdio", "command": "/nonexistent/parlanchina-mcp-server"}
        }]})
        .to_string(),
    )
    .expect("write mcp.json");

    let result = manager(path).call_tool("ghost", "anything", Map::new()).await;
    assert!(result.display_text.starts_with("Failed to run anything on ghost"));
    assert!(result.display_text.contains("failed to spawn"));
}

#[tokio::test]
async fn disabled_registry_lists_nothing() {
    let dir = tempdir().expect("tempdir");
    let manager = manager(dir.path().join("absent.json"));

    assert!(!manager.is_enabled());
    assert!(manager.list_tools("demo").await.expect("empty").is_empty());
    let result = manager.call_tool("demo", "echo", Map::new()).await;
    assert!(result.display_text.starts_with("MCP is disabled"));
}

#[tokio::test]
async fn silent_server_times_out_as_text() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("mcp.json");
    fs::write(
        &path,
        json!({"servers": [{
            "name": "slow",
            "transport": {"type": "stdio", "command": "sleep", "args": ["30"]}
        }]})
        .to_string(),
    )
    .expect("write mcp.json");
    let manager = ConnectionManager::new(Arc::new(McpRegistry::new(path)), Duration::from_secs(1));

    let started = std::time::Instant::now();
    let result = manager.call_tool("slow", "x", Map::new()).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(
        result.display_text,
        "Failed to run x on slow: MCP server 'slow' did not respond within 1s"
    );
    assert!(result.is_error);

    let err = manager.list_tools("slow").await.expect_err("listing times out");
    assert!(matches!(err, ToolInvokeError::Timeout { seconds: 1, .. }));
}
