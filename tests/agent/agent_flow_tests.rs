// Agent loop tests over a live stdio tool server.

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use common::{FakeProvider, tool_registry, write_echo_config};
use parlanchina_core::config::{AgentSettings, McpRegistry};
use parlanchina_core::domain::{ConversationTurn, MessageRole, ToolCallInvocation, ToolSelection};
use parlanchina_core::infrastructure::model::AssistantTurn;
use parlanchina_core::{AgentLoop, AgentRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn echo_call(name: &str) -> ToolCallInvocation {
    ToolCallInvocation {
        id: "call_1".to_string(),
        name: name.to_string(),
        arguments: r#"{"text":"ping"}"#.to_string(),
    }
}

fn offered_names(tools: &[Value]) -> Vec<String> {
    tools
        .iter()
        .filter_map(|tool| tool["function"]["name"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn tool_result_feeds_the_final_answer() {
    let dir = tempdir().expect("tempdir");
    let registry = Arc::new(McpRegistry::new(write_echo_config(dir.path())));
    let provider = Arc::new(FakeProvider::new().with_chat(vec![
        AssistantTurn::with_calls(vec![echo_call("demo_echo")]),
        AssistantTurn::text("The server answered pong."),
    ]));
    let tools = tool_registry(provider.clone(), registry, dir.path());
    let settings = AgentSettings {
        plan: false,
        ..AgentSettings::default()
    };
    let agent = AgentLoop::new(provider.clone(), tools, settings, Duration::from_secs(5));

    let selection = ToolSelection::new(
        ["internal.image".to_string()],
        ["demo.echo".to_string()],
    );
    let outcome = agent
        .run(AgentRequest::fixed(
            vec![ConversationTurn::user("Ping the demo server")],
            "gpt-test",
            selection,
        ))
        .await;

    assert_eq!(outcome.text, "The server answered pong.");
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.tool_calls, 1);

    let offered = provider.offered_tools.lock().unwrap();
    assert_eq!(offered_names(&offered[0]), vec!["internal_image", "demo_echo"]);

    let requests = provider.chat_requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let tool_turn = requests[1].last().expect("tool result turn");
    assert_eq!(tool_turn.role, MessageRole::Tool);
    assert_eq!(tool_turn.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_turn.content.contains("pong"));
}

#[tokio::test]
async fn tools_outside_the_selection_are_refused() {
    let dir = tempdir().expect("tempdir");
    let registry = Arc::new(McpRegistry::new(write_echo_config(dir.path())));
    let provider = Arc::new(FakeProvider::new().with_chat(vec![
        AssistantTurn::with_calls(vec![echo_call("demo_echo")]),
        AssistantTurn::text("I could not reach the tool."),
    ]));
    let tools = tool_registry(provider.clone(), registry, dir.path());
    let settings = AgentSettings {
        plan: false,
        ..AgentSettings::default()
    };
    let agent = AgentLoop::new(provider.clone(), tools, settings, Duration::from_secs(5));

    let selection = ToolSelection::new(["internal.image".to_string()], Vec::new());
    let outcome = agent
        .run(AgentRequest::fixed(
            vec![ConversationTurn::user("Ping the demo server")],
            "gpt-test",
            selection,
        ))
        .await;

    assert_eq!(outcome.text, "I could not reach the tool.");
    let requests = provider.chat_requests.lock().unwrap();
    let tool_turn = requests[1].last().expect("tool result turn");
    assert_eq!(tool_turn.content, "Tool `demo_echo` is disabled for this turn.");
}
