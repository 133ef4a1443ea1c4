//! Collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parlanchina_core::application::tooling::{
    ConnectionManager, InternalToolExecutor, ToolRegistry,
};
use parlanchina_core::config::{AgentSettings, McpRegistry};
use parlanchina_core::domain::{ConversationTurn, StreamEvent};
use parlanchina_core::infrastructure::model::{
    AssistantTurn, GeneratedImage, ModelError, ModelEventStream, ModelProvider,
};
use parlanchina_core::infrastructure::storage::{FsImageStore, InMemoryChatStore};
use parlanchina_core::{AgentLoop, ChatService, ModelGateway};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers from queues; every request is recorded.
#[derive(Default)]
pub struct FakeProvider {
    chat: Mutex<VecDeque<AssistantTurn>>,
    stream: Mutex<Vec<StreamEvent>>,
    pub chat_requests: Mutex<Vec<Vec<ConversationTurn>>>,
    pub offered_tools: Mutex<Vec<Vec<Value>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(self, turns: Vec<AssistantTurn>) -> Self {
        *self.chat.lock().unwrap() = turns.into();
        self
    }

    pub fn with_stream(self, events: Vec<StreamEvent>) -> Self {
        *self.stream.lock().unwrap() = events;
        self
    }
}

#[async_trait]
impl ModelProvider for FakeProvider {
    fn id(&self) -> &str {
        "fake"
    }

    async fn complete(
        &self,
        _model: &str,
        _conversation: &[ConversationTurn],
    ) -> Result<String, ModelError> {
        Ok("Fake title".to_string())
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        conversation: &[ConversationTurn],
        tools: &[Value],
    ) -> Result<AssistantTurn, ModelError> {
        self.chat_requests.lock().unwrap().push(conversation.to_vec());
        self.offered_tools.lock().unwrap().push(tools.to_vec());
        self.chat
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::invalid_response("fake", "chat script exhausted"))
    }

    async fn stream_response(
        &self,
        _model: &str,
        _conversation: &[ConversationTurn],
        _image_tool: bool,
    ) -> Result<ModelEventStream, ModelError> {
        let events = self.stream.lock().unwrap().clone();
        Ok(stream::iter(events.into_iter().map(Ok)).boxed())
    }

    async fn generate_image(
        &self,
        _prompt: &str,
        _size: &str,
    ) -> Result<GeneratedImage, ModelError> {
        Ok(GeneratedImage::Base64("aGVsbG8=".to_string()))
    }
}

/// A line-oriented MCP server exposing one `echo` tool.
pub const ECHO_SERVER: &str = r#"#!/bin/sh
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2025-06-18","capabilities":{}}}\n' "$id" ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echo a fixed reply","inputSchema":{"type":"object","properties":{"text":{"type":"string"}}}}]}}\n' "$id" ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong"}]}}\n' "$id" ;;
  esac
done
"#;

/// Writes the echo server script and an `mcp.json` naming it `demo`.
pub fn write_echo_config(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("echo.sh");
    fs::write(&script, ECHO_SERVER).expect("write script");
    let config = dir.join("mcp.json");
    let document = serde_json::json!({
        "servers": [{
            "name": "demo",
            "description": "Echo test server",
            "transport": {
                "type": "stdio",
                "command": "sh",
                "args": [script.display().to_string()]
            }
        }]
    });
    fs::write(&config, document.to_string()).expect("write mcp.json");
    config
}

pub fn tool_registry(
    provider: Arc<FakeProvider>,
    registry: Arc<McpRegistry>,
    image_dir: &Path,
) -> Arc<ToolRegistry> {
    let images = Arc::new(FsImageStore::new(image_dir));
    let internal = InternalToolExecutor::new(provider, images, "1024x1024", Duration::from_secs(5));
    let servers = Arc::new(ConnectionManager::new(registry, Duration::from_secs(10)));
    Arc::new(ToolRegistry::new(internal, servers))
}

pub fn chat_service(
    provider: Arc<FakeProvider>,
    registry: Arc<McpRegistry>,
    image_dir: &Path,
) -> Arc<ChatService> {
    let tools = tool_registry(provider.clone(), registry, image_dir);
    let settings = AgentSettings {
        plan: false,
        ..AgentSettings::default()
    };
    let agent = AgentLoop::new(provider.clone(), tools.clone(), settings, Duration::from_secs(5));
    let gateway = Arc::new(ModelGateway::new(
        provider,
        agent,
        settings.chunk_size,
        Duration::from_secs(5),
    ));
    Arc::new(ChatService::new(
        Arc::new(InMemoryChatStore::new()),
        Arc::new(FsImageStore::new(image_dir)),
        gateway,
        tools,
        "gpt-test",
    ))
}
