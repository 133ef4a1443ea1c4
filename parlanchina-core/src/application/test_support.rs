//! Scripted collaborators shared by the application unit tests.

use crate::application::tooling::{InternalToolExecutor, ToolRegistry, ToolServerInterface};
use crate::domain::{
    ConversationTurn, StreamEvent, ToolCallInvocation, ToolCallResult, ToolDefinition,
};
use crate::infrastructure::mcp::ToolInvokeError;
use crate::infrastructure::model::{
    AssistantTurn, GeneratedImage, ModelError, ModelEventStream, ModelProvider,
};
use crate::infrastructure::storage::{ImageMeta, ImageStore, ImageStoreError};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use serde_json::{Map as JsonMap, Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the scripted provider answers to one `chat_with_tools` call.
pub enum ChatStep {
    Reply(AssistantTurn),
    Fail,
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCallInvocation {
    ToolCallInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// Replays canned answers and records every request.
///
/// Once the chat script runs out, `fallback_chat` is returned forever.
#[derive(Default)]
pub struct ScriptedProvider {
    chat: Mutex<VecDeque<ChatStep>>,
    fallback_chat: Option<AssistantTurn>,
    completions: Mutex<VecDeque<Result<String, ()>>>,
    stream: Mutex<Option<Vec<Result<StreamEvent, ModelError>>>>,
    stream_stalls: bool,
    pub chat_requests: Mutex<Vec<Vec<ConversationTurn>>>,
    pub completion_requests: Mutex<Vec<Vec<ConversationTurn>>>,
    pub image_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(self, steps: Vec<ChatStep>) -> Self {
        *self.chat.lock().unwrap() = steps.into();
        self
    }

    pub fn with_fallback_chat(mut self, turn: AssistantTurn) -> Self {
        self.fallback_chat = Some(turn);
        self
    }

    pub fn with_completions(self, answers: Vec<Result<&str, ()>>) -> Self {
        *self.completions.lock().unwrap() = answers
            .into_iter()
            .map(|answer| answer.map(str::to_string))
            .collect();
        self
    }

    pub fn with_stream(self, events: Vec<Result<StreamEvent, ModelError>>) -> Self {
        *self.stream.lock().unwrap() = Some(events);
        self
    }

    /// Streams `events`, then stays open without sending anything.
    pub fn with_stalled_stream(mut self, events: Vec<Result<StreamEvent, ModelError>>) -> Self {
        self.stream_stalls = true;
        self.with_stream(events)
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_requests.lock().unwrap().len()
    }
}

fn scripted_failure() -> ModelError {
    ModelError::invalid_response("scripted", "scripted failure")
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _model: &str,
        conversation: &[ConversationTurn],
    ) -> Result<String, ModelError> {
        self.completion_requests
            .lock()
            .unwrap()
            .push(conversation.to_vec());
        match self.completions.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) | None => Err(scripted_failure()),
        }
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        conversation: &[ConversationTurn],
        _tools: &[Value],
    ) -> Result<AssistantTurn, ModelError> {
        self.chat_requests.lock().unwrap().push(conversation.to_vec());
        match self.chat.lock().unwrap().pop_front() {
            Some(ChatStep::Reply(turn)) => Ok(turn),
            Some(ChatStep::Fail) => Err(scripted_failure()),
            None => self.fallback_chat.clone().ok_or_else(scripted_failure),
        }
    }

    async fn stream_response(
        &self,
        _model: &str,
        _conversation: &[ConversationTurn],
        _image_tool: bool,
    ) -> Result<ModelEventStream, ModelError> {
        match self.stream.lock().unwrap().take() {
            Some(events) if self.stream_stalls => {
                Ok(stream::iter(events).chain(stream::pending()).boxed())
            }
            Some(events) => Ok(stream::iter(events).boxed()),
            None => Err(scripted_failure()),
        }
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _size: &str,
    ) -> Result<GeneratedImage, ModelError> {
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        Ok(GeneratedImage::Base64("aGVsbG8=".to_string()))
    }
}

/// Tool servers answering from a fixed catalogue.
#[derive(Default)]
pub struct StubServers {
    tools: BTreeMap<String, Vec<ToolDefinition>>,
    results: BTreeMap<String, Value>,
    pub calls: Mutex<Vec<(String, String, JsonMap<String, Value>)>>,
    pub listings: Mutex<Vec<String>>,
}

impl StubServers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, server: &str, tool: &str, result: Value) -> Self {
        self.tools
            .entry(server.to_string())
            .or_default()
            .push(ToolDefinition::remote(server, tool, format!("{tool} tool"), None));
        self.results.insert(format!("{server}.{tool}"), result);
        self
    }
}

#[async_trait]
impl ToolServerInterface for StubServers {
    fn is_enabled(&self) -> bool {
        !self.tools.is_empty()
    }

    fn server_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    async fn list_tools(&self, server: &str) -> Result<Vec<ToolDefinition>, ToolInvokeError> {
        self.listings.lock().unwrap().push(server.to_string());
        self.tools
            .get(server)
            .cloned()
            .ok_or_else(|| ToolInvokeError::NotConfigured {
                server: server.to_string(),
            })
    }

    async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: JsonMap<String, Value>,
    ) -> ToolCallResult {
        self.calls
            .lock()
            .unwrap()
            .push((server.to_string(), tool.to_string(), arguments));
        let result = self
            .results
            .get(&format!("{server}.{tool}"))
            .cloned()
            .unwrap_or(Value::Null);
        let pretty = serde_json::to_string_pretty(&result).unwrap();
        ToolCallResult::new(server, tool, result, format!("Result from {server}/{tool}:\n{pretty}"))
    }
}

/// Image store that only remembers what it was given.
#[derive(Default)]
pub struct MemoryImages {
    pub saved: Mutex<Vec<String>>,
}

impl ImageStore for MemoryImages {
    fn save_image_from_base64(&self, image_b64: &str) -> Result<ImageMeta, ImageStoreError> {
        if image_b64.trim().is_empty() {
            return Err(ImageStoreError::EmptyPayload);
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(image_b64.to_string());
        let filename = format!("img{}.png", saved.len());
        Ok(ImageMeta {
            id: format!("img{}", saved.len()),
            url_path: format!("/images/{filename}"),
            filename,
            created_at: Utc::now(),
        })
    }
}

pub fn text_result(text: &str) -> Value {
    json!({"content": [{"type": "text", "text": text}]})
}

pub fn registry(
    provider: Arc<ScriptedProvider>,
    servers: Arc<dyn ToolServerInterface>,
    images: Arc<MemoryImages>,
) -> Arc<ToolRegistry> {
    let internal = InternalToolExecutor::new(
        provider,
        images,
        "1024x1024",
        Duration::from_secs(5),
    );
    Arc::new(ToolRegistry::new(internal, servers))
}
