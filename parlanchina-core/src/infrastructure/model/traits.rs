//! Model traits

use super::types::{AssistantTurn, GeneratedImage, ModelError};
use crate::domain::{ConversationTurn, StreamEvent};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

/// Stream of normalized events from one streaming call.
pub type ModelEventStream = BoxStream<'static, Result<StreamEvent, ModelError>>;

/// Trait for model provider implementations
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// One non-streaming completion, returning the assistant text.
    async fn complete(
        &self,
        model: &str,
        conversation: &[ConversationTurn],
    ) -> Result<String, ModelError>;

    /// Chat call offering function tools with `tool_choice: auto`.
    async fn chat_with_tools(
        &self,
        model: &str,
        conversation: &[ConversationTurn],
        tools: &[Value],
    ) -> Result<AssistantTurn, ModelError>;

    /// Streaming call, optionally offering the provider's image tool.
    async fn stream_response(
        &self,
        model: &str,
        conversation: &[ConversationTurn],
        image_tool: bool,
    ) -> Result<ModelEventStream, ModelError>;

    async fn generate_image(&self, prompt: &str, size: &str)
    -> Result<GeneratedImage, ModelError>;
}
