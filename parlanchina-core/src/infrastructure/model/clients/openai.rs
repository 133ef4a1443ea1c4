//! OpenAI / Azure OpenAI client implementation

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{debug, info};

use super::base::{HttpClientBase, format_api_error};
use crate::config::{ModelProviderConfig, ProviderKind};
use crate::domain::{ConversationTurn, StreamEvent};
use crate::infrastructure::model::adapter::{
    MessageAdapter, ResponsesStreamAdapter, extract_output_text,
};
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::{ModelEventStream, ModelProvider};
use crate::infrastructure::model::types::{AssistantTurn, GeneratedImage, ModelError};

/// Client for the OpenAI Responses, Chat Completions and Images APIs.
#[derive(Clone)]
pub struct OpenAiClient {
    base: HttpClientBase,
    image_model: String,
}

impl OpenAiClient {
    pub fn from_config(config: &ModelProviderConfig) -> Self {
        let id = match config.kind {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Azure => "azure",
        };
        let api_key = resolve_api_key(id, Some(config.api_key_env.as_str()));
        Self {
            base: HttpClientBase::new(
                id.to_string(),
                config.kind,
                config.endpoint.clone(),
                api_key,
                config.api_version.clone(),
            ),
            image_model: config.image_model.clone(),
        }
    }

    fn responses_url(&self) -> String {
        self.base.build_url("responses")
    }

    fn chat_url(&self, model: &str) -> String {
        match self.base.kind {
            ProviderKind::OpenAi => self.base.build_url("chat/completions"),
            ProviderKind::Azure => self
                .base
                .build_url(&format!("deployments/{model}/chat/completions")),
        }
    }

    fn images_url(&self) -> String {
        match self.base.kind {
            ProviderKind::OpenAi => self.base.build_url("images/generations"),
            ProviderKind::Azure => self
                .base
                .build_url(&format!("deployments/{}/images/generations", self.image_model)),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn complete(
        &self,
        model: &str,
        conversation: &[ConversationTurn],
    ) -> Result<String, ModelError> {
        let started = Instant::now();
        let payload = json!({
            "model": model,
            "input": MessageAdapter::to_responses_input(conversation),
        });
        let response = self.base.post_json(&self.responses_url(), &payload).await?;
        let content = extract_output_text(&response);
        info!(
            provider = self.base.id.as_str(),
            model,
            chars = content.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model completed response"
        );
        Ok(content)
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        conversation: &[ConversationTurn],
        tools: &[Value],
    ) -> Result<AssistantTurn, ModelError> {
        let mut payload = json!({
            "model": model,
            "messages": MessageAdapter::to_chat_format(conversation),
        });
        if !tools.is_empty() {
            payload["tools"] = Value::Array(tools.to_vec());
            payload["tool_choice"] = json!("auto");
        }

        debug!(
            provider = self.base.id.as_str(),
            model,
            messages = conversation.len(),
            tools = tools.len(),
            "Sending tool-enabled chat request"
        );
        let response = self.base.post_json(&self.chat_url(model), &payload).await?;
        MessageAdapter::parse_chat_message(&response)
            .ok_or_else(|| {
                ModelError::invalid_response(&self.base.id, "missing choices[0].message")
            })
    }

    async fn stream_response(
        &self,
        model: &str,
        conversation: &[ConversationTurn],
        image_tool: bool,
    ) -> Result<ModelEventStream, ModelError> {
        let mut payload = json!({
            "model": model,
            "input": MessageAdapter::to_responses_input(conversation),
            "stream": true,
        });
        if image_tool {
            payload["tools"] = json!([{
                "type": "image_generation",
                "model": self.image_model,
                "quality": "high",
                "output_format": "png",
            }]);
        }

        let request = self.base.authorized_post(&self.responses_url(), &payload)?;
        let source = EventSource::new(request)
            .map_err(|err| ModelError::stream(&self.base.id, err.to_string()))?;
        info!(
            provider = self.base.id.as_str(),
            model,
            image_tool,
            "Opened response stream"
        );

        let provider = self.base.id.clone();
        let events = stream::unfold(
            Some((source, ResponsesStreamAdapter::new(), provider)),
            |state| async move {
                let (mut source, mut adapter, provider) = state?;
                loop {
                    match source.next().await {
                        Some(Ok(Event::Open)) => continue,
                        Some(Ok(Event::Message(message))) => {
                            let data = message.data.trim();
                            if data == "[DONE]" {
                                source.close();
                                return Some((finish(&mut adapter), None));
                            }
                            let payload = match serde_json::from_str::<Value>(data) {
                                Ok(payload) => payload,
                                Err(err) => {
                                    debug!(%err, "skipping undecodable stream event");
                                    continue;
                                }
                            };
                            let events: Vec<_> =
                                adapter.on_event(&payload).into_iter().map(Ok).collect();
                            if adapter.is_done() {
                                source.close();
                                return Some((events, None));
                            }
                            if events.is_empty() {
                                continue;
                            }
                            return Some((events, Some((source, adapter, provider))));
                        }
                        Some(Err(EventSourceError::StreamEnded)) | None => {
                            return Some((finish(&mut adapter), None));
                        }
                        Some(Err(err)) => {
                            source.close();
                            let error = stream_error(&provider, err).await;
                            return Some((vec![Err(error)], None));
                        }
                    }
                }
            },
        )
        .flat_map(stream::iter);

        Ok(events.boxed())
    }

    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
    ) -> Result<GeneratedImage, ModelError> {
        let payload = json!({
            "model": self.image_model,
            "prompt": prompt,
            "size": size,
            "n": 1,
        });
        info!(provider = self.base.id.as_str(), size, "Requesting image generation");
        let response = self.base.post_json(&self.images_url(), &payload).await?;
        let data = response.pointer("/data/0");
        let field = |key: &str| {
            data.and_then(|item| item.get(key))
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        if let Some(b64) = field("b64_json") {
            return Ok(GeneratedImage::Base64(b64));
        }
        if let Some(url) = field("url") {
            return Ok(GeneratedImage::Url(url));
        }
        Err(ModelError::invalid_response(&self.base.id, "empty image response"))
    }
}

fn finish(adapter: &mut ResponsesStreamAdapter) -> Vec<Result<StreamEvent, ModelError>> {
    adapter.finish().into_iter().map(Ok).collect()
}

async fn stream_error(provider: &str, err: EventSourceError) -> ModelError {
    match err {
        EventSourceError::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            ModelError::status(provider, status, format_api_error(&body))
        }
        EventSourceError::Transport(source) => ModelError::network(provider, source),
        other => ModelError::stream(provider, other.to_string()),
    }
}
