//! Model gateway: one entry point for completions and mode-aware streaming.

use crate::application::agent::{AgentLoop, AgentOutcome, AgentRequest};
use crate::application::tooling::IMAGE_TOOL_ID;
use crate::constants::COMPLETION_ERROR_TEXT;
use crate::domain::{ChatMode, ConversationTurn, StreamEvent, ToolSelection};
use crate::infrastructure::model::{ModelError, ModelEventStream, ModelProvider};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

/// Message shown to the user when the streaming call fails.
pub const STREAM_ERROR_TEXT: &str = "An error occurred while contacting the model.";

/// Normalized events of one streamed answer. Backend failures arrive as
/// [`StreamEvent::Error`], never as a stream error.
pub type EventStream = BoxStream<'static, StreamEvent>;

#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub conversation: Vec<ConversationTurn>,
    pub model: String,
    pub mode: ChatMode,
    pub selection: watch::Receiver<ToolSelection>,
}

pub struct ModelGateway {
    provider: Arc<dyn ModelProvider>,
    agent: Arc<AgentLoop>,
    chunk_size: usize,
    model_timeout: Duration,
}

impl ModelGateway {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        agent: AgentLoop,
        chunk_size: usize,
        model_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            agent: Arc::new(agent),
            chunk_size,
            model_timeout,
        }
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// One non-streaming completion, bounded by the model timeout.
    pub async fn try_complete(
        &self,
        conversation: &[ConversationTurn],
        model: &str,
    ) -> Result<String, ModelError> {
        match timeout(self.model_timeout, self.provider.complete(model, conversation)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::timeout(
                self.provider.id(),
                self.model_timeout.as_secs(),
            )),
        }
    }

    /// Like [`try_complete`](Self::try_complete), but answers
    /// `Error generating response` on failure.
    pub async fn complete(&self, conversation: &[ConversationTurn], model: &str) -> String {
        match self.try_complete(conversation, model).await {
            Ok(text) => text,
            Err(err) => {
                warn!(model, %err, "Completion failed");
                COMPLETION_ERROR_TEXT.to_string()
            }
        }
    }

    pub fn stream(&self, request: StreamRequest) -> EventStream {
        info!(model = %request.model, mode = request.mode.as_str(), "Streaming response");
        match request.mode {
            ChatMode::Ask => self.stream_ask(request),
            ChatMode::Agent => self.stream_agent(request),
        }
    }

    /// Single streaming call offering at most the image tool.
    fn stream_ask(&self, request: StreamRequest) -> EventStream {
        let provider = self.provider.clone();
        let idle = self.model_timeout;
        let image_tool = request.selection.borrow().internal.contains(IMAGE_TOOL_ID);

        let opened = async move {
            let call = provider.stream_response(&request.model, &request.conversation, image_tool);
            match timeout(idle, call).await {
                Ok(Ok(events)) => with_idle_timeout(events, idle, provider.id().to_string()),
                Ok(Err(err)) => failure(&err),
                Err(_) => failure(&ModelError::timeout(provider.id(), idle.as_secs())),
            }
        };
        stream::once(opened).flatten().boxed()
    }

    /// Runs the agent loop, then replays its answer as text deltas.
    fn stream_agent(&self, request: StreamRequest) -> EventStream {
        let agent = self.agent.clone();
        let chunk_size = self.chunk_size;
        let run = async move {
            let outcome = agent
                .run(AgentRequest::new(
                    request.conversation,
                    request.model,
                    request.selection,
                ))
                .await;
            agent_events(outcome, chunk_size)
        };
        stream::once(run).flat_map(stream::iter).boxed()
    }
}

fn failure(err: &ModelError) -> EventStream {
    warn!(%err, "Model stream failed");
    stream::iter([failure_event(err)]).boxed()
}

fn failure_event(err: &ModelError) -> StreamEvent {
    StreamEvent::error(format!("{STREAM_ERROR_TEXT} {}", err.user_message()))
}

/// Ends the stream with an error event when the upstream goes quiet.
fn with_idle_timeout(events: ModelEventStream, idle: Duration, provider: String) -> EventStream {
    stream::unfold(Some(events), move |state| {
        let provider = provider.clone();
        async move {
            let mut events = state?;
            match timeout(idle, events.next()).await {
                Ok(Some(Ok(event))) => Some((event, Some(events))),
                Ok(Some(Err(err))) => {
                    warn!(%err, "Model stream failed");
                    Some((failure_event(&err), None))
                }
                Ok(None) => None,
                Err(_) => {
                    let err = ModelError::timeout(provider, idle.as_secs());
                    warn!(%err, "Model stream went idle");
                    Some((failure_event(&err), None))
                }
            }
        }
    })
    .boxed()
}

/// Errors first, then the answer in chunks, then the terminal text.
fn agent_events(outcome: AgentOutcome, chunk_size: usize) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = outcome
        .errors
        .iter()
        .map(|message| StreamEvent::error(message.as_str()))
        .collect();
    events.extend(
        chunk_text(&outcome.text, chunk_size)
            .into_iter()
            .map(StreamEvent::text_delta),
    );
    events.push(StreamEvent::text_done(outcome.text));
    events
}

/// Splits on character boundaries into pieces of at most `size` characters.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if size == 0 {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
