//! Chat service: sessions, streaming runs and background titles.

use crate::application::gateway::{ModelGateway, StreamRequest};
use crate::application::stream::{EventMultiplexer, OutputEvent};
use crate::application::tooling::ToolRegistry;
use crate::domain::{ChatMode, ChatSession, ConversationTurn, ToolSelection};
use crate::infrastructure::storage::{ChatStore, ImageStore, StoreError};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

const TITLE_MAX_CHARS: usize = 50;
const STREAM_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),
    #[error("message content required")]
    EmptyMessage,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Output of [`ChatService::stream`]: protocol events in order, ending with
/// `text_done` unless the consumer goes away first.
pub type OutputStream = BoxStream<'static, OutputEvent>;

pub struct ChatService {
    store: Arc<dyn ChatStore>,
    images: Arc<dyn ImageStore>,
    gateway: Arc<ModelGateway>,
    tools: Arc<ToolRegistry>,
    default_model: String,
    selections: Mutex<HashMap<String, watch::Sender<ToolSelection>>>,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn ChatStore>,
        images: Arc<dyn ImageStore>,
        gateway: Arc<ModelGateway>,
        tools: Arc<ToolRegistry>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            images,
            gateway,
            tools,
            default_model: default_model.into(),
            selections: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn create_session(&self, title: Option<&str>, model: Option<&str>) -> ChatSession {
        let model = model.unwrap_or(self.default_model.as_str());
        let session = self.store.create_session(title, model);
        info!(session = %session.id, model, "Created chat session");
        session
    }

    pub fn load_session(&self, id: &str) -> Result<ChatSession, ChatError> {
        self.store
            .load_session(id)
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    pub fn list_sessions(&self) -> Vec<ChatSession> {
        self.store.list_sessions()
    }

    pub fn delete_session(&self, id: &str) -> Result<(), ChatError> {
        self.store.delete_session(id)?;
        self.lock_selections().remove(id);
        Ok(())
    }

    pub fn rename_session(&self, id: &str, title: &str) -> Result<(), ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        Ok(self.store.update_title(id, title)?)
    }

    /// Appends a user message. The first message of a session also starts
    /// title generation in the background.
    pub fn post_message(
        &self,
        id: &str,
        content: &str,
        model: Option<&str>,
    ) -> Result<(), ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let session = self.store.append_user_message(id, content, model)?;
        debug!(session = %id, "Appended user message");

        if session.user_message_count() == 1 && session.messages.len() == 1 {
            let gateway = self.gateway.clone();
            let store = self.store.clone();
            let id = id.to_string();
            let content = content.to_string();
            let model = session.model.clone();
            tokio::spawn(async move {
                generate_title(&gateway, store.as_ref(), &id, &content, &model).await;
            });
        }
        Ok(())
    }

    pub fn set_mode(&self, id: &str, mode: ChatMode) -> Result<(), ChatError> {
        self.store.set_mode(id, mode)?;
        info!(session = %id, mode = mode.as_str(), "Updated chat mode");
        Ok(())
    }

    /// Stores a new tool selection. A run in flight for the session sees
    /// it from its next dispatch turn.
    pub fn set_tools(
        &self,
        id: &str,
        internal: Option<Vec<String>>,
        mcp: Option<Vec<String>>,
    ) -> Result<ToolSelection, ChatError> {
        if let Some(internal) = internal {
            self.store.set_enabled_internal_tools(id, internal)?;
        }
        if let Some(mcp) = mcp {
            self.store.set_enabled_mcp_tools(id, mcp)?;
        }
        let selection = ToolSelection::new(
            self.store.get_enabled_internal_tools(id).unwrap_or_default(),
            self.store.get_enabled_mcp_tools(id).unwrap_or_default(),
        );
        if let Some(sender) = self.lock_selections().get(id) {
            sender.send_replace(selection.clone());
        }
        Ok(selection)
    }

    /// Tools enabled for the next run, filling in the session defaults:
    /// every internal tool, and in agent mode every listed MCP tool.
    pub async fn resolve_selection(
        &self,
        id: &str,
        mode: ChatMode,
    ) -> Result<ToolSelection, ChatError> {
        let internal = match self.store.get_enabled_internal_tools(id) {
            Some(internal) => internal,
            None => {
                let all = self.tools.internal_ids();
                self.store.set_enabled_internal_tools(id, all.clone())?;
                all
            }
        };

        let mut mcp = Vec::new();
        if mode == ChatMode::Agent && self.tools.servers().is_enabled() {
            mcp = match self.store.get_enabled_mcp_tools(id) {
                Some(mcp) => mcp,
                None => {
                    let all: Vec<String> = self
                        .tools
                        .list_all_tools()
                        .await
                        .into_iter()
                        .map(|tool| tool.id)
                        .collect();
                    self.store.set_enabled_mcp_tools(id, all.clone())?;
                    all
                }
            };
        }
        Ok(ToolSelection::new(internal, mcp))
    }

    /// Starts a run over the session's conversation.
    ///
    /// The run executes on its own task and stops at the next event once the
    /// returned stream is dropped. The assistant message is persisted before
    /// the terminal `text_done` is sent.
    pub async fn stream(&self, id: &str, model: Option<&str>) -> Result<OutputStream, ChatError> {
        let session = self.load_session(id)?;
        let model = model
            .filter(|model| !model.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if session.model.is_empty() {
                    self.default_model.clone()
                } else {
                    session.model.clone()
                }
            });
        let mode = self.store.get_mode(id);
        let selection = self.resolve_selection(id, mode).await?;
        let receiver = self.subscribe(id, selection);

        let request = StreamRequest {
            conversation: session.conversation(),
            model: model.clone(),
            mode,
            selection: receiver,
        };
        let mut events = self.gateway.stream(request);
        let mut multiplexer =
            EventMultiplexer::new(self.images.clone(), self.gateway.clone(), model.clone());
        let store = self.store.clone();
        let id = id.to_string();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = tx.closed() => {
                        info!(session = %id, "Client disconnected; stopping run");
                        return;
                    }
                    event = events.next() => event,
                };
                let Some(event) = event else { break };
                if let Some(output) = multiplexer.on_event(event).await {
                    if tx.send(output).await.is_err() {
                        info!(session = %id, "Client disconnected; stopping run");
                        return;
                    }
                }
            }

            let (done, summary) = multiplexer.finish();
            if !summary.text.trim().is_empty() {
                if let Err(err) = store.append_assistant_message(
                    &id,
                    &summary.text,
                    Some(model.as_str()),
                    summary.images,
                ) {
                    warn!(session = %id, %err, "Failed to persist assistant message");
                }
            }
            let _ = tx.send(done).await;
        });

        Ok(ReceiverStream::new(rx).boxed())
    }

    fn subscribe(&self, id: &str, selection: ToolSelection) -> watch::Receiver<ToolSelection> {
        let mut selections = self.lock_selections();
        match selections.get(id) {
            Some(sender) => {
                sender.send_replace(selection);
                sender.subscribe()
            }
            None => {
                let (sender, receiver) = watch::channel(selection);
                selections.insert(id.to_string(), sender);
                receiver
            }
        }
    }

    fn lock_selections(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, watch::Sender<ToolSelection>>> {
        self.selections.lock().unwrap_or_else(|e| e.into_inner())
    }
}

async fn generate_title(
    gateway: &ModelGateway,
    store: &dyn ChatStore,
    id: &str,
    message: &str,
    model: &str,
) {
    let prompt = [
        ConversationTurn::system(
            "You are a helpful assistant that creates concise, descriptive titles for chat \
             sessions. Generate a short title (3-6 words) that summarizes the main topic or \
             request from the user's message. Respond with only the title, no quotes or \
             additional text.",
        ),
        ConversationTurn::user(format!(
            "Create a short title for a chat session based on this user message: {message}"
        )),
    ];
    let raw = match gateway.try_complete(&prompt, model).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(session = %id, %err, "Failed to generate session title");
            return;
        }
    };
    let Some(title) = clean_title(&raw) else {
        return;
    };
    match store.update_title(id, &title) {
        Ok(()) => info!(session = %id, title = %title, "Generated session title"),
        Err(err) => warn!(session = %id, %err, "Failed to store session title"),
    }
}

/// Strips quotes and caps the length at 50 characters.
pub fn clean_title(raw: &str) -> Option<String> {
    let title = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if title.is_empty() {
        return None;
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        let cut: String = title.chars().take(TITLE_MAX_CHARS - 3).collect();
        return Some(format!("{}...", cut.trim_end()));
    }
    Some(title.to_string())
}
