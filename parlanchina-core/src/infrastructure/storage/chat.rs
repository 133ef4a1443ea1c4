use super::error::StoreError;
use crate::domain::session::DEFAULT_TITLE;
use crate::domain::{ChatMode, ChatSession, ImageRef, MessageRole, StoredMessage};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Session persistence used by the chat service.
pub trait ChatStore: Send + Sync {
    fn create_session(&self, title: Option<&str>, model: &str) -> ChatSession;
    fn load_session(&self, id: &str) -> Option<ChatSession>;
    fn list_sessions(&self) -> Vec<ChatSession>;
    fn delete_session(&self, id: &str) -> Result<(), StoreError>;

    fn append_user_message(
        &self,
        id: &str,
        content: &str,
        model: Option<&str>,
    ) -> Result<ChatSession, StoreError>;
    fn append_assistant_message(
        &self,
        id: &str,
        content: &str,
        model: Option<&str>,
        images: Vec<ImageRef>,
    ) -> Result<StoredMessage, StoreError>;
    fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError>;

    fn get_mode(&self, id: &str) -> ChatMode;
    fn set_mode(&self, id: &str, mode: ChatMode) -> Result<(), StoreError>;
    fn get_enabled_internal_tools(&self, id: &str) -> Option<Vec<String>>;
    fn set_enabled_internal_tools(&self, id: &str, tools: Vec<String>) -> Result<(), StoreError>;
    fn get_enabled_mcp_tools(&self, id: &str) -> Option<Vec<String>>;
    fn set_enabled_mcp_tools(&self, id: &str, tools: Vec<String>) -> Result<(), StoreError>;
}

/// Process-local session store.
#[derive(Default)]
pub struct InMemoryChatStore {
    sessions: RwLock<HashMap<String, ChatSession>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut ChatSession) -> T,
    ) -> Result<T, StoreError> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound { id: id.to_string() })?;
        let value = apply(session);
        session.updated_at = Utc::now();
        Ok(value)
    }

    fn read<T>(&self, id: &str, view: impl FnOnce(&ChatSession) -> T) -> Option<T> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.get(id).map(view)
    }
}

impl ChatStore for InMemoryChatStore {
    fn create_session(&self, title: Option<&str>, model: &str) -> ChatSession {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4().simple().to_string(),
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_TITLE)
                .to_string(),
            model: model.to_string(),
            mode: ChatMode::Ask,
            enabled_internal_tools: None,
            enabled_mcp_tools: None,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        };
        debug!(session = %session.id, "created chat session");
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.id.clone(), session.clone());
        session
    }

    fn load_session(&self, id: &str) -> Option<ChatSession> {
        self.read(id, Clone::clone)
    }

    fn list_sessions(&self) -> Vec<ChatSession> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let mut list: Vec<_> = sessions.values().cloned().collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    fn delete_session(&self, id: &str) -> Result<(), StoreError> {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::SessionNotFound { id: id.to_string() })
    }

    fn append_user_message(
        &self,
        id: &str,
        content: &str,
        model: Option<&str>,
    ) -> Result<ChatSession, StoreError> {
        self.update(id, |session| {
            session.messages.push(StoredMessage {
                role: MessageRole::User,
                content: content.to_string(),
                images: Vec::new(),
            });
            if let Some(model) = model {
                session.model = model.to_string();
            }
            session.clone()
        })
    }

    fn append_assistant_message(
        &self,
        id: &str,
        content: &str,
        model: Option<&str>,
        images: Vec<ImageRef>,
    ) -> Result<StoredMessage, StoreError> {
        self.update(id, |session| {
            let message = StoredMessage {
                role: MessageRole::Assistant,
                content: content.to_string(),
                images,
            };
            session.messages.push(message.clone());
            if let Some(model) = model {
                session.model = model.to_string();
            }
            message
        })
    }

    fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        self.update(id, |session| session.title = title.to_string())
    }

    fn get_mode(&self, id: &str) -> ChatMode {
        self.read(id, |session| session.mode).unwrap_or_default()
    }

    fn set_mode(&self, id: &str, mode: ChatMode) -> Result<(), StoreError> {
        self.update(id, |session| session.mode = mode)
    }

    fn get_enabled_internal_tools(&self, id: &str) -> Option<Vec<String>> {
        self.read(id, |session| session.enabled_internal_tools.clone())
            .flatten()
    }

    fn set_enabled_internal_tools(&self, id: &str, tools: Vec<String>) -> Result<(), StoreError> {
        self.update(id, |session| session.enabled_internal_tools = Some(tools))
    }

    fn get_enabled_mcp_tools(&self, id: &str) -> Option<Vec<String>> {
        self.read(id, |session| session.enabled_mcp_tools.clone())
            .flatten()
    }

    fn set_enabled_mcp_tools(&self, id: &str, tools: Vec<String>) -> Result<(), StoreError> {
        self.update(id, |session| session.enabled_mcp_tools = Some(tools))
    }
}
