use super::types::{ChatMode, ConversationTurn, MessageRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Title given to sessions before one is generated.
pub const DEFAULT_TITLE: &str = "New chat";

/// An image attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub alt_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
}

impl StoredMessage {
    pub fn to_turn(&self) -> ConversationTurn {
        ConversationTurn::new(self.role, self.content.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub model: String,
    #[serde(default)]
    pub mode: ChatMode,
    /// `None` means every internal tool is enabled.
    #[serde(default)]
    pub enabled_internal_tools: Option<Vec<String>>,
    /// `None` means "not chosen yet"; agent mode then offers every listed tool.
    #[serde(default)]
    pub enabled_mcp_tools: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

impl ChatSession {
    pub fn conversation(&self) -> Vec<ConversationTurn> {
        self.messages.iter().map(StoredMessage::to_turn).collect()
    }

    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.role == MessageRole::User)
            .count()
    }
}

/// Tool ids enabled for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSelection {
    pub internal: BTreeSet<String>,
    pub mcp: BTreeSet<String>,
}

impl ToolSelection {
    pub fn new(
        internal: impl IntoIterator<Item = String>,
        mcp: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            internal: internal.into_iter().collect(),
            mcp: mcp.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty() && self.mcp.is_empty()
    }

    /// Whether a canonical tool id is enabled in either set.
    pub fn contains(&self, tool_id: &str) -> bool {
        self.internal.contains(tool_id) || self.mcp.contains(tool_id)
    }
}
