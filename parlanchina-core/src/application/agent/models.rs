use crate::domain::{ConversationTurn, ImageRef, ToolSelection};
use tokio::sync::watch;

/// Input of one agent run.
///
/// `selection` is re-read before every dispatched tool call, so a sender
/// held by the caller can disable tools while the run is in flight.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub conversation: Vec<ConversationTurn>,
    pub model: String,
    pub selection: watch::Receiver<ToolSelection>,
}

impl AgentRequest {
    pub fn new(
        conversation: Vec<ConversationTurn>,
        model: impl Into<String>,
        selection: watch::Receiver<ToolSelection>,
    ) -> Self {
        Self {
            conversation,
            model: model.into(),
            selection,
        }
    }

    /// Request over a selection that never changes during the run.
    pub fn fixed(
        conversation: Vec<ConversationTurn>,
        model: impl Into<String>,
        selection: ToolSelection,
    ) -> Self {
        let (_, receiver) = watch::channel(selection);
        Self::new(conversation, model, receiver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutcome {
    /// Terminal answer; never empty.
    pub text: String,
    /// Backend failures observed along the way, as user-facing messages.
    pub errors: Vec<String>,
    /// Images produced by internal tools during the run.
    pub images: Vec<ImageRef>,
    pub tool_calls: usize,
}
