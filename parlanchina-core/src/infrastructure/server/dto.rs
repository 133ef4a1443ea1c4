use crate::application::ChatError;
use crate::config::ServerSummary;
use crate::domain::{
    ChatMode, ChatSession, ImageRef, StoredMessage, ToolCallResult, ToolDefinition, ToolSelection,
};
use crate::infrastructure::mcp::ToolInvokeError;
use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<ChatError> for ErrorResponse {
    fn from(err: ChatError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

pub fn chat_error(err: ChatError) -> ApiError {
    let status = match &err {
        ChatError::SessionNotFound(_) | ChatError::Store(_) => StatusCode::NOT_FOUND,
        ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
    };
    (status, Json(ErrorResponse::from(err)))
}

pub fn tool_error(err: ToolInvokeError) -> ApiError {
    let status = match &err {
        ToolInvokeError::NotConfigured { .. } => StatusCode::NOT_FOUND,
        ToolInvokeError::Disabled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    api_error(status, err.to_string())
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageView {
    pub url: String,
    pub alt_text: String,
}

impl From<ImageRef> for ImageView {
    fn from(image: ImageRef) -> Self {
        Self {
            url: image.url,
            alt_text: image.alt_text,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    pub images: Vec<ImageView>,
}

impl From<StoredMessage> for MessageView {
    fn from(message: StoredMessage) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content,
            images: message.images.into_iter().map(ImageView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub id: String,
    pub title: String,
    pub model: String,
    pub mode: String,
    pub enabled_internal_tools: Option<Vec<String>>,
    pub enabled_mcp_tools: Option<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
    pub messages: Vec<MessageView>,
}

impl From<ChatSession> for SessionView {
    fn from(session: ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title,
            model: session.model,
            mode: session.mode.as_str().to_string(),
            enabled_internal_tools: session.enabled_internal_tools,
            enabled_mcp_tools: session.enabled_mcp_tools,
            created_at: session.created_at.to_rfc3339(),
            updated_at: session.updated_at.to_rfc3339(),
            messages: session.messages.into_iter().map(MessageView::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub message: String,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StreamQuery {
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModeRequest {
    #[schema(value_type = String, example = "agent")]
    pub mode: ChatMode,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToolSelectionRequest {
    pub internal: Option<Vec<String>>,
    pub mcp: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolSelectionView {
    pub internal: Vec<String>,
    pub mcp: Vec<String>,
}

impl From<ToolSelection> for ToolSelectionView {
    fn from(selection: ToolSelection) -> Self {
        Self {
            internal: selection.internal.into_iter().collect(),
            mcp: selection.mcp.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolView {
    pub id: String,
    pub server: Option<String>,
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub schema: Value,
}

impl From<ToolDefinition> for ToolView {
    fn from(tool: ToolDefinition) -> Self {
        Self {
            id: tool.id,
            server: tool.server,
            name: tool.name,
            description: tool.description,
            schema: tool.schema,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolCatalogResponse {
    pub internal: Vec<ToolView>,
    pub mcp: Vec<ToolView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServerView {
    pub name: String,
    pub transport_type: String,
    pub description: Option<String>,
}

impl From<ServerSummary> for ServerView {
    fn from(summary: ServerSummary) -> Self {
        Self {
            name: summary.name,
            transport_type: summary.transport_type,
            description: summary.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServerListResponse {
    pub enabled: bool,
    pub reason: Option<String>,
    pub servers: Vec<ServerView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolCallResponse {
    pub server_name: String,
    pub tool_name: String,
    #[schema(value_type = Object)]
    pub raw_result: Value,
    pub display_text: String,
    pub is_error: bool,
}

impl From<ToolCallResult> for ToolCallResponse {
    fn from(result: ToolCallResult) -> Self {
        Self {
            server_name: result.server_name,
            tool_name: result.tool_name,
            raw_result: result.raw_result,
            display_text: result.display_text,
            is_error: result.is_error,
        }
    }
}
