use super::dto::{
    CreateSessionRequest, ErrorResponse, ImageView, MessageView, ModeRequest, PostMessageRequest,
    RenameRequest, ServerListResponse, ServerView, SessionView, StatusResponse,
    ToolCallResponse, ToolCatalogResponse, ToolSelectionRequest, ToolSelectionView, ToolView,
};
use super::routes;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::sessions::create_session_handler,
        routes::sessions::list_sessions_handler,
        routes::sessions::get_session_handler,
        routes::sessions::rename_session_handler,
        routes::sessions::delete_session_handler,
        routes::chat::post_message_handler,
        routes::chat::stream_handler,
        routes::chat::set_mode_handler,
        routes::chat::set_tools_handler,
        routes::tools::tools_handler,
        routes::mcp::list_servers_handler,
        routes::mcp::list_server_tools_handler,
        routes::mcp::call_tool_handler
    ),
    components(
        schemas(
            CreateSessionRequest,
            RenameRequest,
            SessionView,
            MessageView,
            ImageView,
            PostMessageRequest,
            ModeRequest,
            ToolSelectionRequest,
            ToolSelectionView,
            ToolView,
            ToolCatalogResponse,
            ServerView,
            ServerListResponse,
            ToolCallResponse,
            StatusResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "sessions", description = "Chat session lifecycle"),
        (name = "chat", description = "Messages, streaming answers and per-session settings"),
        (name = "tools", description = "Tools a session can enable"),
        (name = "mcp", description = "Configured MCP tool servers")
    )
)]
pub(super) struct ApiDoc;
