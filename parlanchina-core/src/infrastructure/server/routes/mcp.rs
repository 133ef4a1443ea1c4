use super::super::dto::{
    ApiError, ErrorResponse, ServerListResponse, ServerView, ToolCallResponse, ToolView, tool_error,
};
use super::super::state::ServerState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Map as JsonMap, Value};
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    get,
    path = "/mcp/servers",
    tag = "mcp",
    responses(
        (status = 200, description = "Configured tool servers", body = ServerListResponse)
    )
)]
pub async fn list_servers_handler(
    State(state): State<Arc<ServerState>>,
) -> Json<ServerListResponse> {
    let registry = state.registry();
    Json(ServerListResponse {
        enabled: registry.is_enabled(),
        reason: registry.disabled_reason(),
        servers: registry
            .list_servers()
            .into_iter()
            .map(ServerView::from)
            .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/mcp/servers/{name}/tools",
    tag = "mcp",
    params(("name" = String, Path, description = "Server name")),
    responses(
        (status = 200, description = "Tools listed by the server", body = [ToolView]),
        (status = 404, description = "Unknown server", body = ErrorResponse),
        (status = 502, description = "Server could not be reached", body = ErrorResponse)
    )
)]
pub async fn list_server_tools_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ToolView>>, ApiError> {
    let tools = state
        .chat()
        .tools()
        .servers()
        .list_tools(&name)
        .await
        .map_err(tool_error)?;
    Ok(Json(tools.into_iter().map(ToolView::from).collect()))
}

/// Calls one tool directly, outside any chat run.
#[utoipa::path(
    post,
    path = "/mcp/servers/{name}/tools/{tool}",
    tag = "mcp",
    params(
        ("name" = String, Path, description = "Server name"),
        ("tool" = String, Path, description = "Tool name")
    ),
    responses(
        (status = 200, description = "Tool result; failures are described in display_text", body = ToolCallResponse)
    )
)]
pub async fn call_tool_handler(
    State(state): State<Arc<ServerState>>,
    Path((name, tool)): Path<(String, String)>,
    payload: Option<Json<JsonMap<String, Value>>>,
) -> Json<ToolCallResponse> {
    let arguments = payload.map(|Json(arguments)| arguments).unwrap_or_default();
    info!(server = %name, tool = %tool, "Direct tool call");
    let result = state
        .chat()
        .tools()
        .servers()
        .call_tool(&name, &tool, arguments)
        .await;
    Json(ToolCallResponse::from(result))
}
