use super::super::dto::{ToolCatalogResponse, ToolView};
use super::super::state::ServerState;
use axum::Json;
use axum::extract::State;
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Internal tools and every tool the MCP servers list", body = ToolCatalogResponse)
    )
)]
pub async fn tools_handler(State(state): State<Arc<ServerState>>) -> Json<ToolCatalogResponse> {
    let chat = state.chat();
    let tools = chat.tools();
    let internal: Vec<ToolView> = tools
        .internal_tools()
        .iter()
        .cloned()
        .map(ToolView::from)
        .collect();
    let mcp: Vec<ToolView> = tools
        .list_all_tools()
        .await
        .into_iter()
        .map(ToolView::from)
        .collect();
    debug!(
        internal = internal.len(),
        mcp = mcp.len(),
        "Serving /tools request"
    );
    Json(ToolCatalogResponse { internal, mcp })
}
