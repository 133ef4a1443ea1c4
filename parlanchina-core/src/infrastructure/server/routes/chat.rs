use super::super::dto::{
    ApiError, ErrorResponse, ModeRequest, PostMessageRequest, StatusResponse, StreamQuery,
    ToolSelectionRequest, ToolSelectionView, chat_error,
};
use super::super::state::ServerState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info};

#[utoipa::path(
    post,
    path = "/chat/{id}",
    tag = "chat",
    params(("id" = String, Path, description = "Session id")),
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "Message stored", body = StatusResponse),
        (status = 400, description = "Empty message", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn post_message_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    debug!(session = %id, "Received chat message");
    state
        .chat()
        .post_message(&id, &request.message, request.model.as_deref())
        .map_err(chat_error)?;
    Ok(Json(StatusResponse::ok()))
}

/// Streams the answer as newline-delimited JSON events.
#[utoipa::path(
    get,
    path = "/chat/{id}/stream",
    tag = "chat",
    params(
        ("id" = String, Path, description = "Session id"),
        ("model" = Option<String>, Query, description = "Model override for this answer")
    ),
    responses(
        (status = 200, description = "NDJSON event stream", content_type = "application/x-ndjson", body = String),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn stream_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, ApiError> {
    info!(session = %id, model = query.model.as_deref(), "Opening chat stream");
    let events = state
        .chat()
        .stream(&id, query.model.as_deref())
        .await
        .map_err(chat_error)?;
    let lines = events.map(|event| Ok::<_, Infallible>(event.to_ndjson()));

    let mut response = Body::from_stream(lines).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-ndjson"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    Ok(response)
}

#[utoipa::path(
    put,
    path = "/chat/{id}/mode",
    tag = "chat",
    params(("id" = String, Path, description = "Session id")),
    request_body = ModeRequest,
    responses(
        (status = 200, description = "Mode updated", body = StatusResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn set_mode_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<ModeRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.chat().set_mode(&id, request.mode).map_err(chat_error)?;
    Ok(Json(StatusResponse::ok()))
}

/// Replaces the enabled tool lists. Omitted lists are left unchanged.
#[utoipa::path(
    put,
    path = "/chat/{id}/tools",
    tag = "chat",
    params(("id" = String, Path, description = "Session id")),
    request_body = ToolSelectionRequest,
    responses(
        (status = 200, description = "Current selection", body = ToolSelectionView),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn set_tools_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<ToolSelectionRequest>,
) -> Result<Json<ToolSelectionView>, ApiError> {
    let chat = state.chat();
    chat.load_session(&id).map_err(chat_error)?;
    let selection = chat
        .set_tools(&id, request.internal, request.mcp)
        .map_err(chat_error)?;
    info!(
        session = %id,
        internal = selection.internal.len(),
        mcp = selection.mcp.len(),
        "Updated tool selection"
    );
    Ok(Json(ToolSelectionView::from(selection)))
}
