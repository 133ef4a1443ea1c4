use super::super::dto::{
    ApiError, CreateSessionRequest, ErrorResponse, RenameRequest, SessionView, StatusResponse,
    chat_error,
};
use super::super::state::ServerState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionView)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<ServerState>>,
    payload: Option<Json<CreateSessionRequest>>,
) -> (StatusCode, Json<SessionView>) {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let session = state
        .chat()
        .create_session(request.title.as_deref(), request.model.as_deref());
    info!(session = %session.id, "Created chat session");
    (StatusCode::CREATED, Json(SessionView::from(session)))
}

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Sessions, most recently updated first", body = [SessionView])
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<ServerState>>,
) -> Json<Vec<SessionView>> {
    Json(
        state
            .chat()
            .list_sessions()
            .into_iter()
            .map(SessionView::from)
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session with its messages", body = SessionView),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.chat().load_session(&id).map_err(chat_error)?;
    Ok(Json(SessionView::from(session)))
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/title",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Title updated", body = StatusResponse),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn rename_session_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .chat()
        .rename_session(&id, &request.title)
        .map_err(chat_error)?;
    Ok(Json(StatusResponse::ok()))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = StatusResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.chat().delete_session(&id).map_err(chat_error)?;
    info!(session = %id, "Deleted chat session");
    Ok(Json(StatusResponse::ok()))
}
