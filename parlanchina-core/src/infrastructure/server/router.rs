use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, post, put};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::constants::IMAGE_URL_PREFIX;

pub(super) fn build_router(state: Arc<ServerState>) -> Router {
    let api = ApiDoc::openapi();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let images = ServeDir::new(state.image_dir());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", api))
        .route(
            "/sessions",
            post(routes::sessions::create_session_handler)
                .get(routes::sessions::list_sessions_handler),
        )
        .route(
            "/sessions/{id}",
            get(routes::sessions::get_session_handler)
                .delete(routes::sessions::delete_session_handler),
        )
        .route(
            "/sessions/{id}/title",
            put(routes::sessions::rename_session_handler),
        )
        .route("/chat/{id}", post(routes::chat::post_message_handler))
        .route("/chat/{id}/stream", get(routes::chat::stream_handler))
        .route("/chat/{id}/mode", put(routes::chat::set_mode_handler))
        .route("/chat/{id}/tools", put(routes::chat::set_tools_handler))
        .route("/tools", get(routes::tools::tools_handler))
        .route("/mcp/servers", get(routes::mcp::list_servers_handler))
        .route(
            "/mcp/servers/{name}/tools",
            get(routes::mcp::list_server_tools_handler),
        )
        .route(
            "/mcp/servers/{name}/tools/{tool}",
            post(routes::mcp::call_tool_handler),
        )
        .nest_service(IMAGE_URL_PREFIX, images)
        .layer(cors)
        .with_state(state)
}

pub(super) async fn serve(state: Arc<ServerState>, addr: SocketAddr) -> Result<(), ServerError> {
    info!(%addr, "Binding HTTP server");
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "HTTP server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}
