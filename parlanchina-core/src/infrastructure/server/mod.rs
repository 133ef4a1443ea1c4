//! HTTP surface: session routes, the NDJSON answer stream, tool and server
//! listings, generated images and the OpenAPI document.

mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use error::ServerError;

use crate::application::ChatService;
use crate::config::McpRegistry;
use axum::Router;
use state::ServerState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// The application router, without binding a listener.
pub fn app(chat: Arc<ChatService>, registry: Arc<McpRegistry>, image_dir: PathBuf) -> Router {
    router::build_router(Arc::new(ServerState::new(chat, registry, image_dir)))
}

pub async fn serve(
    chat: Arc<ChatService>,
    registry: Arc<McpRegistry>,
    image_dir: PathBuf,
    addr: SocketAddr,
) -> Result<(), ServerError> {
    router::serve(Arc::new(ServerState::new(chat, registry, image_dir)), addr).await
}
