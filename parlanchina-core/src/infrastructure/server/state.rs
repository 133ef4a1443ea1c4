use crate::application::ChatService;
use crate::config::McpRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) struct ServerState {
    chat: Arc<ChatService>,
    registry: Arc<McpRegistry>,
    image_dir: PathBuf,
}

impl ServerState {
    pub(crate) fn new(
        chat: Arc<ChatService>,
        registry: Arc<McpRegistry>,
        image_dir: PathBuf,
    ) -> Self {
        Self {
            chat,
            registry,
            image_dir,
        }
    }

    pub(crate) fn chat(&self) -> Arc<ChatService> {
        Arc::clone(&self.chat)
    }

    pub(crate) fn registry(&self) -> &McpRegistry {
        &self.registry
    }

    pub(crate) fn image_dir(&self) -> &Path {
        &self.image_dir
    }
}
