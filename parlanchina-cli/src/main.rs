mod cli;

use clap::Parser;
use cli::Cli;
use parlanchina_core::application::tooling::{
    ConnectionManager, InternalToolExecutor, ToolRegistry,
};
use parlanchina_core::application::{AgentLoop, ChatService, ModelGateway};
use parlanchina_core::config::{AppConfig, McpRegistry};
use parlanchina_core::infrastructure::model::ProviderFactory;
use parlanchina_core::infrastructure::server;
use parlanchina_core::infrastructure::storage::{FsImageStore, InMemoryChatStore};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();
    info!("Starting Parlanchina");

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.mcp_config {
        config.mcp_config = path;
    }
    let addr = cli.addr.unwrap_or(config.bind);
    debug!(
        provider = ?config.provider.kind,
        model = %config.default_model,
        mcp_config = %config.mcp_config.display(),
        "Configuration loaded"
    );

    let registry = Arc::new(McpRegistry::new(config.mcp_config.clone()));
    if let Some(reason) = registry.disabled_reason() {
        warn!(%reason, "MCP tools unavailable");
    } else {
        info!(servers = registry.list_servers().len(), "MCP registry loaded");
    }

    let provider = ProviderFactory::create(&config.provider);
    let images = Arc::new(FsImageStore::new(config.image_dir.clone()));
    let internal = InternalToolExecutor::new(
        provider.clone(),
        images.clone(),
        config.provider.image_size.clone(),
        config.timeouts.model,
    );
    let servers = Arc::new(ConnectionManager::new(registry.clone(), config.timeouts.tool));
    let tools = Arc::new(ToolRegistry::new(internal, servers));

    let agent = AgentLoop::new(
        provider.clone(),
        tools.clone(),
        config.agent,
        config.timeouts.model,
    );
    let gateway = Arc::new(ModelGateway::new(
        provider,
        agent,
        config.agent.chunk_size,
        config.timeouts.model,
    ));
    let chat = Arc::new(ChatService::new(
        Arc::new(InMemoryChatStore::new()),
        images,
        gateway,
        tools,
        config.default_model.clone(),
    ));

    info!(%addr, "HTTP server starting");
    server::serve(chat, registry, config.image_dir.clone(), addr).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}
