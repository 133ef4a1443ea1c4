//! Parlanchina engine: tool-server registry and MCP transports, the agent
//! loop, the model gateway and the NDJSON event stream served to clients.
//!
//! # Layout
//! - [`config`] - settings file, provider config and the `mcp.json` registry
//! - [`domain`] - conversation, tool and stream event types
//! - [`application`] - tool registry, agent loop, gateway and chat service
//! - [`infrastructure`] - MCP client, model provider, storage and HTTP server

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{
    AgentLoop, AgentOutcome, AgentRequest, ChatError, ChatService, EventMultiplexer, ModelGateway,
    OutputEvent, OutputStream, StreamRequest,
};
pub use application::tooling::{ConnectionManager, InternalToolExecutor, ToolRegistry};
pub use config::{AppConfig, ConfigError, McpRegistry};
pub use infrastructure::model::{ModelProvider, ProviderFactory};
pub use infrastructure::storage::{FsImageStore, InMemoryChatStore};
