pub mod app;
pub mod error;
pub mod loader;
pub mod provider;
pub mod registry;
pub mod server;

pub use app::{AgentSettings, AppConfig, Timeouts};
pub use error::ConfigError;
pub use provider::{ModelProviderConfig, ProviderKind};
pub use registry::{McpRegistry, RegistrySnapshot};
pub use server::{ServerConfig, ServerSummary, TransportConfig};
