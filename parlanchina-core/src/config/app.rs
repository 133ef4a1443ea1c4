use super::error::ConfigError;
use super::provider::ModelProviderConfig;
use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_MODEL, FALLBACK_TURNS, IMAGE_DIR, MAX_AGENT_TURNS, MCP_CONFIG_PATH,
    MODEL_TIMEOUT_SECS, TEXT_CHUNK_SIZE, TOOL_TIMEOUT_SECS,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Limits governing the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub max_turns: usize,
    pub fallback_turns: usize,
    pub plan: bool,
    pub chunk_size: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: MAX_AGENT_TURNS,
            fallback_turns: FALLBACK_TURNS,
            plan: true,
            chunk_size: TEXT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub model: Duration,
    pub tool: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            model: Duration::from_secs(MODEL_TIMEOUT_SECS),
            tool: Duration::from_secs(TOOL_TIMEOUT_SECS),
        }
    }
}

/// Fully validated application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_model: String,
    pub models: Vec<String>,
    pub mcp_config: PathBuf,
    pub image_dir: PathBuf,
    pub provider: ModelProviderConfig,
    pub agent: AgentSettings,
    pub timeouts: Timeouts,
    pub bind: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            models: vec![DEFAULT_MODEL.to_string()],
            mcp_config: PathBuf::from(MCP_CONFIG_PATH),
            image_dir: PathBuf::from(IMAGE_DIR),
            provider: ModelProviderConfig::default(),
            agent: AgentSettings::default(),
            timeouts: Timeouts::default(),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}

impl AppConfig {
    /// Load settings from a TOML file, falling back to the default path.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Load settings, or use defaults when the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound { .. }) => super::loader::defaults_with_env(),
            other => other,
        }
    }

    /// Model to use when a request does not name one.
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if self.default_model.is_empty() {
                    self.models.first().cloned().unwrap_or_default()
                } else {
                    self.default_model.clone()
                }
            })
    }
}

pub(crate) fn parse_bind(value: Option<String>) -> Result<SocketAddr, ConfigError> {
    let value = value.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::InvalidBind { value })
}
