//! Application constants
//!
//! Single source of truth for paths and engine limits.

/// Default settings file path
pub const CONFIG_PATH: &str = "config/settings.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// Default tool-server configuration document
pub const MCP_CONFIG_PATH: &str = "config/mcp.json";

/// Default directory for generated images
pub const IMAGE_DIR: &str = "data/images";

/// URL prefix under which saved images are served
pub const IMAGE_URL_PREFIX: &str = "/images";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Dispatch turns allowed before the loop is considered exhausted
pub const MAX_AGENT_TURNS: usize = 6;

/// Extra tool-enabled turns granted to the summary fallback
pub const FALLBACK_TURNS: usize = 2;

/// Characters per synthesized text delta in agent mode
pub const TEXT_CHUNK_SIZE: usize = 200;

pub const MODEL_TIMEOUT_SECS: u64 = 120;
pub const TOOL_TIMEOUT_SECS: u64 = 60;

/// Fixed reply returned by non-streaming completions when the backend fails
pub const COMPLETION_ERROR_TEXT: &str = "Error generating response";
