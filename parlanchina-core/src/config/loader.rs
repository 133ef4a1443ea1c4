use super::app::{AgentSettings, AppConfig, Timeouts, parse_bind};
use super::error::ConfigError;
use super::provider::RawProviderConfig;
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw settings structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub default_model: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    pub mcp_config: Option<String>,
    pub image_dir: Option<String>,
    #[serde(default)]
    pub provider: RawProviderConfig,
    #[serde(default)]
    pub agent: RawAgent,
    #[serde(default)]
    pub timeouts: RawTimeouts,
    #[serde(default)]
    pub server: RawServerSection,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawAgent {
    pub max_turns: Option<usize>,
    pub fallback_turns: Option<usize>,
    pub plan: Option<bool>,
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawTimeouts {
    pub model_secs: Option<u64>,
    pub tool_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawServerSection {
    pub bind: Option<String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate settings from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

pub(super) fn defaults_with_env() -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    validate_and_build(RawConfig::default(), |key| env::var(key).ok())
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading settings file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path, |key| env::var(key).ok())
}

pub(super) fn parse_config(
    content: &str,
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_and_build(parsed, lookup)
}

fn validate_and_build(
    parsed: RawConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();

    let agent_defaults = AgentSettings::default();
    let agent = AgentSettings {
        max_turns: non_zero(
            parsed.agent.max_turns.unwrap_or(agent_defaults.max_turns),
            "agent.max_turns",
        )?,
        fallback_turns: parsed
            .agent
            .fallback_turns
            .unwrap_or(agent_defaults.fallback_turns),
        plan: parsed.agent.plan.unwrap_or(agent_defaults.plan),
        chunk_size: non_zero(
            parsed.agent.chunk_size.unwrap_or(agent_defaults.chunk_size),
            "agent.chunk_size",
        )?,
    };

    let timeout_defaults = Timeouts::default();
    let timeouts = Timeouts {
        model: parsed
            .timeouts
            .model_secs
            .map(|secs| non_zero(secs as usize, "timeouts.model_secs").map(|_| secs))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(timeout_defaults.model),
        tool: parsed
            .timeouts
            .tool_secs
            .map(|secs| non_zero(secs as usize, "timeouts.tool_secs").map(|_| secs))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(timeout_defaults.tool),
    };

    let default_model = parsed
        .default_model
        .filter(|model| !model.trim().is_empty())
        .or_else(|| parsed.models.first().cloned())
        .unwrap_or(defaults.default_model);
    let mut models = parsed.models;
    if !models.contains(&default_model) {
        models.insert(0, default_model.clone());
    }

    Ok(AppConfig {
        default_model,
        models,
        mcp_config: expand_path(parsed.mcp_config).unwrap_or(defaults.mcp_config),
        image_dir: expand_path(parsed.image_dir).unwrap_or(defaults.image_dir),
        provider: parsed.provider.with_env_overrides(lookup).build()?,
        agent,
        timeouts,
        bind: parse_bind(parsed.server.bind)?,
    })
}

fn non_zero(value: usize, field: &'static str) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroLimit { field })
    } else {
        Ok(value)
    }
}

fn expand_path(value: Option<String>) -> Option<PathBuf> {
    value.map(|raw| {
        let expanded = shellexpand::full(&raw)
            .map(|cow| cow.into_owned())
            .unwrap_or(raw);
        PathBuf::from(expanded)
    })
}
