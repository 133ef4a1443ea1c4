// Settings file tests - loading config/settings.toml style documents.

use parlanchina_core::config::{AppConfig, ConfigError, ProviderKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_settings(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("settings.toml");
    fs::write(&path, content).expect("Failed to write settings");
    path
}

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/settings.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let config = AppConfig::load_or_default(Some(Path::new("/nonexistent/path/settings.toml")))
        .expect("defaults");
    assert_eq!(config.agent.max_turns, 6);
    assert_eq!(config.agent.fallback_turns, 2);
    assert_eq!(config.agent.chunk_size, 200);
}

#[test]
fn reads_every_section() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        r#"
default_model = "gpt-4.1"
models = ["gpt-4o-mini", "gpt-4.1"]
mcp_config = "/etc/parlanchina/mcp.json"
image_dir = "/var/lib/parlanchina/images"

[provider]
endpoint = "https://llm.internal/v1"
image_size = "512x512"

[agent]
max_turns = 4
fallback_turns = 1
plan = false
chunk_size = 64

[timeouts]
model_secs = 30
tool_secs = 15

[server]
bind = "0.0.0.0:8080"
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("valid settings");
    assert_eq!(config.default_model, "gpt-4.1");
    assert_eq!(config.models, vec!["gpt-4o-mini", "gpt-4.1"]);
    assert_eq!(config.mcp_config, PathBuf::from("/etc/parlanchina/mcp.json"));
    assert_eq!(config.image_dir, PathBuf::from("/var/lib/parlanchina/images"));
    assert_eq!(config.provider.image_size, "512x512");
    assert_eq!(config.agent.max_turns, 4);
    assert_eq!(config.agent.fallback_turns, 1);
    assert!(!config.agent.plan);
    assert_eq!(config.agent.chunk_size, 64);
    assert_eq!(config.timeouts.model, Duration::from_secs(30));
    assert_eq!(config.timeouts.tool, Duration::from_secs(15));
    assert_eq!(config.bind.to_string(), "0.0.0.0:8080");
}

#[test]
fn default_model_joins_the_model_list() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        r#"
default_model = "gpt-4.1"
models = ["gpt-4o-mini"]
"#,
    );
    let config = AppConfig::load(Some(&path)).expect("valid settings");
    assert_eq!(config.models, vec!["gpt-4.1", "gpt-4o-mini"]);
    assert_eq!(config.resolve_model(None), "gpt-4.1");
    assert_eq!(config.resolve_model(Some("  ")), "gpt-4.1");
    assert_eq!(config.resolve_model(Some("gpt-4o-mini")), "gpt-4o-mini");
}

#[test]
fn azure_without_api_version_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        r#"
[provider]
kind = "azure"
endpoint = "https://example.openai.azure.com"
"#,
    );
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::MissingApiVersion)));
}

#[test]
fn azure_with_api_version_is_accepted() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(
        dir.path(),
        r#"
[provider]
kind = "azure"
endpoint = "https://example.openai.azure.com"
api_version = "2024-10-21"
"#,
    );
    let config = AppConfig::load(Some(&path)).expect("valid settings");
    assert_eq!(config.provider.kind, ProviderKind::Azure);
}

#[test]
fn unknown_provider_kind_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(dir.path(), "[provider]\nkind = \"ollama\"\n");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::UnsupportedProvider { ref kind }) if kind == "ollama"
    ));
}

#[test]
fn zero_limits_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(dir.path(), "[agent]\nmax_turns = 0\n");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::ZeroLimit { field: "agent.max_turns" })
    ));
}

#[test]
fn invalid_bind_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(dir.path(), "[server]\nbind = \"not-an-address\"\n");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::InvalidBind { .. })));
}

#[test]
fn malformed_toml_reports_parse_error() {
    let dir = tempdir().expect("tempdir");
    let path = write_settings(dir.path(), "models = [\n");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
