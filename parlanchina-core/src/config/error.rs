use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported provider kind '{kind}' (expected 'openai' or 'azure')")]
    UnsupportedProvider { kind: String },

    #[error("provider kind 'azure' requires 'api_version'")]
    MissingApiVersion,

    #[error("invalid bind address '{value}'")]
    InvalidBind { value: String },

    #[error("'{field}' must be greater than zero")]
    ZeroLimit { field: &'static str },
}
