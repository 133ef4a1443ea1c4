//! Model types - responses and errors

use crate::domain::ToolCallInvocation;
use reqwest::StatusCode;
use thiserror::Error;

/// One assistant message from a tool-enabled chat call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCallInvocation>,
}

impl AssistantTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_calls(tool_calls: Vec<ToolCallInvocation>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
        }
    }
}

/// Result of an image generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    Base64(String),
    Url(String),
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: StatusCode,
        body: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
    #[error("provider '{provider}' stream failed: {reason}")]
    Stream { provider: String, reason: String },
    #[error("provider '{provider}' did not respond within {seconds}s")]
    Timeout { provider: String, seconds: u64 },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn status(
        provider: impl Into<String>,
        status: StatusCode,
        body: impl Into<String>,
    ) -> Self {
        Self::Status {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn stream(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Stream {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            seconds,
        }
    }

    /// Short user-facing explanation of the failure.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' requires an API key.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("The request to '{provider}' timed out.")
                } else {
                    format!("Network error while contacting '{provider}'.")
                }
            }
            ModelError::Status {
                provider, status, ..
            } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    format!("Provider '{provider}' rejected the credentials.")
                }
                StatusCode::NOT_FOUND => format!("Endpoint for '{provider}' was not found."),
                StatusCode::TOO_MANY_REQUESTS => {
                    format!("Provider '{provider}' is rate limiting requests.")
                }
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                    format!("Provider '{provider}' is currently unavailable.")
                }
                other => format!("Request to '{provider}' failed: {}", other.as_u16()),
            },
            ModelError::InvalidResponse { provider, .. } => {
                format!("The response from '{provider}' was not valid.")
            }
            ModelError::Stream { provider, .. } => {
                format!("The response stream from '{provider}' was interrupted.")
            }
            ModelError::Timeout { provider, seconds } => {
                format!("'{provider}' did not respond within {seconds} seconds.")
            }
        }
    }
}
