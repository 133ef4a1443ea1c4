//! Provider factory - creates clients from config

use super::clients::OpenAiClient;
use super::traits::ModelProvider;
use crate::config::ModelProviderConfig;
use std::env;
use std::sync::Arc;
use tracing::warn;

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, env_name: Option<&str>) -> Option<String> {
    let raw = env_name.map(str::trim)?;
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model providers from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Both supported kinds speak the OpenAI wire format; Azure differs only
    /// in routing and auth, which the client handles.
    pub fn create(config: &ModelProviderConfig) -> Arc<dyn ModelProvider> {
        Arc::new(OpenAiClient::from_config(config))
    }
}
