use super::error::ConfigError;
use crate::constants::{
    DEFAULT_API_KEY_ENV, DEFAULT_IMAGE_MODEL, DEFAULT_IMAGE_SIZE, DEFAULT_OPENAI_ENDPOINT,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Azure,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "" | "openai" => Ok(ProviderKind::OpenAi),
            "azure" | "azure-openai" => Ok(ProviderKind::Azure),
            other => Err(ConfigError::UnsupportedProvider {
                kind: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProviderConfig {
    pub kind: ProviderKind,
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub api_version: Option<String>,
    pub image_model: String,
    pub image_size: String,
}

impl Default for ModelProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_version: None,
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawProviderConfig {
    pub kind: Option<String>,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub api_version: Option<String>,
    pub image_model: Option<String>,
    pub image_size: Option<String>,
}

impl RawProviderConfig {
    /// Applies the `OPENAI_PROVIDER`, `OPENAI_API_BASE` and
    /// `OPENAI_API_VERSION` environment overrides.
    pub(crate) fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(kind) = lookup("OPENAI_PROVIDER") {
            self.kind = Some(kind);
        }
        if let Some(endpoint) = lookup("OPENAI_API_BASE") {
            self.endpoint = Some(endpoint);
        }
        if let Some(version) = lookup("OPENAI_API_VERSION") {
            self.api_version = Some(version);
        }
        self
    }

    pub(crate) fn build(self) -> Result<ModelProviderConfig, ConfigError> {
        let defaults = ModelProviderConfig::default();
        let kind = ProviderKind::parse(self.kind.as_deref().unwrap_or_default())?;
        let api_version = self.api_version.filter(|v| !v.trim().is_empty());
        if kind == ProviderKind::Azure && api_version.is_none() {
            return Err(ConfigError::MissingApiVersion);
        }
        Ok(ModelProviderConfig {
            kind,
            endpoint: self
                .endpoint
                .filter(|e| !e.trim().is_empty())
                .unwrap_or(defaults.endpoint),
            api_key_env: self.api_key_env.unwrap_or(defaults.api_key_env),
            api_version,
            image_model: self.image_model.unwrap_or(defaults.image_model),
            image_size: self.image_size.unwrap_or(defaults.image_size),
        })
    }
}
