//! Base HTTP client with shared logic

use crate::config::ProviderKind;
use crate::infrastructure::model::types::ModelError;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub kind: ProviderKind,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(
        id: String,
        kind: ProviderKind,
        endpoint: String,
        api_key: Option<String>,
        api_version: Option<String>,
    ) -> Self {
        Self {
            id,
            kind,
            endpoint,
            api_key,
            api_version,
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        match (&self.kind, &self.api_version) {
            (ProviderKind::Azure, Some(version)) => {
                format!("{base}/openai/{path}?api-version={version}")
            }
            _ => format!("{base}/{path}"),
        }
    }

    /// Authenticated POST request: bearer token for OpenAI, `api-key` for Azure.
    pub fn authorized_post<Req>(&self, url: &str, body: &Req) -> Result<RequestBuilder, ModelError>
    where
        Req: Serialize + ?Sized,
    {
        let api_key = self.require_api_key()?;
        let request = self.http.post(url).json(body);
        Ok(match self.kind {
            ProviderKind::OpenAi => request.header("Authorization", format!("Bearer {api_key}")),
            ProviderKind::Azure => request.header("api-key", api_key),
        })
    }

    /// Post JSON and decode the JSON response, keeping the body of failed calls.
    pub async fn post_json<Req>(&self, url: &str, body: &Req) -> Result<Value, ModelError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self
            .authorized_post(url, body)?
            .send()
            .await
            .map_err(|e| ModelError::network(&self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::status(&self.id, status, format_api_error(&body)));
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::network(&self.id, e))
    }

    fn require_api_key(&self) -> Result<&str, ModelError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::missing_api_key(&self.id))
    }
}

/// Pulls `error.message` out of a JSON error body, falling back to the raw text.
pub fn format_api_error(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
