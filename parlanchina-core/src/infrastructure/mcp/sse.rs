use super::error::ToolInvokeError;
use super::transport::McpTransport;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";

/// Legacy MCP HTTP+SSE transport.
///
/// Server messages arrive on a long-lived event stream; client messages are
/// POSTed to the endpoint announced by the first `endpoint` event.
pub struct SseTransport {
    server: String,
    client: reqwest::Client,
    headers: HeaderMap,
    endpoint: Url,
    source: EventSource,
}

impl SseTransport {
    pub async fn connect(
        server: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self, ToolInvokeError> {
        let base = Url::parse(url).map_err(|err| {
            ToolInvokeError::transport(server, format!("invalid url '{url}': {err}"))
        })?;
        let headers = header_map(server, headers)?;
        let client = reqwest::Client::new();

        let request = client.get(base.clone()).headers(headers.clone());
        let mut source = EventSource::new(request)
            .map_err(|err| ToolInvokeError::transport(server, err.to_string()))?;

        let endpoint = loop {
            match source.next().await {
                Some(Ok(Event::Open)) => continue,
                Some(Ok(Event::Message(message))) if message.event == ENDPOINT_EVENT => {
                    let target = message.data.trim();
                    break base.join(target).map_err(|err| {
                        ToolInvokeError::transport(
                            server,
                            format!("invalid endpoint '{target}': {err}"),
                        )
                    })?;
                }
                Some(Ok(Event::Message(message))) => {
                    debug!(server, event = %message.event, "ignoring event before endpoint");
                }
                Some(Err(err)) => {
                    source.close();
                    return Err(ToolInvokeError::transport(server, err.to_string()));
                }
                None => {
                    return Err(ToolInvokeError::Terminated {
                        server: server.to_string(),
                    });
                }
            }
        };

        debug!(server, endpoint = %endpoint, "SSE transport connected");
        Ok(Self {
            server: server.to_string(),
            client,
            headers,
            endpoint,
            source,
        })
    }
}

fn header_map(
    server: &str,
    headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, ToolInvokeError> {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            ToolInvokeError::transport(server, format!("invalid header name '{key}'"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            ToolInvokeError::transport(server, format!("invalid value for header '{key}'"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl McpTransport for SseTransport {
    async fn send(&mut self, message: &Value) -> Result<(), ToolInvokeError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(message)
            .send()
            .await
            .map_err(|err| ToolInvokeError::transport(&self.server, err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolInvokeError::transport(
                &self.server,
                format!("POST {} returned {status}: {body}", self.endpoint),
            ));
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<Option<Value>, ToolInvokeError> {
        loop {
            match self.source.next().await {
                Some(Ok(Event::Open)) => continue,
                Some(Ok(Event::Message(message))) => {
                    if message.event != MESSAGE_EVENT {
                        debug!(server = %self.server, event = %message.event, "ignoring SSE event");
                        continue;
                    }
                    match serde_json::from_str::<Value>(&message.data) {
                        Ok(value) => return Ok(Some(value)),
                        Err(err) => {
                            debug!(server = %self.server, %err, "skipping non-JSON SSE message");
                        }
                    }
                }
                Some(Err(EventSourceError::StreamEnded)) | None => return Ok(None),
                Some(Err(err)) => {
                    self.source.close();
                    return Err(ToolInvokeError::transport(&self.server, err.to_string()));
                }
            }
        }
    }

    async fn close(&mut self) {
        self.source.close();
    }
}
