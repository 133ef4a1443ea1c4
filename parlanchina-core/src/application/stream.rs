//! Folds gateway events into the client-facing NDJSON protocol.

use crate::application::gateway::ModelGateway;
use crate::domain::{ConversationTurn, ImageParams, ImageRef, StreamEvent};
use crate::infrastructure::storage::ImageStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// One line of the streaming output protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    TextDelta {
        text: String,
    },
    ImageStart,
    Image {
        url: String,
        alt_text: String,
        markdown: String,
    },
    Error {
        message: String,
        analysis: String,
        markdown: String,
    },
    TextDone {
        text: String,
        images: Vec<ImageRef>,
    },
}

impl OutputEvent {
    /// The event as one NDJSON line, newline included.
    pub fn to_ndjson(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => format!("{line}\n"),
            Err(err) => {
                error!(%err, "Failed to encode stream event");
                "{\"type\":\"error\",\"message\":\"encoding failed\",\"analysis\":\"\",\"markdown\":\"\"}\n"
                    .to_string()
            }
        }
    }
}

/// Final state of a multiplexed stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    pub text: String,
    pub images: Vec<ImageRef>,
}

/// Tracks the accumulated answer while events pass through.
///
/// Images are persisted as they arrive and linked into the text; errors get
/// a best-effort explanation from a secondary completion.
pub struct EventMultiplexer {
    images: Arc<dyn ImageStore>,
    gateway: Arc<ModelGateway>,
    model: String,
    text: String,
    saved: Vec<ImageRef>,
}

impl EventMultiplexer {
    pub fn new(
        images: Arc<dyn ImageStore>,
        gateway: Arc<ModelGateway>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            images,
            gateway,
            model: model.into(),
            text: String::new(),
            saved: Vec::new(),
        }
    }

    /// Maps one gateway event; `None` when nothing is sent to the client.
    pub async fn on_event(&mut self, event: StreamEvent) -> Option<OutputEvent> {
        match event {
            StreamEvent::TextDelta { text } => {
                if text.is_empty() {
                    return None;
                }
                self.text.push_str(&text);
                Some(OutputEvent::TextDelta { text })
            }
            StreamEvent::ImageStart => Some(OutputEvent::ImageStart),
            StreamEvent::ImageCall { image_b64, params } => self.save_image(&image_b64, &params),
            StreamEvent::Error { message } => Some(self.explain_error(message).await),
            StreamEvent::TextDone { text } => {
                if !text.is_empty() && (self.text.is_empty() || text.len() > self.text.len()) {
                    self.text = text;
                }
                None
            }
        }
    }

    /// The terminal `text_done` event and what should be persisted.
    pub fn finish(self) -> (OutputEvent, StreamSummary) {
        let summary = StreamSummary {
            text: self.text,
            images: self.saved,
        };
        let done = OutputEvent::TextDone {
            text: summary.text.clone(),
            images: summary.images.clone(),
        };
        (done, summary)
    }

    fn save_image(&mut self, image_b64: &str, params: &ImageParams) -> Option<OutputEvent> {
        if image_b64.trim().is_empty() {
            return None;
        }
        match self.images.save_image_from_base64(image_b64) {
            Ok(meta) => {
                let alt_text = params.alt_text();
                let markdown = format!("\n\n![{alt_text}]({})\n", meta.url_path);
                self.text.push_str(&markdown);
                self.saved.push(ImageRef {
                    url: meta.url_path.clone(),
                    alt_text: alt_text.clone(),
                });
                debug!(url = %meta.url_path, "Stored streamed image");
                Some(OutputEvent::Image {
                    url: meta.url_path,
                    alt_text,
                    markdown,
                })
            }
            Err(err) => {
                warn!(%err, "Failed to persist generated image");
                Some(OutputEvent::Error {
                    message: "Image save failed".to_string(),
                    analysis: String::new(),
                    markdown: String::new(),
                })
            }
        }
    }

    async fn explain_error(&mut self, message: String) -> OutputEvent {
        let message = if message.trim().is_empty() {
            "LLM error".to_string()
        } else {
            message
        };
        let prompt = [
            ConversationTurn::system(
                "You are a helpful assistant that explains model or tool errors succinctly for \
                 end users. Provide a brief, calm summary and a likely cause/next step.",
            ),
            ConversationTurn::user(format!(
                "Explain this error for the user in 2-3 sentences:\n\n{message}"
            )),
        ];
        let analysis = match self.gateway.try_complete(&prompt, &self.model).await {
            Ok(analysis) => analysis.trim().to_string(),
            Err(err) => {
                debug!(%err, "Error analysis unavailable");
                String::new()
            }
        };

        let mut markdown = format!("\n\n**The model reported an error**\n\n```\n{message}\n```\n");
        if !analysis.is_empty() {
            markdown.push_str(&format!("\n{analysis}\n"));
        }
        self.text.push_str(&markdown);
        OutputEvent::Error {
            message,
            analysis,
            markdown,
        }
    }
}
