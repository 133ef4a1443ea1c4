use serde::Serialize;
use serde_json::{Map as JsonMap, Value};

/// Provider-independent event produced by the model gateway.
///
/// Every upstream stream is normalized into this closed set before the
/// orchestration sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta { text: String },
    ImageStart,
    ImageCall { image_b64: String, params: ImageParams },
    Error { message: String },
    TextDone { text: String },
}

impl StreamEvent {
    pub fn text_delta(text: impl Into<String>) -> Self {
        StreamEvent::TextDelta { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
        }
    }

    pub fn text_done(text: impl Into<String>) -> Self {
        StreamEvent::TextDone { text: text.into() }
    }
}

/// Descriptive fields that accompanied a generated image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageParams {
    pub alt_text: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
}

impl ImageParams {
    pub fn from_json(node: &JsonMap<String, Value>) -> Self {
        let field = |key: &str| {
            node.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };
        Self {
            alt_text: field("alt_text"),
            description: field("description"),
            prompt: field("prompt").or_else(|| field("revised_prompt")),
        }
    }

    /// First non-empty of alt text, description and prompt.
    pub fn alt_text(&self) -> String {
        [&self.alt_text, &self.description, &self.prompt]
            .into_iter()
            .flatten()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .unwrap_or("Generated image")
            .to_string()
    }
}
