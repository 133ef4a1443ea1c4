//! Built-in tools that run without any MCP server.

use crate::domain::tool::INTERNAL_PREFIX;
use crate::domain::{ToolCallResult, ToolDefinition};
use crate::infrastructure::model::{GeneratedImage, ModelProvider};
use crate::infrastructure::storage::ImageStore;
use serde_json::{Map as JsonMap, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

pub const IMAGE_TOOL_ID: &str = "internal.image";
const IMAGE_TOOL_NAME: &str = "generate_image";
const IMAGE_SIZES: [&str; 3] = ["512x512", "768x768", "1024x1024"];

/// Static registry of built-in tools.
#[derive(Debug, Clone)]
pub struct InternalToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl Default for InternalToolCatalog {
    fn default() -> Self {
        Self {
            tools: vec![ToolDefinition::internal(
                "image",
                IMAGE_TOOL_NAME,
                "Generate an image from a prompt.",
                json!({
                    "type": "object",
                    "properties": {
                        "prompt": {
                            "type": "string",
                            "description": "Concise description of the desired image."
                        },
                        "size": {
                            "type": "string",
                            "description": "Image size, e.g. 512x512, 1024x1024.",
                            "enum": IMAGE_SIZES
                        }
                    },
                    "required": ["prompt"]
                }),
            )],
        }
    }
}

impl InternalToolCatalog {
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn definition(&self, id: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.id.clone()).collect()
    }
}

/// Runs built-in tools against the model provider and image store.
pub struct InternalToolExecutor {
    catalog: InternalToolCatalog,
    provider: Arc<dyn ModelProvider>,
    images: Arc<dyn ImageStore>,
    default_size: String,
    timeout: Duration,
}

impl InternalToolExecutor {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        images: Arc<dyn ImageStore>,
        default_size: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog: InternalToolCatalog::default(),
            provider,
            images,
            default_size: default_size.into(),
            timeout,
        }
    }

    pub fn catalog(&self) -> &InternalToolCatalog {
        &self.catalog
    }

    pub async fn execute(
        &self,
        tool_id: &str,
        arguments: &JsonMap<String, Value>,
    ) -> ToolCallResult {
        let tool_name = tool_id
            .strip_prefix(INTERNAL_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(tool_id);
        match tool_id {
            IMAGE_TOOL_ID => self.generate_image(tool_name, arguments).await,
            other => ToolCallResult::failure(
                INTERNAL_PREFIX,
                tool_name,
                format!("Unknown internal tool: {other}"),
            ),
        }
    }

    async fn generate_image(
        &self,
        tool_name: &str,
        arguments: &JsonMap<String, Value>,
    ) -> ToolCallResult {
        let failure =
            |message: String| ToolCallResult::failure(INTERNAL_PREFIX, tool_name, message);

        let prompt = arguments
            .get("prompt")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if prompt.is_empty() {
            return failure("Image generation failed: prompt is required.".to_string());
        }
        let size = arguments
            .get("size")
            .and_then(Value::as_str)
            .filter(|size| !size.is_empty())
            .unwrap_or(self.default_size.as_str());

        info!(size, "Running internal image tool");
        let call = self.provider.generate_image(prompt, size);
        let generated = match timeout(self.timeout, call).await {
            Ok(Ok(image)) => image,
            Ok(Err(err)) => {
                warn!(%err, "Internal image tool failed");
                return failure(format!("Image generation failed: {err}"));
            }
            Err(_) => {
                return failure(format!(
                    "Image generation failed: no response within {}s",
                    self.timeout.as_secs()
                ));
            }
        };

        let url = match generated {
            GeneratedImage::Base64(data) => match self.images.save_image_from_base64(&data) {
                Ok(meta) => meta.url_path,
                Err(err) => {
                    warn!(%err, "Failed to store generated image");
                    return failure(format!("Image generation failed: {err}"));
                }
            },
            GeneratedImage::Url(url) => url,
        };

        ToolCallResult::new(
            INTERNAL_PREFIX,
            tool_name,
            json!({ "url": url, "alt_text": prompt }),
            format!("Generated image:\n\n![{prompt}]({url})"),
        )
    }
}
