//! Message adapters - convert between domain turns and provider payloads

use super::types::AssistantTurn;
use crate::domain::{ConversationTurn, ImageParams, MessageRole, StreamEvent, ToolCallInvocation};
use serde_json::{Value, json};

/// Adapter for converting messages to different API formats
pub struct MessageAdapter;

impl MessageAdapter {
    /// Chat Completions `messages`, including tool calls and tool results.
    pub fn to_chat_format(turns: &[ConversationTurn]) -> Vec<Value> {
        turns
            .iter()
            .map(|turn| {
                let mut message = json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                });
                if !turn.tool_calls.is_empty() {
                    message["tool_calls"] = turn
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {"name": call.name, "arguments": call.arguments},
                            })
                        })
                        .collect();
                }
                if let Some(call_id) = &turn.tool_call_id {
                    message["tool_call_id"] = Value::String(call_id.clone());
                }
                if let Some(name) = &turn.name {
                    message["name"] = Value::String(name.clone());
                }
                message
            })
            .collect()
    }

    /// Responses API `input`: plain role/content pairs.
    ///
    /// Tool turns have no counterpart there and are left out.
    pub fn to_responses_input(turns: &[ConversationTurn]) -> Vec<Value> {
        turns
            .iter()
            .filter(|turn| turn.role != MessageRole::Tool)
            .map(|turn| json!({"role": turn.role.as_str(), "content": turn.content}))
            .collect()
    }

    /// Reads `choices[0].message` from a Chat Completions response.
    pub fn parse_chat_message(response: &Value) -> Option<AssistantTurn> {
        let message = response.get("choices")?.get(0)?.get("message")?;
        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tool_calls = message
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(|calls| {
                calls
                    .iter()
                    .map(|call| {
                        let function = call.get("function");
                        let field = |value: Option<&Value>| {
                            value.and_then(Value::as_str).unwrap_or_default().to_string()
                        };
                        ToolCallInvocation {
                            id: field(call.get("id")),
                            name: field(function.and_then(|f| f.get("name"))),
                            arguments: match function.and_then(|f| f.get("arguments")) {
                                Some(Value::String(raw)) => raw.clone(),
                                Some(Value::Null) | None => String::new(),
                                Some(other) => other.to_string(),
                            },
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(AssistantTurn {
            content,
            tool_calls,
        })
    }
}

/// Concatenated assistant text of a Responses API response object.
pub fn extract_output_text(response: &Value) -> String {
    if let Some(text) = response
        .get("output_text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        return text.to_string();
    }

    response
        .get("output")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("content").and_then(Value::as_array))
                .flatten()
                .filter_map(|piece| piece.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Maps Responses API stream events onto [`StreamEvent`]s.
///
/// Emits at most one `ImageStart` and exactly one terminal `TextDone`
/// (from `response.completed`, or from [`finish`](Self::finish) when the
/// stream ends without it).
#[derive(Debug, Default)]
pub struct ResponsesStreamAdapter {
    accumulated: String,
    image_started: bool,
    done: bool,
}

impl ResponsesStreamAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn on_event(&mut self, payload: &Value) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if !self.image_started && event_type.contains("image_generation_call") {
            self.image_started = true;
            events.push(StreamEvent::ImageStart);
        }

        match event_type {
            "response.output_text.delta" => {
                let delta = payload
                    .get("delta")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if !delta.is_empty() {
                    self.accumulated.push_str(delta);
                    events.push(StreamEvent::text_delta(delta));
                }
            }
            "response.output_item.done" => {
                if let Some(event) = payload.get("item").and_then(image_from_item) {
                    if !self.image_started {
                        self.image_started = true;
                        events.push(StreamEvent::ImageStart);
                    }
                    events.push(event);
                }
            }
            "response.completed" => {
                let text = payload
                    .get("response")
                    .map(extract_output_text)
                    .filter(|text| !text.is_empty())
                    .unwrap_or_else(|| self.accumulated.clone());
                self.done = true;
                events.push(StreamEvent::text_done(text));
            }
            "response.failed" | "response.incomplete" | "response.error" | "error" => {
                events.push(StreamEvent::error(error_message(payload)));
            }
            _ => {}
        }
        events
    }

    /// Terminal event for a stream that ended without `response.completed`.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(StreamEvent::text_done(std::mem::take(&mut self.accumulated)))
    }
}

fn image_from_item(item: &Value) -> Option<StreamEvent> {
    if item.get("type").and_then(Value::as_str) != Some("image_generation_call") {
        return None;
    }
    let image_b64 = item
        .get("result")
        .and_then(Value::as_str)
        .filter(|data| !data.trim().is_empty())?;
    let params = item
        .as_object()
        .map(ImageParams::from_json)
        .unwrap_or_default();
    Some(StreamEvent::ImageCall {
        image_b64: image_b64.to_string(),
        params,
    })
}

fn error_message(payload: &Value) -> String {
    payload
        .pointer("/response/error/message")
        .or_else(|| payload.pointer("/error/message"))
        .or_else(|| payload.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            payload
                .pointer("/response/incomplete_details/reason")
                .and_then(Value::as_str)
                .map(|reason| format!("response incomplete: {reason}"))
        })
        .unwrap_or_else(|| "the model reported an error".to_string())
}
