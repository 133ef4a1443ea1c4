//! Best-effort extraction of tool evidence for the summary fallback.

use crate::domain::ToolCallResult;
use serde_json::Value;

/// Display text of one tool result and whether it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEvidence {
    pub text: String,
    pub failed: bool,
}

impl ToolEvidence {
    /// Failure comes from the result itself; the text heuristic only applies
    /// when there is no raw payload to inspect.
    pub fn from_result(result: &ToolCallResult) -> Self {
        let failed = result.is_error
            || (result.raw_result.is_null() && looks_like_error(&result.display_text));
        Self {
            text: result.display_text.clone(),
            failed,
        }
    }
}

/// Structured rows carried by an MCP `tools/call` result.
///
/// Prefers `structuredContent`; otherwise parses text content that looks
/// like a JSON object or array. Anything else yields nothing.
pub fn extract_structured(raw_result: &Value) -> Vec<Value> {
    match raw_result.get("structuredContent") {
        Some(Value::Array(rows)) => return rows.clone(),
        Some(object @ Value::Object(_)) => return vec![object.clone()],
        _ => {}
    }

    raw_result
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|piece| piece.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|piece| piece.get("text").and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| text.starts_with('[') || text.starts_with('{'))
        .filter_map(|text| serde_json::from_str::<Value>(text).ok())
        .flat_map(|parsed| match parsed {
            Value::Array(rows) => rows,
            object @ Value::Object(_) => vec![object],
            _ => Vec::new(),
        })
        .collect()
}

pub fn looks_like_error(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("failed to run") || lower.contains("error") || lower.contains("disabled")
}

/// Evidence for the fallback prompt: structured rows, else results that do
/// not look like errors, else every result.
pub fn summary_sources(structured: &[Value], results: &[ToolEvidence]) -> Vec<String> {
    if !structured.is_empty() {
        if let Ok(rendered) = serde_json::to_string_pretty(structured) {
            return vec![rendered];
        }
    }
    let clean: Vec<String> = results
        .iter()
        .filter(|result| !result.failed)
        .map(|result| result.text.clone())
        .collect();
    if clean.is_empty() {
        results.iter().map(|result| result.text.clone()).collect()
    } else {
        clean
    }
}
