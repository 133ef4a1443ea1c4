//! Prompt text used by the agent loop.

use crate::domain::ConversationTurn;

/// Terminal text when neither the loop nor any fallback produced an answer.
pub const LOOP_ENDED_TEXT: &str =
    "Tool call loop ended without a final response. Please try again or adjust your request.";

pub fn disabled_tool_text(name: &str) -> String {
    format!("Tool `{name}` is disabled for this turn.")
}

pub fn plan_prompt(tool_names: &[String], request: &str) -> Vec<ConversationTurn> {
    let available = if tool_names.is_empty() {
        "none".to_string()
    } else {
        tool_names.join(", ")
    };
    vec![
        ConversationTurn::system(format!(
            "Given the user request, produce a brief, numbered plan of tool actions to complete it. \
             Keep it concise (1-3 steps). Available tools this turn: {available}. \
             Use only these tools for data/actions; do not invent other tools or browsing. \
             If no tools are needed, state that. Do not execute tools here."
        )),
        ConversationTurn::user(request),
    ]
}

pub fn dispatch_instruction(tool_names: &[String]) -> ConversationTurn {
    ConversationTurn::system(format!(
        "You can call the available tools to fetch or modify data when it helps answer the user. \
         Tools enabled for this turn: {}. \
         Call a tool when you need data or actions; otherwise answer directly. \
         When you return tool results, clearly surface the important fields in plain text \
         (e.g., `Title: ...`, `Summary: ...`) before continuing. \
         If you both fetch data and generate media (like images), present the fetched fields first, \
         then the media prompt/output. \
         Do not state that you lack web access; rely on the provided tools for data retrieval.",
        tool_names.join(", ")
    ))
}

fn evidence_message(request: &str, sources: &[String]) -> ConversationTurn {
    ConversationTurn::user(format!(
        "User request: {request}\n\nTool results:\n{}",
        sources.join("\n\n")
    ))
}

/// Seed for the tool-enabled fallback turns.
pub fn fallback_conversation(request: &str, sources: &[String]) -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::system(
            "Provide a final answer to the user's request using the tool results below. \
             Clearly list key fields (e.g., Title, Description) and, if applicable, generate \
             requested media via the available tools. Ignore failed or irrelevant tool attempts.",
        ),
        evidence_message(request, sources),
    ]
}

/// Last resort: a plain completion over the same evidence.
pub fn summary_conversation(request: &str, sources: &[String]) -> Vec<ConversationTurn> {
    vec![
        ConversationTurn::system(
            "Provide a final answer to the user's request using the tool results below. \
             Clearly list key fields (e.g., Title, Description) and, if applicable, the requested \
             media prompt/output. Ignore earlier failed or irrelevant tool attempts.",
        ),
        evidence_message(request, sources),
    ]
}
