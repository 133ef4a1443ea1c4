use super::evidence::{ToolEvidence, extract_structured, summary_sources};
use super::instructions::{
    LOOP_ENDED_TEXT, disabled_tool_text, dispatch_instruction, fallback_conversation,
    plan_prompt, summary_conversation,
};
use super::models::{AgentOutcome, AgentRequest};
use crate::application::tooling::{ResolvedTools, ToolRegistry};
use crate::config::AgentSettings;
use crate::domain::tool::INTERNAL_PREFIX;
use crate::domain::{
    ConversationTurn, ImageRef, MessageRole, ToolCallInvocation, ToolCallRequest, ToolCallResult,
    ToolSelection,
};
use crate::infrastructure::model::{AssistantTurn, ModelError, ModelProvider};
use serde_json::{Map as JsonMap, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

enum AgentState {
    Plan,
    Dispatch { turn: usize },
    Final(String),
    Exhausted,
    SummaryFallback,
    Done(String),
}

/// Mutable bookkeeping of one run.
struct RunState {
    original: Vec<ConversationTurn>,
    model: String,
    selection: watch::Receiver<ToolSelection>,
    tools: ResolvedTools,
    conversation: Vec<ConversationTurn>,
    tool_results: Vec<ToolEvidence>,
    structured: Vec<Value>,
    images: Vec<ImageRef>,
    errors: Vec<String>,
    tool_calls: usize,
}

impl RunState {
    fn new(request: AgentRequest) -> Self {
        Self {
            conversation: request.conversation.clone(),
            original: request.conversation,
            model: request.model,
            selection: request.selection,
            tools: ResolvedTools::default(),
            tool_results: Vec::new(),
            structured: Vec::new(),
            images: Vec::new(),
            errors: Vec::new(),
            tool_calls: 0,
        }
    }

    fn last_user_message(&self) -> &str {
        self.original
            .iter()
            .rev()
            .find(|turn| turn.role == MessageRole::User)
            .map(|turn| turn.content.as_str())
            .unwrap_or_default()
    }

    fn record(&mut self, result: &ToolCallResult) {
        self.tool_calls += 1;
        self.tool_results.push(ToolEvidence::from_result(result));
        self.structured.extend(extract_structured(&result.raw_result));
        if result.server_name == INTERNAL_PREFIX {
            if let Some(url) = result.raw_result.get("url").and_then(Value::as_str) {
                let alt_text = result
                    .raw_result
                    .get("alt_text")
                    .and_then(Value::as_str)
                    .unwrap_or("Generated image");
                self.images.push(ImageRef {
                    url: url.to_string(),
                    alt_text: alt_text.to_string(),
                });
            }
        }
    }

    fn finish(self, text: String) -> AgentOutcome {
        let mut text = if text.trim().is_empty() {
            LOOP_ENDED_TEXT.to_string()
        } else {
            text
        };
        for image in &self.images {
            if !text.contains(&image.url) {
                text.push_str(&format!("\n\n![{}]({})", image.alt_text, image.url));
            }
        }
        AgentOutcome {
            text,
            errors: self.errors,
            images: self.images,
            tool_calls: self.tool_calls,
        }
    }
}

/// Drives plan, dispatch and fallback turns against one provider.
pub struct AgentLoop {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    settings: AgentSettings,
    model_timeout: Duration,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        settings: AgentSettings,
        model_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            tools,
            settings,
            model_timeout,
        }
    }

    /// Runs the loop to completion. Never fails: backend errors are collected
    /// in [`AgentOutcome::errors`] and the terminal text is always non-empty.
    pub async fn run(&self, request: AgentRequest) -> AgentOutcome {
        let mut run = RunState::new(request);
        let mut state = AgentState::Plan;
        info!(model = %run.model, "Agent run started");

        loop {
            state = match state {
                AgentState::Plan => self.plan(&mut run).await,
                AgentState::Dispatch { turn } => self.dispatch(&mut run, turn).await,
                AgentState::Final(text) => {
                    info!(tool_calls = run.tool_calls, "Agent produced final response");
                    AgentState::Done(text)
                }
                AgentState::Exhausted => self.exhausted(&mut run).await,
                AgentState::SummaryFallback => self.summary_fallback(&mut run).await,
                AgentState::Done(text) => return run.finish(text),
            };
        }
    }

    async fn plan(&self, run: &mut RunState) -> AgentState {
        let selection = run.selection.borrow().clone();
        run.tools = self.tools.resolve(&selection).await;
        let names = run.tools.tool_names();

        if self.settings.plan {
            let prompt = plan_prompt(&names, run.last_user_message());
            match self.call_model(self.provider.complete(&run.model, &prompt)).await {
                Ok(plan) if !plan.trim().is_empty() => {
                    debug!(chars = plan.len(), "Prepending plan turn");
                    run.conversation
                        .insert(0, ConversationTurn::assistant(format!("Plan:\n{plan}")));
                }
                Ok(_) => {}
                Err(err) => debug!(%err, "Planning failed; continuing without a plan"),
            }
        }

        if run.tools.is_empty() {
            info!("No tools resolved; answering with a plain completion");
            return self.plain_completion(run).await;
        }

        run.conversation.insert(0, dispatch_instruction(&names));
        AgentState::Dispatch { turn: 0 }
    }

    async fn dispatch(&self, run: &mut RunState, turn: usize) -> AgentState {
        if turn >= self.settings.max_turns {
            warn!(turns = turn, "Agent reached the dispatch turn limit");
            return AgentState::Exhausted;
        }

        let reply = self
            .call_model(self.provider.chat_with_tools(
                &run.model,
                &run.conversation,
                &run.tools.schemas,
            ))
            .await;
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                warn!(turn, %err, "Tool-enabled chat call failed");
                run.errors.push(err.user_message());
                return AgentState::Exhausted;
            }
        };

        if reply.tool_calls.is_empty() {
            if reply.content.trim().is_empty() {
                debug!(turn, "Model returned neither content nor tool calls");
                return AgentState::Dispatch { turn: turn + 1 };
            }
            return AgentState::Final(reply.content);
        }

        let mut conversation = std::mem::take(&mut run.conversation);
        self.apply_tool_calls(run, &mut conversation, reply).await;
        run.conversation = conversation;
        AgentState::Dispatch { turn: turn + 1 }
    }

    async fn exhausted(&self, run: &mut RunState) -> AgentState {
        if run.tool_results.is_empty() {
            return self.plain_completion(run).await;
        }
        AgentState::SummaryFallback
    }

    async fn summary_fallback(&self, run: &mut RunState) -> AgentState {
        let sources = summary_sources(&run.structured, &run.tool_results);
        let request = run.last_user_message().to_string();
        let mut conversation = fallback_conversation(&request, &sources);

        for turn in 0..self.settings.fallback_turns {
            let reply = self
                .call_model(self.provider.chat_with_tools(
                    &run.model,
                    &conversation,
                    &run.tools.schemas,
                ))
                .await;
            match reply {
                Ok(reply) if reply.tool_calls.is_empty() => {
                    if !reply.content.trim().is_empty() {
                        return AgentState::Done(reply.content);
                    }
                }
                Ok(reply) => self.apply_tool_calls(run, &mut conversation, reply).await,
                Err(err) => {
                    warn!(turn, %err, "Fallback turn failed");
                    run.errors.push(err.user_message());
                    break;
                }
            }
        }

        let sources = summary_sources(&run.structured, &run.tool_results);
        let summary = summary_conversation(&request, &sources);
        match self.call_model(self.provider.complete(&run.model, &summary)).await {
            Ok(text) if !text.trim().is_empty() => AgentState::Done(text),
            Ok(_) => AgentState::Done(LOOP_ENDED_TEXT.to_string()),
            Err(err) => {
                warn!(%err, "Summary completion failed");
                run.errors.push(err.user_message());
                AgentState::Done(LOOP_ENDED_TEXT.to_string())
            }
        }
    }

    async fn plain_completion(&self, run: &mut RunState) -> AgentState {
        match self
            .call_model(self.provider.complete(&run.model, &run.original))
            .await
        {
            Ok(text) if !text.trim().is_empty() => AgentState::Done(text),
            Ok(_) => AgentState::Done(LOOP_ENDED_TEXT.to_string()),
            Err(err) => {
                warn!(%err, "Plain completion failed");
                run.errors.push(err.user_message());
                AgentState::Done(LOOP_ENDED_TEXT.to_string())
            }
        }
    }

    /// Appends the assistant turn and one tool turn per call, in order.
    async fn apply_tool_calls(
        &self,
        run: &mut RunState,
        conversation: &mut Vec<ConversationTurn>,
        reply: AssistantTurn,
    ) {
        let calls = reply.tool_calls.clone();
        conversation.push(ConversationTurn::assistant_with_calls(
            reply.content,
            reply.tool_calls,
        ));
        for call in calls {
            let result = self.dispatch_call(run, &call).await;
            run.record(&result);
            conversation.push(ConversationTurn::tool_result(
                call.id,
                call.name,
                result.display_text,
            ));
        }
    }

    async fn dispatch_call(&self, run: &RunState, call: &ToolCallInvocation) -> ToolCallResult {
        let enabled_id = run.tools.names.resolve(&call.name).and_then(|id| {
            let selection = run.selection.borrow();
            selection.contains(id).then(|| id.to_string())
        });
        let Some(tool_id) = enabled_id else {
            info!(tool = %call.name, "Model requested a disabled tool");
            return ToolCallResult::failure("", call.name.as_str(), disabled_tool_text(&call.name));
        };

        info!(tool = %tool_id, "Dispatching tool call");
        self.tools
            .execute(ToolCallRequest::new(tool_id, parse_arguments(&call.arguments)))
            .await
    }

    async fn call_model<T>(
        &self,
        call: impl Future<Output = Result<T, ModelError>>,
    ) -> Result<T, ModelError> {
        match timeout(self.model_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::timeout(
                self.provider.id(),
                self.model_timeout.as_secs(),
            )),
        }
    }
}

/// Arguments as a JSON object; anything else becomes `{}`.
fn parse_arguments(raw: &str) -> JsonMap<String, Value> {
    if raw.trim().is_empty() {
        return JsonMap::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(arguments)) => arguments,
        Ok(other) => {
            debug!(kind = ?other, "Tool arguments are not an object; using {{}}");
            JsonMap::new()
        }
        Err(err) => {
            debug!(%err, "Tool arguments are not valid JSON; using {{}}");
            JsonMap::new()
        }
    }
}
