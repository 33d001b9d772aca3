//! Step executor: one function-calling round per research step.
//!
//! The first completion offers the search tools. If the model answers
//! directly, that answer is the step result. If it asks for a tool, the
//! first call is dispatched through the [`ToolGateway`], the result is
//! appended as a tool message, and a second completion (tools listed but
//! not callable) produces the step result.

use std::sync::Arc;

use tracing::debug;

use super::config::AgentConfig;
use super::message::{
    ChatRequest, ToolChoice, assistant_tool_calls_message, system_message, tool_message,
    user_message,
};
use super::prompt::build_executor_prompt;
use super::provider::LlmProvider;
use super::tool::{SearchArgs, ToolCall, ToolResult, ToolSet};
use crate::error::AgentError;
use crate::gateway::{Source, ToolGateway};

/// Maximum raw byte length of tool argument JSON from the LLM.
const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// Tool result for a tool name outside the search menu.
pub const UNKNOWN_TOOL_RESULT: &str = "[Function not implemented]";

/// Executes research steps against an LLM provider and the tool gateway.
///
/// Cheap to share: the orchestrator wraps it in an [`Arc`] and hands a
/// clone to every worker in a batch.
pub struct StepExecutor {
    provider: Arc<dyn LlmProvider>,
    gateway: Arc<ToolGateway>,
    tools: ToolSet,
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl StepExecutor {
    /// Creates an executor offering every search tool.
    #[must_use]
    pub fn new(
        config: &AgentConfig,
        provider: Arc<dyn LlmProvider>,
        gateway: Arc<ToolGateway>,
        system_prompt: String,
    ) -> Self {
        Self {
            provider,
            gateway,
            tools: ToolSet::research_tools(),
            model: config.executor_model.clone(),
            max_tokens: config.executor_max_tokens,
            system_prompt,
        }
    }

    /// Executes one step with the shared context snapshot.
    ///
    /// Only the first requested tool call is honoured. Tool problems
    /// (unknown name, bad arguments, search failures) become the tool result
    /// text; only provider failures fail the step.
    ///
    /// # Errors
    ///
    /// Propagates [`AgentError`] from either completion call.
    pub async fn execute(&self, step: &str, context: &str) -> Result<String, AgentError> {
        let mut request = ChatRequest::new(
            self.model.clone(),
            vec![
                system_message(&self.system_prompt),
                user_message(&build_executor_prompt(step, context)),
            ],
        );
        request.max_tokens = Some(self.max_tokens);
        request.tools = self.tools.definitions().to_vec();
        if !request.tools.is_empty() {
            request.tool_choice = Some(ToolChoice::Auto);
        }

        let first = self.provider.chat(&request).await?;
        tracing::info!(step, model = %first.model, "step executor completion");

        let Some(call) = first.tool_calls.into_iter().next() else {
            debug!(step, "answered without tools");
            return Ok(first.content);
        };

        let result = self.dispatch(&call).await;
        debug!(
            step,
            tool = call.name,
            call_id = call.id,
            is_error = result.is_error,
            "tool execution complete"
        );

        request
            .messages
            .push(assistant_tool_calls_message(first.content, vec![call]));
        request
            .messages
            .push(tool_message(&result.tool_call_id, &result.content));
        request.tool_choice = Some(ToolChoice::None);

        let second = self.provider.chat(&request).await?;
        tracing::info!(step, model = %second.model, "step executor follow-up completion");
        Ok(second.content)
    }

    /// Dispatches a tool call to the gateway.
    ///
    /// Never fails; problems are reported in the returned [`ToolResult`].
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        if call.arguments.len() > MAX_TOOL_ARGS_LEN {
            return error_result(
                call,
                format!(
                    "[Invalid arguments: {} bytes exceeds {MAX_TOOL_ARGS_LEN}]",
                    call.arguments.len()
                ),
            );
        }

        let Some(source) = Source::from_tool_name(&call.name) else {
            tracing::warn!(tool = call.name, "model requested an unknown tool");
            return error_result(call, UNKNOWN_TOOL_RESULT.to_string());
        };

        let args: SearchArgs = match serde_json::from_str(&call.arguments) {
            Ok(args) => args,
            Err(e) => return error_result(call, format!("[Invalid arguments: {e}]")),
        };

        let entries = self.gateway.query_source(source, &args.query).await;
        ToolResult {
            tool_call_id: call.id.clone(),
            content: entries.join("\n\n"),
            is_error: false,
        }
    }
}

fn error_result(call: &ToolCall, content: String) -> ToolResult {
    ToolResult {
        tool_call_id: call.id.clone(),
        content,
        is_error: true,
    }
}

impl std::fmt::Debug for StepExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepExecutor")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("tools", &self.tools.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::agent::message::{ChatResponse, Role};
    use crate::agent::prompt::EXECUTOR_SYSTEM_PROMPT;
    use crate::error::SearchError;
    use crate::gateway::SearchSource;

    /// Replies with queued responses and records every request.
    struct Script {
        replies: Mutex<Vec<ChatResponse>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Script {
        fn new(mut replies: Vec<ChatResponse>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmProvider for Script {
        fn name(&self) -> &'static str {
            "script"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request.clone());
            }
            self.replies
                .lock()
                .ok()
                .and_then(|mut r| r.pop())
                .ok_or_else(|| AgentError::ApiRequest {
                    message: "script exhausted".to_string(),
                    status: Some(500),
                })
        }
    }

    struct Echo;

    #[async_trait]
    impl SearchSource for Echo {
        async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
            Ok(vec![format!("[Wikipedia]\n{query} is a city.")])
        }
    }

    fn text(content: &str) -> ChatResponse {
        ChatResponse {
            content: content.to_string(),
            ..ChatResponse::default()
        }
    }

    fn calls(calls: &[(&str, &str)]) -> ChatResponse {
        ChatResponse {
            tool_calls: calls
                .iter()
                .enumerate()
                .map(|(i, (name, args))| ToolCall {
                    id: format!("call_{i}"),
                    name: (*name).to_string(),
                    arguments: (*args).to_string(),
                })
                .collect(),
            finish_reason: Some("tool_calls".to_string()),
            ..ChatResponse::default()
        }
    }

    fn executor(script: Arc<Script>) -> StepExecutor {
        let config = AgentConfig::builder()
            .api_key("test")
            .executor_model("exec-model")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let gateway = ToolGateway::empty().with_source(Source::Wikipedia, Arc::new(Echo));
        StepExecutor::new(
            &config,
            script,
            Arc::new(gateway),
            EXECUTOR_SYSTEM_PROMPT.to_string(),
        )
    }

    #[tokio::test]
    async fn test_direct_answer_single_call() {
        let script = Arc::new(Script::new(vec![text("Paris.")]));
        let result = executor(Arc::clone(&script)).execute("capital?", "").await;
        assert_eq!(result.unwrap_or_default(), "Paris.");

        let requests = script.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "exec-model");
        assert_eq!(requests[0].tools.len(), 5);
        assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
    }

    #[tokio::test]
    async fn test_tool_round_uses_gateway_result() {
        let script = Arc::new(Script::new(vec![
            calls(&[("search_wikipedia_api", r#"{"query":"Paris"}"#)]),
            text("Paris is the capital."),
        ]));
        let result = executor(Arc::clone(&script))
            .execute("capital?", "ctx")
            .await;
        assert_eq!(result.unwrap_or_default(), "Paris is the capital.");

        let requests = script.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.tool_choice, Some(ToolChoice::None));
        assert_eq!(second.messages.len(), 4);
        assert_eq!(second.messages[2].role, Role::Assistant);
        assert_eq!(second.messages[2].tool_calls.len(), 1);
        assert_eq!(second.messages[3].role, Role::Tool);
        assert_eq!(second.messages[3].tool_call_id.as_deref(), Some("call_0"));
        assert_eq!(second.messages[3].content, "[Wikipedia]\nParis is a city.");
    }

    #[tokio::test]
    async fn test_only_first_tool_call_honoured() {
        let script = Arc::new(Script::new(vec![
            calls(&[
                ("search_wikipedia_api", r#"{"query":"Paris"}"#),
                ("search_google_api", r#"{"query":"Paris"}"#),
            ]),
            text("done"),
        ]));
        let _ = executor(Arc::clone(&script)).execute("s", "").await;

        let requests = script.requests();
        let second = &requests[1];
        assert_eq!(second.messages[2].tool_calls.len(), 1);
        assert_eq!(second.messages[2].tool_calls[0].name, "search_wikipedia_api");
        assert_eq!(
            second.messages.iter().filter(|m| m.role == Role::Tool).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_still_completes() {
        let script = Arc::new(Script::new(vec![
            calls(&[("search_bing_api", r#"{"query":"x"}"#)]),
            text("Could not search."),
        ]));
        let result = executor(Arc::clone(&script)).execute("s", "").await;
        assert_eq!(result.unwrap_or_default(), "Could not search.");

        let requests = script.requests();
        assert!(requests[1].messages[3].content.contains(UNKNOWN_TOOL_RESULT));
    }

    #[tokio::test]
    async fn test_invalid_arguments_soft_error() {
        let script = Arc::new(Script::new(vec![]));
        let exec = executor(script);
        let result = exec
            .dispatch(&ToolCall {
                id: "c".to_string(),
                name: "search_wikipedia_api".to_string(),
                arguments: "{not json".to_string(),
            })
            .await;
        assert!(result.is_error);
        assert!(result.content.starts_with("[Invalid arguments:"));
    }

    #[tokio::test]
    async fn test_unregistered_source_reported_by_gateway() {
        let exec = executor(Arc::new(Script::new(vec![])));
        let result = exec
            .dispatch(&ToolCall {
                id: "c".to_string(),
                name: "search_sec_api".to_string(),
                arguments: r#"{"query":"Tesla"}"#.to_string(),
            })
            .await;
        assert!(!result.is_error);
        assert_eq!(result.content, "[Gateway] Source 'sec' not supported.");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let exec = executor(Arc::new(Script::new(vec![])));
        let result = exec.execute("s", "").await;
        assert!(matches!(result, Err(AgentError::ApiRequest { .. })));
    }
}
