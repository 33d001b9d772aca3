//! Agent trait definition.
//!
//! The planner, replanner, writer and evaluator implement this trait, which
//! gives the orchestrator a uniform single-turn completion call. The step
//! executor drives its own two-call tool round instead.

use async_trait::async_trait;

use super::message::{ChatRequest, TokenUsage, system_message, user_message};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// Response from an agent execution.
#[derive(Debug, Clone, Default)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Model that served the request, as reported by the provider.
    pub model: String,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Trait implemented by the single-turn agents.
///
/// Agents encapsulate a specific role (planning, writing, evaluation) with a
/// fixed system prompt and model configuration.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Sampling temperature. `None` leaves the provider default.
    fn temperature(&self) -> Option<f32> {
        None
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        2048
    }

    /// Executes the agent with the given user message.
    ///
    /// Builds a [`ChatRequest`] from the agent's configuration and
    /// delegates to the provider. No retries happen at this layer.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures or response parsing errors.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<AgentResponse, AgentError> {
        let mut request = ChatRequest::new(
            self.model().to_string(),
            vec![system_message(self.system_prompt()), user_message(user_msg)],
        );
        request.temperature = self.temperature();
        request.max_tokens = Some(self.max_tokens());

        let response = provider.chat(&request).await?;
        tracing::info!(
            agent = self.name(),
            model = %response.model,
            tokens = response.usage.total_tokens,
            "completion finished"
        );

        Ok(AgentResponse {
            content: response.content,
            model: response.model,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }
}
