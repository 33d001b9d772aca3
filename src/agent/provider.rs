//! The chat-completion seam every research agent talks through.
//!
//! Planner, replanner, step executor, writer and evaluator only ever see
//! [`ChatRequest`]/[`ChatResponse`]; the `OpenAI` and Azure backends in
//! [`providers`](super::providers) map those onto the SDK.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// A chat-completion backend shared by all agents of a session.
///
/// Implementations must be cheap to share: the orchestrator hands one
/// `Arc<dyn LlmProvider>` to every concurrent step worker.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name (`"openai"` or `"azure"`).
    fn name(&self) -> &'static str;

    /// Sends one completion request, tools included when present.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the backend rejects the call, times out,
    /// or returns no choices.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
