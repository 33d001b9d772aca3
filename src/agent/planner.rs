//! Planner and replanner agents.
//!
//! The planner turns a research query into a numbered step list. The
//! replanner asks whether the accumulated context calls for more steps and
//! merges the answer through [`ReplanState`](crate::core::ReplanState).

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::{build_planner_prompt, build_replanner_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{ReplanOutcome, ResearchSession, dedup_steps, parse_numbered_steps};
use crate::error::AgentError;

/// Maximum accepted query length in bytes.
pub const MAX_QUERY_LEN: usize = 4096;

/// Agent that drafts the initial research plan.
pub struct PlannerAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl PlannerAgent {
    /// Creates a new planner with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.planner_model.clone(),
            max_tokens: config.planner_max_tokens,
            system_prompt,
        }
    }

    /// Generates at most `max_steps` steps for `query`.
    ///
    /// An empty list means the model produced no usable plan; it is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] for a blank or oversized query or
    /// a zero step ceiling, and propagates provider failures unchanged.
    pub async fn plan(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        max_steps: usize,
    ) -> Result<Vec<String>, AgentError> {
        validate_query(query)?;
        if max_steps == 0 {
            return Err(AgentError::InvalidConfig {
                message: "max_steps must be at least 1".to_string(),
            });
        }

        let response = self
            .execute(provider, &build_planner_prompt(query.trim(), max_steps))
            .await?;

        let mut steps = dedup_steps(parse_numbered_steps(&response.content));
        if steps.len() > max_steps {
            tracing::debug!(parsed = steps.len(), max_steps, "truncating plan");
            steps.truncate(max_steps);
        }
        tracing::info!(steps = steps.len(), model = %response.model, "plan generated");
        Ok(steps)
    }
}

/// Rejects blank and oversized queries.
///
/// # Errors
///
/// Returns [`AgentError::InvalidConfig`] describing the problem.
pub fn validate_query(query: &str) -> Result<(), AgentError> {
    if query.trim().is_empty() {
        return Err(AgentError::InvalidConfig {
            message: "research query cannot be empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(AgentError::InvalidConfig {
            message: format!("research query exceeds {MAX_QUERY_LEN} bytes"),
        });
    }
    Ok(())
}

#[async_trait]
impl Agent for PlannerAgent {
    fn name(&self) -> &'static str {
        "planner"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Agent that extends the plan between batches.
pub struct ReplannerAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl ReplannerAgent {
    /// Creates a new replanner with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.planner_model.clone(),
            max_tokens: config.planner_max_tokens,
            system_prompt,
        }
    }

    /// Runs one replan round against the session.
    ///
    /// Once the session's replan cap has latched this returns
    /// [`ReplanOutcome::Skipped`] without calling the provider. Otherwise the
    /// reply is merged: steps are only ever appended, never removed or
    /// reordered, and the list stays within `max_steps`.
    ///
    /// # Errors
    ///
    /// Propagates provider failures; the session is left untouched.
    pub async fn replan(
        &self,
        provider: &dyn LlmProvider,
        session: &mut ResearchSession,
        max_steps: usize,
    ) -> Result<ReplanOutcome, AgentError> {
        if session.replan().limit_reached() {
            return Ok(ReplanOutcome::Skipped);
        }

        let prompt = build_replanner_prompt(session.context(), session.steps(), max_steps);
        let response = self.execute(provider, &prompt).await?;

        let outcome = session.apply_replan(&response.content, max_steps);
        let state = session.replan();
        tracing::debug!(
            ?outcome,
            rounds = state.rounds(),
            steps = session.steps().len(),
            "replan applied"
        );
        if state.limit_reached() {
            tracing::info!(
                rounds = state.rounds(),
                "maximum replanning rounds reached; finishing the current plan without replanning"
            );
        }
        Ok(outcome)
    }
}

#[async_trait]
impl Agent for ReplannerAgent {
    fn name(&self) -> &'static str {
        "replanner"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::agent::prompt::{PLANNER_SYSTEM_PROMPT, REPLANNER_SYSTEM_PROMPT};

    struct FixedReply {
        reply: String,
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl FixedReply {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedReply {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let (Ok(mut last), Some(msg)) = (self.last_prompt.lock(), request.messages.last()) {
                last.clone_from(&msg.content);
            }
            Ok(ChatResponse {
                content: self.reply.clone(),
                model: "scripted".to_string(),
                ..ChatResponse::default()
            })
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn planner() -> PlannerAgent {
        PlannerAgent::new(&config(), PLANNER_SYSTEM_PROMPT.to_string())
    }

    fn replanner() -> ReplannerAgent {
        ReplannerAgent::new(&config(), REPLANNER_SYSTEM_PROMPT.to_string())
    }

    #[tokio::test]
    async fn test_plan_truncates_to_max_steps() {
        let provider = FixedReply::new(
            "Here is the plan:\n1. Search Wikipedia\n2. Check news\n3. Read papers\n4. Summarize",
        );
        let steps = planner()
            .plan(&provider, "What is the capital of France?", 2)
            .await
            .unwrap_or_default();
        assert_eq!(steps, vec!["Search Wikipedia", "Check news"]);
    }

    #[tokio::test]
    async fn test_plan_drops_repeated_steps_before_truncating() {
        let provider = FixedReply::new("1. A\n2. B\n3. A\n4. C\n5. D");
        let steps = planner()
            .plan(&provider, "q", 3)
            .await
            .unwrap_or_default();
        assert_eq!(steps, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_plan_empty_reply_is_not_an_error() {
        let provider = FixedReply::new("I cannot plan this.");
        let steps = planner().plan(&provider, "anything", 5).await;
        assert!(steps.is_ok_and(|s| s.is_empty()));
    }

    #[tokio::test]
    async fn test_plan_rejects_blank_query_without_calling() {
        let provider = FixedReply::new("1. x");
        let result = planner().plan(&provider, "   ", 5).await;
        assert!(matches!(result, Err(AgentError::InvalidConfig { .. })));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_plan_rejects_zero_steps() {
        let provider = FixedReply::new("1. x");
        let result = planner().plan(&provider, "query", 0).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_query_length() {
        assert!(validate_query(&"a".repeat(MAX_QUERY_LEN)).is_ok());
        assert!(validate_query(&"a".repeat(MAX_QUERY_LEN + 1)).is_err());
    }

    #[tokio::test]
    async fn test_replan_appends_unique_steps() {
        let mut session = ResearchSession::new("q", 3);
        session.set_plan(vec!["A".to_string()]);
        let provider = FixedReply::new("1. A\n2. B");

        let outcome = replanner().replan(&provider, &mut session, 20).await;
        assert_eq!(
            outcome.unwrap_or(ReplanOutcome::Skipped),
            ReplanOutcome::Added {
                count: 1,
                capped: false
            }
        );
        assert_eq!(session.steps(), ["A", "B"]);
        let prompt = provider.last_prompt.lock().map(|p| p.clone()).unwrap_or_default();
        assert!(prompt.contains("1. A"));
    }

    #[tokio::test]
    async fn test_replan_latched_makes_no_call() {
        let mut session = ResearchSession::new("q", 0);
        session.set_plan(vec!["A".to_string()]);
        let provider = FixedReply::new("1. A");

        // Duplicate-only round pushes rounds past zero and latches.
        let first = replanner().replan(&provider, &mut session, 20).await;
        assert!(first.is_ok());
        assert!(session.replan().limit_reached());

        let second = replanner().replan(&provider, &mut session, 20).await;
        assert_eq!(second.unwrap_or(ReplanOutcome::NoneNeeded), ReplanOutcome::Skipped);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.steps(), ["A"]);
    }

    #[tokio::test]
    async fn test_replan_sentinel_resets_rounds() {
        let mut session = ResearchSession::new("q", 3);
        session.set_plan(vec!["A".to_string()]);
        let dup = FixedReply::new("1. A");
        let _ = replanner().replan(&dup, &mut session, 20).await;
        assert_eq!(session.replan().rounds(), 1);

        let done = FixedReply::new("NO ADDITIONAL STEPS NEEDED.");
        let outcome = replanner().replan(&done, &mut session, 20).await;
        assert_eq!(outcome.unwrap_or(ReplanOutcome::Skipped), ReplanOutcome::NoneNeeded);
        assert_eq!(session.replan().rounds(), 0);
        assert_eq!(session.steps(), ["A"]);
    }
}
