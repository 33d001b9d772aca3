//! Report writer and evaluator agents.
//!
//! The writer turns the accumulated research context into a long-form
//! report. [`evaluate_and_retry`] regenerates the report until the evaluator
//! accepts it or the attempt budget runs out.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::{build_evaluator_prompt, build_writer_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Agent that synthesizes the final report.
pub struct WriterAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl WriterAgent {
    /// Creates a new writer with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.writer_model.clone(),
            max_tokens: config.writer_max_tokens,
            system_prompt,
        }
    }

    /// Writes a report from the research context.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn write(
        &self,
        provider: &dyn LlmProvider,
        context: &str,
    ) -> Result<String, AgentError> {
        let response = self.execute(provider, &build_writer_prompt(context)).await?;
        if response.finish_reason.as_deref() == Some("length") {
            tracing::warn!(
                max_tokens = self.max_tokens,
                "report truncated at the token limit"
            );
        }
        Ok(response.content)
    }
}

#[async_trait]
impl Agent for WriterAgent {
    fn name(&self) -> &'static str {
        "writer"
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

/// Agent that judges whether a report meets the research target.
pub struct EvaluatorAgent {
    model: String,
    system_prompt: String,
}

impl EvaluatorAgent {
    /// Creates a new evaluator with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.writer_model.clone(),
            system_prompt,
        }
    }

    /// Returns `true` if the evaluator accepts `report` for `target`.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn accepts(
        &self,
        provider: &dyn LlmProvider,
        target: &str,
        report: &str,
    ) -> Result<bool, AgentError> {
        let response = self
            .execute(provider, &build_evaluator_prompt(target, report))
            .await?;
        let accepted = is_acceptance(&response.content);
        if !accepted {
            tracing::debug!(feedback = %response.content.trim(), "report rejected");
        }
        Ok(accepted)
    }
}

/// An evaluator reply accepts the report when it starts with `YES`.
fn is_acceptance(reply: &str) -> bool {
    reply.trim().to_uppercase().starts_with("YES")
}

#[async_trait]
impl Agent for EvaluatorAgent {
    fn name(&self) -> &'static str {
        "evaluator"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        512
    }
}

/// Writes the report up to `max_attempts` times until the evaluator accepts.
///
/// Returns the accepted report, or the last one written when none was
/// accepted. A `max_attempts` of zero is treated as one.
///
/// # Errors
///
/// Propagates provider failures from either agent.
pub async fn evaluate_and_retry(
    writer: &WriterAgent,
    evaluator: &EvaluatorAgent,
    provider: &dyn LlmProvider,
    context: &str,
    target: &str,
    max_attempts: usize,
) -> Result<String, AgentError> {
    let attempts = max_attempts.max(1);
    let mut report = String::new();
    for attempt in 1..=attempts {
        report = writer.write(provider, context).await?;
        if evaluator.accepts(provider, target, &report).await? {
            tracing::info!(attempt, "report accepted");
            return Ok(report);
        }
        tracing::info!(attempt, max_attempts = attempts, "report not accepted");
    }
    tracing::warn!(attempts, "returning last report without acceptance");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use test_case::test_case;

    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::agent::prompt::{EVALUATOR_SYSTEM_PROMPT, WRITER_SYSTEM_PROMPT};

    /// Numbers each report and answers evaluations from a verdict queue.
    struct Desk {
        reports: AtomicUsize,
        verdicts: Mutex<Vec<&'static str>>,
    }

    impl Desk {
        fn new(verdicts: &[&'static str]) -> Self {
            let mut verdicts = verdicts.to_vec();
            verdicts.reverse();
            Self {
                reports: AtomicUsize::new(0),
                verdicts: Mutex::new(verdicts),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for Desk {
        fn name(&self) -> &'static str {
            "desk"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            let system = request
                .messages
                .first()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let content = if system == EVALUATOR_SYSTEM_PROMPT {
                self.verdicts
                    .lock()
                    .ok()
                    .and_then(|mut v| v.pop())
                    .unwrap_or("NO")
                    .to_string()
            } else {
                let n = self.reports.fetch_add(1, Ordering::SeqCst) + 1;
                format!("report {n}")
            };
            Ok(ChatResponse {
                content,
                ..ChatResponse::default()
            })
        }
    }

    fn agents() -> (WriterAgent, EvaluatorAgent) {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        (
            WriterAgent::new(&config, WRITER_SYSTEM_PROMPT.to_string()),
            EvaluatorAgent::new(&config, EVALUATOR_SYSTEM_PROMPT.to_string()),
        )
    }

    #[test_case("YES", true ; "plain yes")]
    #[test_case("  yes, it covers everything", true ; "lowercase with padding")]
    #[test_case("NO. Missing references.", false ; "no")]
    #[test_case("The answer is YES", false ; "yes not leading")]
    #[test_case("", false ; "empty")]
    fn test_is_acceptance(reply: &str, expected: bool) {
        assert_eq!(is_acceptance(reply), expected);
    }

    #[tokio::test]
    async fn test_accepts_on_second_attempt() {
        let desk = Desk::new(&["NO, thin.", "Yes."]);
        let (writer, evaluator) = agents();
        let report = evaluate_and_retry(&writer, &evaluator, &desk, "ctx", "France", 3).await;
        assert_eq!(report.unwrap_or_default(), "report 2");
        assert_eq!(desk.reports.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_returns_last_report_when_never_accepted() {
        let desk = Desk::new(&["NO", "NO", "NO"]);
        let (writer, evaluator) = agents();
        let report = evaluate_and_retry(&writer, &evaluator, &desk, "ctx", "France", 3).await;
        assert_eq!(report.unwrap_or_default(), "report 3");
        assert_eq!(desk.reports.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_writes_once() {
        let desk = Desk::new(&["NO"]);
        let (writer, evaluator) = agents();
        let report = evaluate_and_retry(&writer, &evaluator, &desk, "ctx", "France", 0).await;
        assert_eq!(report.unwrap_or_default(), "report 1");
    }

    #[tokio::test]
    async fn test_write_single_call() {
        let desk = Desk::new(&[]);
        let (writer, _) = agents();
        let report = writer.write(&desk, "ctx").await;
        assert_eq!(report.unwrap_or_default(), "report 1");
        assert_eq!(desk.reports.load(Ordering::SeqCst), 1);
    }
}
