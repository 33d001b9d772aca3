//! Orchestrator for the plan-execute-replan research loop.
//!
//! Drives a [`ResearchSession`] through its phases:
//!
//! ```text
//! Planning → Review → ExecutingBatch → Replanning ─┬→ ExecutingBatch (steps pending)
//!                                                  └→ Reporting → Done
//! ```
//!
//! Steps run in batches of `batch_size` on a [`JoinSet`]. Every worker in a
//! batch sees the context snapshot taken when the batch started; results are
//! folded in completion order. The first worker failure halts the session
//! and drops the set, aborting the rest of the batch.

use std::sync::Arc;

use tokio::task::JoinSet;

use super::config::AgentConfig;
use super::executor::StepExecutor;
use super::observer::{NoopObserver, SessionEvent, SessionObserver};
use super::planner::{PlannerAgent, ReplannerAgent};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::writer::{EvaluatorAgent, WriterAgent, evaluate_and_retry};
use crate::core::{ResearchSession, SessionPhase};
use crate::error::AgentError;
use crate::gateway::ToolGateway;

/// Message recorded on a session that halted on an LLM or worker failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Research session failed, try again shortly.";

/// Orchestrates research sessions.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    gateway: Arc<ToolGateway>,
    config: AgentConfig,
    prompts: PromptSet,
    observer: Arc<dyn SessionObserver>,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given provider, gateway and configuration.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        gateway: Arc<ToolGateway>,
        config: AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            provider,
            gateway,
            config,
            prompts,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the system prompts.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Sets the progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Creates a session for `query` using the configured replan cap.
    #[must_use]
    pub fn new_session(&self, query: &str) -> ResearchSession {
        ResearchSession::new(query, self.config.max_replan_rounds)
    }

    /// Plans and runs a session for `query` in one go.
    ///
    /// # Errors
    ///
    /// Returns the failure that halted the session. Use
    /// [`Orchestrator::new_session`] and [`Orchestrator::run`] instead when
    /// partial progress must be inspected after a failure.
    pub async fn research(&self, query: &str) -> Result<ResearchSession, AgentError> {
        let mut session = self.new_session(query);
        self.run(&mut session).await?;
        Ok(session)
    }

    /// Generates the initial plan, moving the session to
    /// [`SessionPhase::Review`].
    ///
    /// An empty plan moves the session straight to [`SessionPhase::Done`]
    /// without a report.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if the session is not in
    /// [`SessionPhase::Planning`]; planner failures halt the session.
    pub async fn plan(&self, session: &mut ResearchSession) -> Result<(), AgentError> {
        if session.phase() != SessionPhase::Planning {
            return Err(AgentError::Orchestration {
                message: format!("cannot plan a session in phase '{}'", session.phase()),
            });
        }
        self.emit(&SessionEvent::Phase(SessionPhase::Planning));

        let planner = PlannerAgent::new(&self.config, self.prompts.planner.clone());
        let steps = match planner
            .plan(&*self.provider, session.query(), self.config.max_steps)
            .await
        {
            Ok(steps) => steps,
            Err(e) => return Err(self.abort(session, e)),
        };

        if steps.is_empty() {
            tracing::warn!(query = session.query(), "no plan available");
            self.enter(session, SessionPhase::Done);
            return Ok(());
        }

        self.emit(&SessionEvent::Planned { steps: steps.len() });
        session.set_plan(steps);
        self.emit(&SessionEvent::Phase(SessionPhase::Review));
        Ok(())
    }

    /// Runs the session to completion.
    ///
    /// A session still in [`SessionPhase::Planning`] is planned first. A
    /// session that is already done is left untouched, and the report is
    /// only written if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns the failure that halted the session. The session keeps every
    /// result folded before the failure and records
    /// [`GENERIC_FAILURE_MESSAGE`].
    pub async fn run(&self, session: &mut ResearchSession) -> Result<(), AgentError> {
        match session.phase() {
            SessionPhase::Planning => {
                self.plan(session).await?;
                if session.phase() == SessionPhase::Done {
                    return Ok(());
                }
            }
            SessionPhase::Done => return Ok(()),
            SessionPhase::Failed => {
                return Err(AgentError::Orchestration {
                    message: session
                        .failure()
                        .unwrap_or(GENERIC_FAILURE_MESSAGE)
                        .to_string(),
                });
            }
            SessionPhase::Review
            | SessionPhase::ExecutingBatch
            | SessionPhase::Replanning
            | SessionPhase::Reporting => {}
        }

        let executor = Arc::new(StepExecutor::new(
            &self.config,
            Arc::clone(&self.provider),
            Arc::clone(&self.gateway),
            self.prompts.executor.clone(),
        ));
        let replanner = ReplannerAgent::new(&self.config, self.prompts.replanner.clone());
        let mut cap_warned = false;

        while session.has_pending() {
            self.execute_batch(session, &executor).await?;

            self.enter(session, SessionPhase::Replanning);
            if session.replan().limit_reached() {
                continue;
            }
            let outcome = match replanner
                .replan(&*self.provider, session, self.config.max_steps)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => return Err(self.abort(session, e)),
            };
            if outcome.capped() && !cap_warned {
                tracing::warn!(
                    max_steps = self.config.max_steps,
                    "replanner proposed more steps than the plan allows; extra steps dropped"
                );
                cap_warned = true;
            }
            self.emit(&SessionEvent::Replanned {
                outcome,
                total: session.steps().len(),
            });
        }

        self.report(session).await?;
        self.enter(session, SessionPhase::Done);
        Ok(())
    }

    /// Executes the next batch and folds its results.
    async fn execute_batch(
        &self,
        session: &mut ResearchSession,
        executor: &Arc<StepExecutor>,
    ) -> Result<(), AgentError> {
        self.enter(session, SessionPhase::ExecutingBatch);

        let batch = session.pending_batch(self.config.batch_size);
        if batch.is_empty() {
            let e = AgentError::Orchestration {
                message: "pending steps could not be scheduled".to_string(),
            };
            return Err(self.abort(session, e));
        }
        tracing::info!(
            batch = batch.len(),
            completed = session.completed().len(),
            total = session.steps().len(),
            "executing batch"
        );
        self.emit(&SessionEvent::BatchStarted {
            steps: batch.clone(),
        });

        let snapshot: Arc<str> = Arc::from(session.context());
        let mut tasks = JoinSet::new();
        for step in batch {
            let executor = Arc::clone(executor);
            let context = Arc::clone(&snapshot);
            tasks.spawn(async move {
                let result = executor.execute(&step, &context).await;
                (step, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((step, Ok(result))) => {
                    tracing::debug!(step, "step completed");
                    session.record_result(step.clone(), result);
                    let (completed, total) = session.progress();
                    self.emit(&SessionEvent::StepCompleted {
                        step,
                        completed,
                        total,
                    });
                }
                Ok((step, Err(e))) => {
                    let e = AgentError::StepFailed {
                        step,
                        source: Box::new(e),
                    };
                    return Err(self.abort(session, e));
                }
                Err(e) => {
                    let e = AgentError::Orchestration {
                        message: format!("step task failed: {e}"),
                    };
                    return Err(self.abort(session, e));
                }
            }
        }
        Ok(())
    }

    /// Writes the report unless one exists.
    async fn report(&self, session: &mut ResearchSession) -> Result<(), AgentError> {
        if session.report().is_some() {
            return Ok(());
        }
        self.enter(session, SessionPhase::Reporting);

        let writer = WriterAgent::new(&self.config, self.prompts.writer.clone());
        let report = if self.config.evaluate_report {
            let evaluator = EvaluatorAgent::new(&self.config, self.prompts.evaluator.clone());
            evaluate_and_retry(
                &writer,
                &evaluator,
                &*self.provider,
                session.context(),
                session.query(),
                self.config.max_attempts,
            )
            .await
        } else {
            writer.write(&*self.provider, session.context()).await
        };

        match report {
            Ok(report) => {
                session.set_report(report);
                self.emit(&SessionEvent::ReportWritten);
                Ok(())
            }
            Err(e) => Err(self.abort(session, e)),
        }
    }

    fn enter(&self, session: &mut ResearchSession, phase: SessionPhase) {
        session.set_phase(phase);
        self.emit(&SessionEvent::Phase(phase));
    }

    /// Halts the session and hands the detailed error back to the caller.
    fn abort(&self, session: &mut ResearchSession, error: AgentError) -> AgentError {
        let (completed, total) = session.progress();
        tracing::error!(error = %error, completed, total, "research session failed");
        session.fail(GENERIC_FAILURE_MESSAGE);
        self.emit(&SessionEvent::Failed {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        });
        error
    }

    fn emit(&self, event: &SessionEvent) {
        self.observer.on_event(event);
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("gateway", &self.gateway)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};

    /// Answers by role, keyed on the system prompt.
    struct RoleProvider {
        plan: String,
        replan: String,
        planner_calls: AtomicUsize,
        replanner_calls: AtomicUsize,
        executor_calls: AtomicUsize,
        writer_calls: AtomicUsize,
    }

    impl RoleProvider {
        fn new(plan: &str, replan: &str) -> Self {
            Self {
                plan: plan.to_string(),
                replan: replan.to_string(),
                planner_calls: AtomicUsize::new(0),
                replanner_calls: AtomicUsize::new(0),
                executor_calls: AtomicUsize::new(0),
                writer_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RoleProvider {
        fn name(&self) -> &'static str {
            "roles"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            let system = request.messages.first().map_or("", |m| m.content.as_str());
            let content = match system {
                "planner" => {
                    self.planner_calls.fetch_add(1, Ordering::SeqCst);
                    self.plan.clone()
                }
                "replanner" => {
                    self.replanner_calls.fetch_add(1, Ordering::SeqCst);
                    self.replan.clone()
                }
                "executor" => {
                    self.executor_calls.fetch_add(1, Ordering::SeqCst);
                    "found it".to_string()
                }
                _ => {
                    self.writer_calls.fetch_add(1, Ordering::SeqCst);
                    "the report".to_string()
                }
            };
            Ok(ChatResponse {
                content,
                ..ChatResponse::default()
            })
        }
    }

    struct Recorder(Mutex<Vec<SessionEvent>>);

    impl SessionObserver for Recorder {
        fn on_event(&self, event: &SessionEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event.clone());
            }
        }
    }

    fn prompts() -> PromptSet {
        PromptSet {
            planner: "planner".to_string(),
            replanner: "replanner".to_string(),
            executor: "executor".to_string(),
            writer: "writer".to_string(),
            evaluator: "evaluator".to_string(),
        }
    }

    fn orchestrator(provider: Arc<RoleProvider>) -> Orchestrator {
        let config = AgentConfig::builder()
            .api_key("test")
            .max_steps(5)
            .batch_size(2)
            .build()
            .unwrap_or_else(|_| unreachable!());
        Orchestrator::new(provider, Arc::new(ToolGateway::empty()), config)
            .with_prompts(prompts())
    }

    #[tokio::test]
    async fn test_research_runs_to_done() {
        let provider = Arc::new(RoleProvider::new(
            "1. Step A\n2. Step B\n3. Step C",
            "No additional steps needed.",
        ));
        let session = orchestrator(Arc::clone(&provider))
            .research("q")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(session.phase(), SessionPhase::Done);
        assert_eq!(session.completed().len(), 3);
        assert_eq!(session.report(), Some("the report"));
        assert_eq!(session.context().matches("\nStep: ").count(), 3);
        assert_eq!(provider.replanner_calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.writer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeated_planner_line_runs_once() {
        let provider = Arc::new(RoleProvider::new(
            "1. A\n2. B\n3. A\n4. C",
            "No additional steps needed.",
        ));
        let session = orchestrator(Arc::clone(&provider))
            .research("q")
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(session.phase(), SessionPhase::Done);
        assert_eq!(session.steps(), ["A", "B", "C"]);
        assert_eq!(session.completed().len(), 3);
        assert_eq!(provider.executor_calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.report(), Some("the report"));
    }

    #[tokio::test]
    async fn test_empty_plan_finishes_without_report() {
        let provider = Arc::new(RoleProvider::new("Sorry, no plan.", ""));
        let session = orchestrator(Arc::clone(&provider))
            .research("q")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(session.phase(), SessionPhase::Done);
        assert!(session.report().is_none());
        assert_eq!(provider.executor_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_review_edits_are_executed() {
        let provider = Arc::new(RoleProvider::new(
            "1. Step A\n2. Step B",
            "No additional steps needed.",
        ));
        let orch = orchestrator(Arc::clone(&provider));
        let mut session = orch.new_session("q");
        orch.plan(&mut session).await.unwrap_or_else(|_| unreachable!());
        assert_eq!(session.phase(), SessionPhase::Review);

        session.add_step("Step Z").unwrap_or_else(|_| unreachable!());
        let removed = session.remove_step(0).unwrap_or_default();
        assert_eq!(removed, "Step A");

        orch.run(&mut session).await.unwrap_or_else(|_| unreachable!());
        let done: Vec<&str> = session.completed().iter().map(|c| c.step.as_str()).collect();
        assert_eq!(done.len(), 2);
        assert!(done.contains(&"Step Z"));
        assert!(!done.contains(&"Step A"));
    }

    #[tokio::test]
    async fn test_run_is_idempotent_once_done() {
        let provider = Arc::new(RoleProvider::new("1. A", "No additional steps needed."));
        let orch = orchestrator(Arc::clone(&provider));
        let mut session = orch.research("q").await.unwrap_or_else(|_| unreachable!());
        orch.run(&mut session).await.unwrap_or_else(|_| unreachable!());
        assert_eq!(provider.writer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replan_respects_step_ceiling() {
        // The replanner always proposes more steps than the ceiling allows.
        let provider = Arc::new(RoleProvider::new("1. A", "1. B\n2. C\n3. D\n4. E\n5. F"));
        let session = orchestrator(Arc::clone(&provider))
            .research("q")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(session.steps().len(), 5);
        assert_eq!(session.completed().len(), 5);
        assert!(session.replan().rounds() >= 1);
    }

    #[tokio::test]
    async fn test_observer_sees_progress() {
        let provider = Arc::new(RoleProvider::new(
            "1. A\n2. B\n3. C",
            "No additional steps needed.",
        ));
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let _ = orchestrator(provider)
            .with_observer(Arc::clone(&recorder) as Arc<dyn SessionObserver>)
            .research("q")
            .await;

        let events = recorder.0.lock().map(|e| e.clone()).unwrap_or_default();
        let batches = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::BatchStarted { .. }))
            .count();
        assert_eq!(batches, 2);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::StepCompleted {
                completed: 3,
                total: 3,
                ..
            }
        )));
        assert_eq!(events.last(), Some(&SessionEvent::Phase(SessionPhase::Done)));
    }

    #[tokio::test]
    async fn test_failed_session_refuses_to_run() {
        let provider = Arc::new(RoleProvider::new("1. A", ""));
        let orch = orchestrator(provider);
        let mut session = orch.new_session("q");
        session.fail(GENERIC_FAILURE_MESSAGE);
        let result = orch.run(&mut session).await;
        assert!(matches!(result, Err(AgentError::Orchestration { .. })));
    }
}
