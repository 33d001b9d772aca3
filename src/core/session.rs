//! Research session state.
//!
//! A [`ResearchSession`] owns everything one research run accumulates: the
//! plan, completed steps, the running context, replan bookkeeping and the
//! final report. The orchestrator drives it through [`SessionPhase`]s; the
//! value stays inspectable (and serializable) after a failure.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::replan::{ReplanOutcome, ReplanState};
use super::step::dedup_steps;
use crate::error::AgentError;

/// Lifecycle phase of a research session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the planner.
    Planning,
    /// Plan generated; steps may be edited before execution.
    Review,
    /// A batch of steps is running.
    ExecutingBatch,
    /// Asking the replanner for more steps.
    Replanning,
    /// Synthesizing the report.
    Reporting,
    /// Finished (with or without a report).
    Done,
    /// Halted after a fatal error.
    Failed,
}

impl SessionPhase {
    /// Returns the phase name used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Review => "review",
            Self::ExecutingBatch => "executing_batch",
            Self::Replanning => "replanning",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` once the session can make no further progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step paired with the text its execution produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStep {
    /// The step directive.
    pub step: String,
    /// Result text returned by the step executor.
    pub result: String,
}

/// A reviewable plan, as written by `deepquest plan` and read by `deepquest run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// The research query the plan answers.
    pub query: String,
    /// Ordered step directives.
    pub steps: Vec<String>,
}

impl ResearchPlan {
    /// Checks that the plan has a query and at least one non-blank step.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.query.trim().is_empty() {
            return Err(AgentError::InvalidConfig {
                message: "plan query cannot be empty".to_string(),
            });
        }
        if self.steps.iter().all(|s| s.trim().is_empty()) {
            return Err(AgentError::InvalidConfig {
                message: "plan must contain at least one step".to_string(),
            });
        }
        Ok(())
    }
}

/// State of one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSession {
    query: String,
    steps: Vec<String>,
    completed: Vec<CompletedStep>,
    context: String,
    replan: ReplanState,
    report: Option<String>,
    phase: SessionPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

impl ResearchSession {
    /// Creates a session in [`SessionPhase::Planning`] for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>, max_replan_rounds: usize) -> Self {
        Self {
            query: query.into(),
            steps: Vec::new(),
            completed: Vec::new(),
            context: String::new(),
            replan: ReplanState::new(max_replan_rounds),
            report: None,
            phase: SessionPhase::Planning,
            failure: None,
        }
    }

    /// Creates a session in [`SessionPhase::Review`] from an edited plan.
    ///
    /// Blank steps are dropped, steps are trimmed, and repeated steps keep
    /// their first position only.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if the plan fails validation.
    pub fn from_plan(plan: ResearchPlan, max_replan_rounds: usize) -> Result<Self, AgentError> {
        plan.validate()?;
        let mut session = Self::new(plan.query.trim(), max_replan_rounds);
        session.set_plan(
            plan.steps
                .iter()
                .map(|step| step.trim())
                .filter(|step| !step.is_empty())
                .map(str::to_string)
                .collect(),
        );
        Ok(session)
    }

    /// The research query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Planned steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Completed steps in completion order.
    #[must_use]
    pub fn completed(&self) -> &[CompletedStep] {
        &self.completed
    }

    /// The accumulated `Step:`/`Result:` context.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Replan bookkeeping.
    #[must_use]
    pub const fn replan(&self) -> &ReplanState {
        &self.replan
    }

    /// The synthesized report, once written.
    #[must_use]
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Failure message recorded when the session halted.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Returns `(completed, total)` step counts.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        (self.completed.len(), self.steps.len())
    }

    /// Returns `true` if `step` already has a result.
    #[must_use]
    pub fn is_executed(&self, step: &str) -> bool {
        self.completed.iter().any(|c| c.step == step)
    }

    /// Returns `true` while planned steps remain unexecuted.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.unexecuted().next().is_some()
    }

    /// Returns the next batch: up to `batch_size` unexecuted steps in plan
    /// order.
    ///
    /// Steps are unique and run in plan order, so the batch starts at the
    /// completed-count offset.
    #[must_use]
    pub fn pending_batch(&self, batch_size: usize) -> Vec<String> {
        self.unexecuted().take(batch_size).cloned().collect()
    }

    fn unexecuted(&self) -> impl Iterator<Item = &String> {
        self.steps.iter().filter(|step| !self.is_executed(step))
    }

    /// Exports the current query and steps as a reviewable plan.
    #[must_use]
    pub fn to_plan(&self) -> ResearchPlan {
        ResearchPlan {
            query: self.query.clone(),
            steps: self.steps.clone(),
        }
    }

    /// Appends a step during review.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] outside the review phase, for a
    /// blank step, or for a step that is already planned.
    pub fn add_step(&mut self, step: &str) -> Result<(), AgentError> {
        self.require_review("add a step")?;
        let step = step.trim();
        if step.is_empty() {
            return Err(AgentError::Orchestration {
                message: "step cannot be empty".to_string(),
            });
        }
        if self.steps.iter().any(|s| s == step) {
            return Err(AgentError::Orchestration {
                message: format!("step already planned: {step}"),
            });
        }
        self.steps.push(step.to_string());
        Ok(())
    }

    /// Removes the step at `index` during review and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] outside the review phase, for an
    /// out-of-range index, or when it would leave the plan empty.
    pub fn remove_step(&mut self, index: usize) -> Result<String, AgentError> {
        self.require_review("remove a step")?;
        if index >= self.steps.len() {
            return Err(AgentError::Orchestration {
                message: format!(
                    "step index {index} out of range (plan has {} steps)",
                    self.steps.len()
                ),
            });
        }
        if self.steps.len() == 1 {
            return Err(AgentError::Orchestration {
                message: "at least one step must remain".to_string(),
            });
        }
        Ok(self.steps.remove(index))
    }

    fn require_review(&self, action: &str) -> Result<(), AgentError> {
        if self.phase == SessionPhase::Review {
            Ok(())
        } else {
            Err(AgentError::Orchestration {
                message: format!("cannot {action} in phase '{}'", self.phase),
            })
        }
    }

    /// Installs a plan for review. Repeated steps keep their first position.
    pub(crate) fn set_plan(&mut self, steps: Vec<String>) {
        self.steps = dedup_steps(steps);
        self.phase = SessionPhase::Review;
    }

    pub(crate) const fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    /// Folds one step result into the completed list and the context.
    pub(crate) fn record_result(&mut self, step: String, result: String) {
        self.context.push_str("\nStep: ");
        self.context.push_str(&step);
        self.context.push_str("\nResult: ");
        self.context.push_str(&result);
        self.context.push('\n');
        self.completed.push(CompletedStep { step, result });
    }

    pub(crate) fn apply_replan(&mut self, reply: &str, max_steps: usize) -> ReplanOutcome {
        self.replan.apply(&mut self.steps, reply, max_steps)
    }

    pub(crate) fn set_report(&mut self, report: String) {
        self.report = Some(report);
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.failure = Some(message.into());
        self.phase = SessionPhase::Failed;
    }
}
