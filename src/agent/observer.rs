//! Session progress notifications.
//!
//! The orchestrator reports what it is doing through a [`SessionObserver`].
//! The CLI renders these as a progress bar; library callers can log them or
//! ignore them with [`NoopObserver`].

use crate::core::{ReplanOutcome, SessionPhase};

/// Something the orchestrator did to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session moved to a new phase.
    Phase(SessionPhase),
    /// The planner produced the initial step list.
    Planned {
        /// Number of planned steps.
        steps: usize,
    },
    /// A batch of steps was dispatched.
    BatchStarted {
        /// Steps in this batch.
        steps: Vec<String>,
    },
    /// One step finished and its result was folded into the context.
    StepCompleted {
        /// The step text.
        step: String,
        /// Steps completed so far.
        completed: usize,
        /// Steps currently planned.
        total: usize,
    },
    /// A replan round was applied.
    Replanned {
        /// What the round did.
        outcome: ReplanOutcome,
        /// Steps planned after the round.
        total: usize,
    },
    /// The report is ready.
    ReportWritten,
    /// The session halted.
    Failed {
        /// User-facing failure message.
        message: String,
    },
}

/// Receives [`SessionEvent`]s from the orchestrator.
///
/// Called from the orchestrator's own task, never from step workers, so
/// events arrive in order.
pub trait SessionObserver: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &SessionEvent);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&self, _event: &SessionEvent) {}
}
