//! Terminal progress rendering for research sessions.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::agent::{SessionEvent, SessionObserver};
use crate::core::SessionPhase;

/// Renders [`SessionEvent`]s as a progress bar on stderr.
///
/// The bar hides itself when stderr is not a terminal, so piped output
/// stays clean.
#[derive(Debug)]
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    /// Creates a hidden-until-planned progress bar.
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    /// Creates an observer that draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionObserver for ProgressObserver {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Phase(SessionPhase::Planning) => self.bar.set_message("planning"),
            SessionEvent::Phase(SessionPhase::Replanning) => self.bar.set_message("replanning"),
            SessionEvent::Phase(SessionPhase::Reporting) => {
                self.bar.set_message("writing report");
            }
            SessionEvent::Phase(SessionPhase::Done) => self.bar.finish_and_clear(),
            SessionEvent::Phase(_) => {}
            SessionEvent::Planned { steps } => self.bar.set_length(*steps as u64),
            SessionEvent::BatchStarted { steps } => {
                self.bar.set_message(format!("executing {} step(s)", steps.len()));
            }
            SessionEvent::StepCompleted {
                completed, total, ..
            } => {
                self.bar.set_length(*total as u64);
                self.bar.set_position(*completed as u64);
            }
            SessionEvent::Replanned { total, .. } => self.bar.set_length(*total as u64),
            SessionEvent::ReportWritten => self.bar.set_message("report written"),
            SessionEvent::Failed { message } => self.bar.abandon_with_message(message.clone()),
        }
    }
}
