//! Core research domain types.
//!
//! Plan parsing, the replan merge law and session state. Nothing here talks
//! to a model or the network, so the control-loop invariants are tested in
//! isolation.

pub mod replan;
pub mod session;
pub mod step;

pub use replan::{NO_ADDITIONAL_STEPS, ReplanOutcome, ReplanState};
pub use session::{CompletedStep, ResearchPlan, ResearchSession, SessionPhase};
pub use step::{dedup_steps, parse_numbered_steps};
