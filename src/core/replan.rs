//! Bounded replanning state and the step merge law.
//!
//! The replanner model proposes extra steps after each batch. Merging is
//! deterministic and lives here so it can be tested without a model:
//! candidates are capped to the remaining step budget, duplicates are
//! dropped, and every non-sentinel round counts towards the replan cap.

use serde::{Deserialize, Serialize};

use super::step::parse_numbered_steps;

/// Sentinel phrase a replanner reply uses to decline adding steps.
pub const NO_ADDITIONAL_STEPS: &str = "no additional steps needed";

/// Replanning bookkeeping for one research session.
///
/// Once [`limit_reached`](Self::limit_reached) latches, no further replanning
/// happens for the session; already planned steps still execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplanState {
    rounds: usize,
    limit_reached: bool,
    max_rounds: usize,
}

/// What a single replan application did to the step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplanOutcome {
    /// The cap had already latched; nothing was consulted.
    Skipped,
    /// The model declined to add steps; the round counter was reset.
    NoneNeeded,
    /// New unique steps were appended.
    Added {
        /// Number of steps appended.
        count: usize,
        /// Whether candidates were cut to respect the step ceiling.
        capped: bool,
    },
    /// Every candidate was already planned (or the budget was exhausted).
    DuplicatesOnly {
        /// Whether candidates were cut to respect the step ceiling.
        capped: bool,
    },
}

impl ReplanOutcome {
    /// Returns `true` if candidates were dropped because of the step ceiling.
    #[must_use]
    pub const fn capped(self) -> bool {
        match self {
            Self::Added { capped, .. } | Self::DuplicatesOnly { capped } => capped,
            Self::Skipped | Self::NoneNeeded => false,
        }
    }
}

impl ReplanState {
    /// Creates a fresh state allowing `max_rounds` productive rounds.
    #[must_use]
    pub const fn new(max_rounds: usize) -> Self {
        Self {
            rounds: 0,
            limit_reached: false,
            max_rounds,
        }
    }

    /// Consecutive replan rounds since the last reset.
    #[must_use]
    pub const fn rounds(&self) -> usize {
        self.rounds
    }

    /// Whether the replan cap has latched.
    #[must_use]
    pub const fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    /// Configured round cap.
    #[must_use]
    pub const fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Applies a replanner reply to the step list.
    ///
    /// The reply is matched against [`NO_ADDITIONAL_STEPS`] case-insensitively.
    /// Otherwise its numbered lines are candidates: at most
    /// `max_steps - steps.len()` of them are considered, and those equal to a
    /// planned step (or to an earlier candidate) are dropped. Steps are only
    /// ever appended. Every round that is not the sentinel increments the
    /// counter, and exceeding `max_rounds` latches the cap.
    pub fn apply(&mut self, steps: &mut Vec<String>, reply: &str, max_steps: usize) -> ReplanOutcome {
        if self.limit_reached {
            return ReplanOutcome::Skipped;
        }

        if reply.to_lowercase().contains(NO_ADDITIONAL_STEPS) {
            self.rounds = 0;
            return ReplanOutcome::NoneNeeded;
        }

        let candidates = parse_numbered_steps(reply);
        let budget = max_steps.saturating_sub(steps.len());
        let capped = candidates.len() > budget;

        let mut added = 0;
        for candidate in candidates.into_iter().take(budget) {
            if !steps.contains(&candidate) {
                steps.push(candidate);
                added += 1;
            }
        }

        self.rounds += 1;
        if self.rounds > self.max_rounds {
            self.limit_reached = true;
        }

        if added > 0 {
            ReplanOutcome::Added {
                count: added,
                capped,
            }
        } else {
            ReplanOutcome::DuplicatesOnly { capped }
        }
    }
}

impl Default for ReplanState {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn plan(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test_case("No additional steps needed." ; "canonical")]
    #[test_case("NO ADDITIONAL STEPS NEEDED" ; "upper case")]
    #[test_case("I think no Additional Steps Needed here." ; "embedded")]
    fn test_sentinel_resets_rounds(reply: &str) {
        let mut state = ReplanState::new(3);
        let mut steps = plan(&["a", "b"]);
        state.apply(&mut steps, "1. c", 20);
        assert_eq!(state.rounds(), 1);

        let outcome = state.apply(&mut steps, reply, 20);
        assert_eq!(outcome, ReplanOutcome::NoneNeeded);
        assert_eq!(state.rounds(), 0);
        assert_eq!(steps, plan(&["a", "b", "c"]));
    }

    #[test]
    fn test_appends_unique_candidates() {
        let mut state = ReplanState::new(3);
        let mut steps = plan(&["Find population", "Find area"]);
        let outcome = state.apply(
            &mut steps,
            "1. Find area\n2. Find GDP\n3. Find GDP\n4. Find climate",
            20,
        );
        assert_eq!(
            outcome,
            ReplanOutcome::Added {
                count: 2,
                capped: false
            }
        );
        assert_eq!(
            steps,
            plan(&["Find population", "Find area", "Find GDP", "Find climate"])
        );
        assert_eq!(state.rounds(), 1);
    }

    #[test]
    fn test_candidates_truncated_to_budget() {
        let mut state = ReplanState::new(3);
        let mut steps = plan(&["a", "b", "c", "d"]);
        let outcome = state.apply(&mut steps, "1. e\n2. f\n3. g", 5);
        assert_eq!(
            outcome,
            ReplanOutcome::Added {
                count: 1,
                capped: true
            }
        );
        assert_eq!(steps.len(), 5);
        assert!(outcome.capped());
    }

    #[test]
    fn test_full_plan_counts_round() {
        let mut state = ReplanState::new(3);
        let mut steps = plan(&["a", "b"]);
        let outcome = state.apply(&mut steps, "1. c", 2);
        assert_eq!(outcome, ReplanOutcome::DuplicatesOnly { capped: true });
        assert_eq!(steps.len(), 2);
        assert_eq!(state.rounds(), 1);
    }

    #[test]
    fn test_cap_latches_after_max_rounds() {
        let mut state = ReplanState::new(3);
        let mut steps = plan(&["a", "b"]);
        let dupes = "1. a\n2. b";

        for round in 1..=3 {
            let outcome = state.apply(&mut steps, dupes, 20);
            assert_eq!(outcome, ReplanOutcome::DuplicatesOnly { capped: false });
            assert_eq!(state.rounds(), round);
            assert!(!state.limit_reached());
        }

        state.apply(&mut steps, dupes, 20);
        assert_eq!(state.rounds(), 4);
        assert!(state.limit_reached());

        let before = state;
        let outcome = state.apply(&mut steps, "1. brand new step", 20);
        assert_eq!(outcome, ReplanOutcome::Skipped);
        assert_eq!(state, before);
        assert_eq!(steps, plan(&["a", "b"]));
    }

    #[test]
    fn test_sentinel_after_latch_is_skipped() {
        let mut state = ReplanState::new(0);
        let mut steps = plan(&["a"]);
        state.apply(&mut steps, "1. b", 20);
        assert!(state.limit_reached());
        assert_eq!(
            state.apply(&mut steps, NO_ADDITIONAL_STEPS, 20),
            ReplanOutcome::Skipped
        );
        assert_eq!(state.rounds(), 1);
    }

    #[test]
    fn test_state_serialization() {
        let state = ReplanState::new(3);
        let json = serde_json::to_string(&state).unwrap_or_default();
        assert!(json.contains("\"max_rounds\":3"));
        assert!(json.contains("\"limit_reached\":false"));
    }

    proptest! {
        #[test]
        fn prop_merge_has_no_duplicates_and_respects_ceiling(
            initial in proptest::collection::hash_set("[a-z]{1,6}", 0..8),
            candidates in proptest::collection::vec("[a-z]{1,6}", 0..12),
            max_steps in 1usize..15,
        ) {
            let mut steps: Vec<String> = initial.into_iter().collect();
            let before = steps.clone();
            let reply: String = candidates
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}. {c}\n", i + 1))
                .collect();

            let mut state = ReplanState::new(3);
            state.apply(&mut steps, &reply, max_steps);

            let mut seen = std::collections::HashSet::new();
            prop_assert!(steps.iter().all(|s| seen.insert(s.clone())));
            prop_assert!(steps.len() <= max_steps.max(before.len()));
            prop_assert_eq!(&steps[..before.len()], &before[..]);
        }

        #[test]
        fn prop_latched_state_is_noop(
            reply in "[0-9a-z .\n]{0,40}",
            max_steps in 1usize..10,
        ) {
            let mut state = ReplanState::new(0);
            let mut steps = vec!["seed".to_string()];
            state.apply(&mut steps, "1. x", 20);
            prop_assume!(state.limit_reached());

            let snapshot = (state, steps.clone());
            let outcome = state.apply(&mut steps, &reply, max_steps);
            prop_assert_eq!(outcome, ReplanOutcome::Skipped);
            prop_assert_eq!((state, steps), snapshot);
        }
    }
}
