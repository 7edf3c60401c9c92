//! Controls when an optimizer run terminates.
//!
//! A run always ends at its generation budget. It may end earlier when the
//! best feasible cost has stopped improving (plateau), when a wall-clock
//! deadline passes, or when the caller raises the cancellation flag. None of
//! these discard work; the best front found so far is always returned,
//! tagged with the stop reason.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Termination criteria of one optimizer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Schedule {
    /// Hard generation budget.
    pub max_generations: u32,
    /// Stop after this many generations without improvement of the best
    /// feasible cost. `None` disables plateau detection.
    pub patience: Option<u32>,
    /// Wall-clock budget, checked at each generation boundary.
    pub deadline: Option<Duration>,
}

/// Why a run stopped. `GenerationBudget` is the ordinary full run; the other
/// reasons mark early termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    GenerationBudget,
    Plateau,
    Deadline,
    Cancelled,
}

impl StopReason {
    /// True when the run ended before its generation budget.
    pub fn is_early(&self) -> bool {
        !matches!(self, StopReason::GenerationBudget)
    }
}

impl Schedule {
    pub fn generations(max_generations: u32) -> Self {
        Self {
            max_generations,
            patience: None,
            deadline: None,
        }
    }

    pub fn with_patience(mut self, patience: u32) -> Self {
        self.patience = Some(patience);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Decides whether the run should stop after `generations_completed`
    /// generations, `since_improvement` of which brought no better feasible
    /// cost, with `elapsed` wall-clock spent so far.
    #[instrument(level = "debug", skip(self), fields(generations_completed = generations_completed, since_improvement = since_improvement))]
    pub(crate) fn should_stop(
        &self,
        generations_completed: u32,
        since_improvement: u32,
        elapsed: Duration,
    ) -> Option<StopReason> {
        if generations_completed >= self.max_generations {
            return Some(StopReason::GenerationBudget);
        }

        if let Some(deadline) = self.deadline {
            if elapsed >= deadline {
                return Some(StopReason::Deadline);
            }
        }

        if let Some(patience) = self.patience {
            if since_improvement >= patience {
                return Some(StopReason::Plateau);
            }
        }

        None
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            max_generations: 250,
            patience: None,
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_stops_at_the_generation_budget() {
        let schedule = Schedule::generations(100);

        assert_eq!(schedule.should_stop(99, 0, Duration::ZERO), None);
        assert_eq!(
            schedule.should_stop(100, 0, Duration::ZERO),
            Some(StopReason::GenerationBudget)
        );
    }

    #[test]
    fn it_detects_a_plateau() {
        let schedule = Schedule::generations(1000).with_patience(30);

        assert_eq!(schedule.should_stop(500, 29, Duration::ZERO), None);
        assert_eq!(
            schedule.should_stop(500, 30, Duration::ZERO),
            Some(StopReason::Plateau)
        );
    }

    #[test]
    fn it_enforces_the_deadline() {
        let schedule = Schedule::generations(1000).with_deadline(Duration::from_secs(5));

        assert_eq!(schedule.should_stop(10, 0, Duration::from_secs(4)), None);
        assert_eq!(
            schedule.should_stop(10, 0, Duration::from_secs(5)),
            Some(StopReason::Deadline)
        );
    }

    #[test]
    fn budget_takes_precedence_over_other_reasons() {
        let schedule = Schedule::generations(10)
            .with_patience(5)
            .with_deadline(Duration::from_secs(1));

        assert_eq!(
            schedule.should_stop(10, 9, Duration::from_secs(9)),
            Some(StopReason::GenerationBudget)
        );
    }

    #[test]
    fn early_flag_marks_everything_but_the_budget() {
        assert!(!StopReason::GenerationBudget.is_early());
        assert!(StopReason::Plateau.is_early());
        assert!(StopReason::Deadline.is_early());
        assert!(StopReason::Cancelled.is_early());
    }
}
