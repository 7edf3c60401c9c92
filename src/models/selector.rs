//! Parent selection for the multi-objective search.
//!
//! Parents are chosen by crowded tournament: a handful of candidates are
//! drawn at random and the winner is the one with the better non-domination
//! rank, ties going to the larger crowding distance. Tournament size tunes
//! selection pressure:
//!
//! - **Size 2**: the NSGA-II default, balanced exploration and exploitation
//! - **Size 3-4**: moderate pressure for steady convergence
//! - **Size 5+**: strong pressure, risks premature convergence

use crate::models::ranking::Ranking;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Crowded-tournament parent selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Selector {
    /// Number of candidates competing in each tournament.
    tournament_size: usize,
}

/// Errors that prevent parent selection.
#[derive(Debug, thiserror::Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum SelectionError {
    /// Tournament size must be at least 1.
    #[error("tournament size must be at least 1")]
    ZeroTournamentSize,

    /// The population is smaller than one tournament.
    #[error("population too small for selection: need {min_required}, got {provided}")]
    InsufficientCandidates {
        min_required: usize,
        provided: usize,
    },
}

impl Selector {
    pub fn tournament(tournament_size: usize) -> Result<Self, SelectionError> {
        if tournament_size == 0 {
            return Err(SelectionError::ZeroTournamentSize);
        }

        Ok(Self { tournament_size })
    }

    fn run_tournament<R: Rng>(
        &self,
        indices: &mut [usize],
        ranking: &Ranking,
        rng: &mut R,
    ) -> usize {
        indices.shuffle(rng);

        let mut winner = indices[0];
        for &contender in &indices[1..self.tournament_size] {
            if ranking.is_better(contender, winner) {
                winner = contender;
            }
        }
        winner
    }

    /// Selects `num_pairs` parent pairs from the arena described by
    /// `ranking`. Returned values are arena indices.
    #[instrument(level = "debug", skip(self, ranking, rng), fields(num_pairs = num_pairs, num_candidates = num_candidates, tournament_size = self.tournament_size))]
    pub(crate) fn select_parents<R: Rng>(
        &self,
        num_pairs: usize,
        num_candidates: usize,
        ranking: &Ranking,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, SelectionError> {
        if num_candidates < self.tournament_size {
            return Err(SelectionError::InsufficientCandidates {
                min_required: self.tournament_size,
                provided: num_candidates,
            });
        }

        let mut indices: Vec<usize> = (0..num_candidates).collect();
        let mut parent_pairs = Vec::with_capacity(num_pairs);

        for _ in 0..num_pairs {
            let first = self.run_tournament(&mut indices, ranking, rng);
            let second = self.run_tournament(&mut indices, ranking, rng);
            parent_pairs.push((first, second));
        }

        Ok(parent_pairs)
    }
}

impl Default for Selector {
    /// Binary tournament, the NSGA-II convention.
    fn default() -> Self {
        Self { tournament_size: 2 }
    }
}
