//! The multi-objective genetic search over diet candidates.
//!
//! An elitist NSGA-II class loop: evaluate, rank by non-domination, breed by
//! crowded tournament, and keep the best of parents and offspring. One run
//! owns its population, Pareto front and random stream; nothing is shared
//! across concurrent runs.

use super::Error;
use crate::models::{
    Crossover, DietCandidate, Distribution, Mutagen, ParetoFront, Population, Problem, Ranking,
    Schedule, Selector, StopReason, rank_candidates,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::instrument;

/// Feasible-cost improvements smaller than this don't reset the plateau
/// counter.
const IMPROVEMENT_EPS: f64 = 1e-9;

/// Everything that parameterizes one optimizer run.
///
/// The defaults are a reasonable general-purpose configuration; callers
/// tuning a deployment usually start by adjusting `population_size` and the
/// schedule. An explicit `seed` makes the run bit-reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    pub population_size: u32,
    pub schedule: Schedule,
    pub crossover: Crossover,
    /// Probability that an offspring is bred by crossover rather than cloned
    /// from its first parent before mutation.
    pub crossover_rate: f64,
    pub mutagen: Mutagen,
    pub selector: Selector,
    pub distribution: Distribution,
    /// Explicit seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            population_size: 120,
            schedule: Schedule::default().with_patience(60),
            crossover: Crossover::default(),
            crossover_rate: 0.9,
            mutagen: Mutagen::default(),
            selector: Selector::default(),
            distribution: Distribution::default(),
            seed: None,
        }
    }
}

impl SearchParams {
    fn validate(&self) -> Result<(), Error> {
        if self.population_size < 2 {
            return Err(Error::PopulationTooSmall(self.population_size));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(Error::CrossoverRateOutOfRange(self.crossover_rate));
        }
        Ok(())
    }
}

/// Result of one run: the final non-dominated front and how the run ended.
/// The front is always populated, feasible or not: infeasibility shows up
/// as non-zero deviations on its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub front: ParetoFront,
    pub stop_reason: StopReason,
    pub generations: u32,
    pub evaluations: u64,
}

/// Per-generation snapshot handed to the observer callback.
#[derive(Debug)]
pub struct GenerationStats<'a> {
    /// Generation number; 0 is the initial population.
    pub number: u32,
    pub evaluations: u64,
    pub best_feasible_cost: Option<f64>,
    pub front_size: usize,
    pub population: &'a Population,
}

pub struct Optimizer {
    params: SearchParams,
}

impl Optimizer {
    pub fn new(params: SearchParams) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Runs the search without cancellation or progress reporting.
    pub fn solve(&self, problem: &Problem) -> Result<SearchOutcome, Error> {
        self.solve_with(problem, None, |_| {})
    }

    /// Runs the search, checking `cancel` at every generation boundary and
    /// calling `observer` after each evaluated generation.
    #[instrument(level = "info", skip(self, problem, cancel, observer), fields(population_size = self.params.population_size, max_generations = self.params.schedule.max_generations, dimension = problem.dimension()))]
    pub fn solve_with(
        &self,
        problem: &Problem,
        cancel: Option<&AtomicBool>,
        mut observer: impl FnMut(GenerationStats<'_>),
    ) -> Result<SearchOutcome, Error> {
        let params = &self.params;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let started = Instant::now();
        let population_size = params.population_size as usize;

        let members = params
            .distribution
            .distribute(&mut rng, problem, population_size);
        let mut population = Population::evaluate(problem, members);
        let mut evaluations = population.len() as u64;
        let mut ranking = rank_candidates(population.fitnesses());

        let mut generations = 0u32;
        let mut best_feasible_cost = population.best_feasible_cost();
        let mut since_improvement = 0u32;

        observer(GenerationStats {
            number: 0,
            evaluations,
            best_feasible_cost,
            front_size: ranking.first_front().len(),
            population: &population,
        });

        let stop_reason = loop {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                tracing::info!(generations, "search cancelled by caller");
                break StopReason::Cancelled;
            }
            if let Some(reason) =
                params
                    .schedule
                    .should_stop(generations, since_improvement, started.elapsed())
            {
                tracing::info!(generations, reason = ?reason, "search stopped");
                break reason;
            }

            let progress = generations as f64 / params.schedule.max_generations.max(1) as f64;
            let offspring = self.breed(problem, &population, &ranking, progress, &mut rng)?;
            let offspring = Population::evaluate(problem, offspring);
            evaluations += offspring.len() as u64;

            population = environmental_selection(population, offspring, population_size);
            ranking = rank_candidates(population.fitnesses());
            generations += 1;

            let current = population.best_feasible_cost();
            let improved = match (best_feasible_cost, current) {
                (None, Some(_)) => true,
                (Some(previous), Some(cost)) => cost < previous - IMPROVEMENT_EPS,
                _ => false,
            };
            if improved {
                best_feasible_cost = current;
                since_improvement = 0;
            } else {
                since_improvement += 1;
            }

            tracing::debug!(
                generation = generations,
                best_feasible_cost = ?best_feasible_cost,
                front_size = ranking.first_front().len(),
                "generation complete"
            );
            observer(GenerationStats {
                number: generations,
                evaluations,
                best_feasible_cost,
                front_size: ranking.first_front().len(),
                population: &population,
            });
        };

        Ok(SearchOutcome {
            front: population.extract_front(ranking.first_front()),
            stop_reason,
            generations,
            evaluations,
        })
    }

    /// Breeds one offspring cohort: crowded-tournament parents, crossover at
    /// the configured rate, mutation, and a clamp back into feed bounds.
    fn breed<R: Rng>(
        &self,
        problem: &Problem,
        population: &Population,
        ranking: &Ranking,
        progress: f64,
        rng: &mut R,
    ) -> Result<Vec<DietCandidate>, Error> {
        let params = &self.params;
        let pairs = params.selector.select_parents(
            params.population_size as usize,
            population.len(),
            ranking,
            rng,
        )?;

        let mut offspring = Vec::with_capacity(pairs.len());
        for (first, second) in pairs {
            let lhs = population.members()[first].amounts();
            let rhs = population.members()[second].amounts();

            let amounts = if rng.random_bool(params.crossover_rate) {
                params.crossover.apply(rng, lhs, rhs)
            } else {
                lhs.to_vec()
            };

            let mut child = DietCandidate::new(amounts);
            params
                .mutagen
                .mutate(rng, child.amounts_mut(), problem.bounds(), progress);
            child.clamp_to(problem);
            offspring.push(child);
        }

        Ok(offspring)
    }
}

/// Selects the next generation from parents ∪ offspring: whole fronts in
/// rank order, the last partial front by crowding distance. The cheapest
/// feasible member of the union is always retained, which makes the best
/// feasible cost monotone across generations.
fn environmental_selection(
    parents: Population,
    offspring: Population,
    population_size: usize,
) -> Population {
    let (mut members, mut fitnesses) = parents.into_parts();
    let (offspring_members, offspring_fitnesses) = offspring.into_parts();
    members.extend(offspring_members);
    fitnesses.extend(offspring_fitnesses);
    let combined = Population::from_parts(members, fitnesses);

    let ranking = rank_candidates(combined.fitnesses());

    let mut selected: Vec<usize> = Vec::with_capacity(population_size);
    for front in ranking.fronts() {
        if selected.len() + front.len() <= population_size {
            selected.extend_from_slice(front);
            if selected.len() == population_size {
                break;
            }
        } else {
            let mut by_crowding = front.clone();
            by_crowding.sort_by(|&a, &b| {
                ranking
                    .crowding_of(b)
                    .partial_cmp(&ranking.crowding_of(a))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            by_crowding.truncate(population_size - selected.len());
            selected.extend(by_crowding);
            break;
        }
    }

    // Elitism guard: crowding truncation on a large first front could drop
    // the cheapest feasible member even though it is non-dominated.
    let cheapest_feasible = combined
        .fitnesses()
        .iter()
        .enumerate()
        .filter(|(_, fitness)| fitness.is_feasible())
        .min_by(|(_, a), (_, b)| {
            a.cost
                .partial_cmp(&b.cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(index, _)| index);
    if let Some(index) = cheapest_feasible {
        if !selected.contains(&index) {
            let last = selected.len() - 1;
            selected[last] = index;
        }
    }

    combined.subset(&selected)
}
