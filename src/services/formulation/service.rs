use super::Error;
use super::models::{Alternative, DietEntry, Recommendation};
use crate::models::{
    AMOUNT_EPS, AnimalProfile, BalanceReport, FeedCatalog, FeedId, FeedItem, FrontMember,
    ParetoFront, Problem, ProblemOptions, RecommendationPolicy, compute_requirements, evaluate_mix,
};
use crate::services::search::{Optimizer, SearchParams};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::instrument;
use uuid::Uuid;

/// Per-request knobs for [`Service::recommend`].
#[derive(Debug, Default)]
pub struct RecommendOptions {
    /// Overrides the service's default search parameters for this run.
    pub search: Option<SearchParams>,
    pub problem: ProblemOptions,
    /// Cooperative cancellation flag, checked at generation boundaries.
    pub cancel: Option<Arc<AtomicBool>>,
    /// Caller correlation payload, echoed on the recommendation.
    pub data: Option<serde_json::Value>,
}

/// Per-request knobs for [`Service::evaluate`].
#[derive(Debug, Default)]
pub struct EvaluateOptions {
    /// Caller correlation payload, echoed on the report.
    pub data: Option<serde_json::Value>,
}

/// The formulation service: wires the requirement model, constraint
/// builder, optimizer and recommendation policy into the two request
/// contracts, recommend and evaluate. Stateless per invocation; a single
/// instance serves concurrent callers.
pub struct Service {
    policy: RecommendationPolicy,
    search: SearchParams,
    max_alternatives: usize,
}

pub struct ServiceBuilder {
    policy: RecommendationPolicy,
    search: SearchParams,
    max_alternatives: usize,
}

impl ServiceBuilder {
    pub fn with_policy(mut self, policy: RecommendationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Default search parameters used when a request doesn't bring its own.
    pub fn with_search_defaults(mut self, search: SearchParams) -> Self {
        self.search = search;
        self
    }

    /// How many alternative front members a recommendation carries.
    pub fn with_max_alternatives(mut self, max_alternatives: usize) -> Self {
        self.max_alternatives = max_alternatives;
        self
    }

    pub fn build(self) -> Service {
        Service {
            policy: self.policy,
            search: self.search,
            max_alternatives: self.max_alternatives,
        }
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Service {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder {
            policy: RecommendationPolicy::default(),
            search: SearchParams::default(),
            max_alternatives: 3,
        }
    }

    /// Computes a least-cost diet recommendation for the profile over the
    /// supplied catalogue snapshot.
    ///
    /// Infeasibility is a result state: when no diet satisfies every
    /// minimum, the best compromise is returned with `feasible = false` and
    /// the list of nutrients still in deficit.
    #[instrument(level = "info", skip(self, profile, feeds, options), fields(animal_type = ?profile.animal_type, num_feeds = feeds.len()))]
    pub fn recommend(
        &self,
        profile: &AnimalProfile,
        feeds: Vec<FeedItem>,
        options: RecommendOptions,
    ) -> Result<Recommendation, Error> {
        tracing::info!("formulation request received");

        let requirements = compute_requirements(profile)?;
        let problem = Problem::build(requirements, feeds, &options.problem)?;

        let params = options.search.unwrap_or_else(|| self.search.clone());
        let optimizer = Optimizer::new(params)?;
        let outcome = optimizer.solve_with(&problem, options.cancel.as_deref(), |stats| {
            tracing::debug!(
                generation = stats.number,
                best_feasible_cost = ?stats.best_feasible_cost,
                front_size = stats.front_size,
                "generation evaluated"
            );
        })?;

        let chosen = self
            .policy
            .select(&outcome.front)
            .ok_or(Error::EmptyFront)?;
        let feasible = chosen.fitness.is_feasible();
        let deficits = if feasible {
            Vec::new()
        } else {
            chosen.diet.deficits(&problem)
        };

        tracing::info!(
            cost = chosen.fitness.cost,
            deviation = chosen.fitness.deviation,
            feasible,
            stop_reason = ?outcome.stop_reason,
            "recommendation selected"
        );

        Ok(Recommendation {
            id: Uuid::now_v7(),
            generated_at: Utc::now(),
            diet: diet_entries(&problem, chosen),
            fitness: chosen.fitness,
            feasible,
            deficits,
            stop_reason: outcome.stop_reason,
            generations: outcome.generations,
            evaluations: outcome.evaluations,
            alternatives: sample_alternatives(
                &problem,
                &outcome.front,
                chosen,
                self.max_alternatives,
            ),
            data: options.data,
        })
    }

    /// Assesses a fixed, caller-supplied mix against the profile's
    /// requirements. No search.
    #[instrument(level = "info", skip(self, profile, mix, feeds, options), fields(animal_type = ?profile.animal_type, mix_entries = mix.len()))]
    pub fn evaluate(
        &self,
        profile: &AnimalProfile,
        mix: &[(FeedId, f64)],
        feeds: Vec<FeedItem>,
        options: EvaluateOptions,
    ) -> Result<BalanceReport, Error> {
        tracing::info!("evaluation request received");

        let requirements = compute_requirements(profile)?;
        let catalog = FeedCatalog::new(feeds);
        let mut report = evaluate_mix(profile, &requirements, mix, &catalog)?;
        report.data = options.data;

        Ok(report)
    }
}

/// Materializes a candidate into feed/amount lines, dropping trace amounts.
fn diet_entries(problem: &Problem, member: &FrontMember) -> Vec<DietEntry> {
    problem
        .feeds()
        .iter()
        .zip(member.diet.amounts())
        .filter(|(_, &amount)| amount > AMOUNT_EPS)
        .map(|(feed, &amount)| DietEntry {
            feed: feed.id.clone(),
            amount_kg: amount,
        })
        .collect()
}

/// Picks up to `limit` members spread across the cost-sorted front, skipping
/// the chosen one.
fn sample_alternatives(
    problem: &Problem,
    front: &ParetoFront,
    chosen: &FrontMember,
    limit: usize,
) -> Vec<Alternative> {
    let others: Vec<&FrontMember> = front.members().iter().filter(|m| *m != chosen).collect();
    if others.is_empty() || limit == 0 {
        return Vec::new();
    }

    let take = limit.min(others.len());
    let step = (others.len() - 1).max(1) as f64 / (take.max(2) - 1) as f64;
    let mut picked: Vec<usize> = (0..take)
        .map(|i| ((i as f64 * step).round() as usize).min(others.len() - 1))
        .collect();
    picked.dedup();

    picked
        .into_iter()
        .map(|i| Alternative {
            diet: diet_entries(problem, others[i]),
            fitness: others[i].fitness,
            feasible: others[i].fitness.is_feasible(),
        })
        .collect()
}
