//! Picks the single recommended diet out of a Pareto front.
//!
//! The front trades cost against constraint deviation; the policy decides
//! which compromise the caller actually receives. The exact weighting is
//! deliberately configurable; different deployments weigh near-feasibility
//! against cost differently.

use crate::models::ranking::{FrontMember, ParetoFront};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Strategy for choosing the recommended member of a front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecommendationPolicy {
    /// Prefer any fully feasible member, cheapest first. When nothing is
    /// feasible, fall back to a weighted compromise with cost weight 1.0.
    /// `deviation_weight` should be large enough that a near-feasible diet
    /// always beats a cheap but grossly deficient one.
    FeasibleFirst { deviation_weight: f64 },
    /// Always score members by normalized weighted sum, feasible or not.
    WeightedSum {
        cost_weight: f64,
        deviation_weight: f64,
    },
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self::FeasibleFirst {
            deviation_weight: 10.0,
        }
    }
}

/// Normalizes a value into [0, 1] over the front's observed range.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 0.0;
    }
    (value - min) / span
}

fn weighted_choice<'a>(
    front: &'a ParetoFront,
    cost_weight: f64,
    deviation_weight: f64,
) -> Option<&'a FrontMember> {
    let costs: Vec<f64> = front.members().iter().map(|m| m.fitness.cost).collect();
    let deviations: Vec<f64> = front
        .members()
        .iter()
        .map(|m| m.fitness.deviation)
        .collect();
    let cost_min = costs.iter().cloned().fold(f64::INFINITY, f64::min);
    let cost_max = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let dev_min = deviations.iter().cloned().fold(f64::INFINITY, f64::min);
    let dev_max = deviations.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    front.members().iter().min_by(|a, b| {
        let score_a = cost_weight * normalize(a.fitness.cost, cost_min, cost_max)
            + deviation_weight * normalize(a.fitness.deviation, dev_min, dev_max);
        let score_b = cost_weight * normalize(b.fitness.cost, cost_min, cost_max)
            + deviation_weight * normalize(b.fitness.deviation, dev_min, dev_max);
        score_a
            .partial_cmp(&score_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            // Simpler diets win ties.
            .then_with(|| a.diet.feed_count().cmp(&b.diet.feed_count()))
    })
}

fn cheapest_feasible(front: &ParetoFront) -> Option<&FrontMember> {
    front
        .members()
        .iter()
        .filter(|member| member.fitness.is_feasible())
        .min_by(|a, b| {
            a.fitness
                .cost
                .partial_cmp(&b.fitness.cost)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.diet.feed_count().cmp(&b.diet.feed_count()))
        })
}

impl RecommendationPolicy {
    /// Picks the recommended member. `None` only for an empty front.
    #[instrument(level = "debug", skip(self, front), fields(policy = ?self, front_size = front.len()))]
    pub fn select<'a>(&self, front: &'a ParetoFront) -> Option<&'a FrontMember> {
        if front.is_empty() {
            return None;
        }

        match self {
            Self::FeasibleFirst { deviation_weight } => cheapest_feasible(front)
                .or_else(|| weighted_choice(front, 1.0, *deviation_weight)),
            Self::WeightedSum {
                cost_weight,
                deviation_weight,
            } => weighted_choice(front, *cost_weight, *deviation_weight),
        }
    }
}
