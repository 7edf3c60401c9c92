use crate::models::{FeedId, Fitness, NutrientDeficit, StopReason};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a recommended diet: a feed and its daily amount, kg DM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietEntry {
    pub feed: FeedId,
    pub amount_kg: f64,
}

/// An alternative Pareto-front member offered next to the recommendation
/// for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub diet: Vec<DietEntry>,
    pub fitness: Fitness,
    pub feasible: bool,
}

/// The chosen diet with everything the caller needs to judge it: cost and
/// deviation, feasibility, remaining deficits when infeasible, how the
/// search ended, and a few alternative compromises from the front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub diet: Vec<DietEntry>,
    pub fitness: Fitness,
    pub feasible: bool,
    /// Nutrients still below their minimum; empty when `feasible`.
    pub deficits: Vec<NutrientDeficit>,
    pub stop_reason: StopReason,
    pub generations: u32,
    pub evaluations: u64,
    pub alternatives: Vec<Alternative>,
    /// Caller correlation payload, echoed untouched.
    pub data: Option<serde_json::Value>,
}
