//! Assesses a fixed, caller-supplied feed mix against requirement targets.
//!
//! No search happens here: supply is a straight sum of amount × composition,
//! compared nutrient by nutrient against the requirement bounds. The report
//! also carries a predicted-performance figure derived from the energy and
//! protein balance, with numeric guards surfaced as warnings instead of
//! failures.

use crate::models::candidate::FEASIBLE_EPS;
use crate::models::feed::{FeedCatalog, FeedId};
use crate::models::nutrient::Nutrient;
use crate::models::profile::{AnimalProfile, AnimalType};
use crate::models::requirements::{
    self, RequirementSet, CP_G_PER_KG_GAIN, NEL_MCAL_PER_KG_GAIN,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

/// Classification of one nutrient in a balance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NutrientStatus {
    Deficit,
    Adequate,
    Excess,
}

/// Supply versus requirement for one nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientBalance {
    pub nutrient: Nutrient,
    pub supplied: f64,
    pub required_min: f64,
    pub required_max: Option<f64>,
    /// Surplus over the minimum; negative in deficit.
    pub delta: f64,
    /// Supply as % of the minimum requirement. Absent when the minimum is
    /// zero (see report warnings).
    pub pct_of_requirement: Option<f64>,
    pub status: NutrientStatus,
}

/// Expected output change relative to the profile's production baseline,
/// from the energy and protein balance of the mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PerformancePrediction {
    /// Lactating animals: expected milk-yield change, kg/day.
    MilkYieldDelta { kg_per_day: f64 },
    /// Growing or dry animals: expected body-weight-gain change, kg/day.
    DailyGainDelta { kg_per_day: f64 },
}

/// Non-fatal numeric conditions met while computing a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputationWarning {
    /// Percent-of-requirement is undefined for a zero minimum.
    ZeroRequirementBaseline { nutrient: Nutrient },
    /// The performance model's per-unit divisors are all zero; no
    /// prediction was made.
    ZeroPerformanceBaseline,
}

impl std::fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroRequirementBaseline { nutrient } => {
                write!(f, "{nutrient} has a zero minimum; percent of requirement omitted")
            }
            Self::ZeroPerformanceBaseline => {
                write!(f, "performance baseline is zero; prediction omitted")
            }
        }
    }
}

/// Output of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub balances: Vec<NutrientBalance>,
    pub total_cost: f64,
    pub total_dm_kg: f64,
    pub predicted_performance: Option<PerformancePrediction>,
    pub warnings: Vec<ComputationWarning>,
    /// Caller correlation payload, echoed untouched.
    pub data: Option<serde_json::Value>,
}

impl BalanceReport {
    /// True when every nutrient is classified adequate.
    pub fn is_balanced(&self) -> bool {
        self.balances
            .iter()
            .all(|balance| balance.status == NutrientStatus::Adequate)
    }
}

/// Rejections for malformed mixes, raised before any computation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EvaluationError {
    #[error("mix references unknown feed: {id}")]
    UnknownFeed { id: FeedId },

    #[error("mix amount for {id} must be non-negative, got {amount}")]
    NegativeAmount { id: FeedId, amount: f64 },
}

// Tolerances are relative to the bound, mirroring the optimizer's
// normalized-deviation feasibility test: a diet the search calls feasible
// always evaluates as adequate.
fn classify(supplied: f64, minimum: f64, maximum: Option<f64>) -> NutrientStatus {
    if supplied < minimum - FEASIBLE_EPS * minimum.max(1.0) {
        return NutrientStatus::Deficit;
    }
    if let Some(maximum) = maximum {
        if supplied > maximum + FEASIBLE_EPS * maximum.max(1.0) {
            return NutrientStatus::Excess;
        }
    }
    NutrientStatus::Adequate
}

fn predict_performance(
    profile: &AnimalProfile,
    energy_balance: f64,
    protein_balance: f64,
    warnings: &mut Vec<ComputationWarning>,
) -> Option<PerformancePrediction> {
    // The tighter of the energy and protein margins limits output. Ratios
    // with a zero divisor carry no information and are skipped; if every
    // divisor is zero the prediction is withheld with a warning.
    let (per_unit, build): (Vec<(f64, f64)>, fn(f64) -> PerformancePrediction) =
        match (profile.animal_type, &profile.production) {
            (AnimalType::Lactating, Some(production)) => (
                vec![
                    (
                        energy_balance,
                        requirements::milk_nel_per_kg(production.fat_pct, production.protein_pct),
                    ),
                    (
                        protein_balance,
                        requirements::milk_cp_g_per_kg(production.protein_pct),
                    ),
                ],
                |kg| PerformancePrediction::MilkYieldDelta { kg_per_day: kg },
            ),
            _ => (
                vec![
                    (energy_balance, NEL_MCAL_PER_KG_GAIN),
                    (protein_balance, CP_G_PER_KG_GAIN),
                ],
                |kg| PerformancePrediction::DailyGainDelta { kg_per_day: kg },
            ),
        };

    let delta = per_unit
        .into_iter()
        .filter(|(_, divisor)| *divisor > 0.0)
        .map(|(balance, divisor)| balance / divisor)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    match delta {
        Some(kg) => Some(build(kg)),
        None => {
            warnings.push(ComputationWarning::ZeroPerformanceBaseline);
            None
        }
    }
}

/// Computes the balance report for an explicit mix. O(nutrients × feeds),
/// no randomness, no shared state.
#[instrument(level = "debug", skip(profile, requirements, mix, catalog), fields(mix_entries = mix.len(), catalog_size = catalog.len()))]
pub fn evaluate_mix(
    profile: &AnimalProfile,
    requirements: &RequirementSet,
    mix: &[(FeedId, f64)],
    catalog: &FeedCatalog,
) -> Result<BalanceReport, EvaluationError> {
    // Resolve and validate the whole mix before computing anything.
    let resolved = mix
        .iter()
        .map(|(id, amount)| {
            let feed = catalog
                .get(id)
                .ok_or_else(|| EvaluationError::UnknownFeed { id: id.clone() })?;
            if *amount < 0.0 {
                return Err(EvaluationError::NegativeAmount {
                    id: id.clone(),
                    amount: *amount,
                });
            }
            Ok((feed, *amount))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut warnings = Vec::new();
    let mut total_cost = 0.0;
    let mut total_dm = 0.0;
    for (feed, amount) in &resolved {
        total_cost += feed.cost_per_kg * amount;
        total_dm += amount;
    }

    let mut balances = Vec::with_capacity(requirements.len());
    for (nutrient, requirement) in requirements.iter() {
        let supplied: f64 = resolved
            .iter()
            .map(|(feed, amount)| feed.supply(nutrient, *amount))
            .sum();

        let pct_of_requirement = if requirement.minimum > 0.0 {
            Some(supplied / requirement.minimum * 100.0)
        } else {
            warnings.push(ComputationWarning::ZeroRequirementBaseline { nutrient });
            None
        };

        balances.push(NutrientBalance {
            nutrient,
            supplied,
            required_min: requirement.minimum,
            required_max: requirement.maximum,
            delta: supplied - requirement.minimum,
            pct_of_requirement,
            status: classify(supplied, requirement.minimum, requirement.maximum),
        });
    }

    let energy_balance = balances
        .iter()
        .find(|b| b.nutrient == Nutrient::NetEnergyLactation)
        .map(|b| b.delta)
        .unwrap_or(0.0);
    let protein_balance = balances
        .iter()
        .find(|b| b.nutrient == Nutrient::CrudeProtein)
        .map(|b| b.delta)
        .unwrap_or(0.0);
    let predicted_performance =
        predict_performance(profile, energy_balance, protein_balance, &mut warnings);

    Ok(BalanceReport {
        id: Uuid::now_v7(),
        generated_at: Utc::now(),
        balances,
        total_cost,
        total_dm_kg: total_dm,
        predicted_performance,
        warnings,
        data: None,
    })
}
