//! Combines requirement targets and a catalogue snapshot into the
//! optimization problem: decision-variable bounds per feed, a total-intake
//! range, an optional forage-share constraint and the targets themselves.

use crate::models::feed::{FeedCategory, FeedId, FeedItem};
use crate::models::nutrient::Nutrient;
use crate::models::requirements::RequirementSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::instrument;

/// Inclusion bounds of one decision variable, kg DM/day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InclusionBounds {
    pub lower: f64,
    pub upper: f64,
}

impl InclusionBounds {
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn clamp(&self, amount: f64) -> f64 {
        amount.clamp(self.lower, self.upper)
    }
}

/// Total dry-matter intake window, kg/day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntakeRange {
    pub min_kg: f64,
    pub max_kg: f64,
}

/// Forage share of total DM, % (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForageShare {
    pub min_pct: f64,
    pub max_pct: f64,
}

/// Knobs for [`Problem::build`] beyond what the catalogue carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProblemOptions {
    /// Ceiling applied to feeds without an explicit maximum inclusion.
    /// Defaults to 110% of the estimated intake: no single feed can exceed
    /// the whole diet.
    pub per_feed_ceiling_kg: Option<f64>,
    /// Overrides the intake window derived from the requirement model's
    /// estimate (±10% by default).
    pub intake_range: Option<IntakeRange>,
    pub forage_share: Option<ForageShare>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProblemError {
    #[error("no feeds were supplied")]
    EmptyCatalog,

    #[error("all supplied feeds are flagged unavailable")]
    NoAvailableFeeds,

    #[error("duplicate feed id: {id}")]
    DuplicateFeed { id: FeedId },

    #[error("feed {id}: minimum inclusion {min_kg} exceeds maximum {max_kg}")]
    DegenerateBounds { id: FeedId, min_kg: f64, max_kg: f64 },

    #[error("feed {id}: negative {nutrient} composition {value}")]
    InvalidComposition {
        id: FeedId,
        nutrient: Nutrient,
        value: f64,
    },

    #[error("feed {id}: negative cost {cost}")]
    NegativeCost { id: FeedId, cost: f64 },

    #[error("intake range is degenerate: min {min_kg}, max {max_kg}")]
    InvalidIntakeRange { min_kg: f64, max_kg: f64 },

    #[error("forage share range is invalid: min {min_pct}, max {max_pct}")]
    InvalidForageShare { min_pct: f64, max_pct: f64 },
}

/// A fully validated optimization problem. Owns the per-run feed snapshot;
/// candidates refer to feeds by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    feeds: Vec<FeedItem>,
    bounds: Vec<InclusionBounds>,
    intake: IntakeRange,
    forage_share: Option<ForageShare>,
    requirements: RequirementSet,
}

impl Problem {
    /// Builds the problem from targets and a catalogue snapshot.
    ///
    /// Unavailable feeds are dropped; every remaining feed gets a resolved
    /// upper bound. All validation failures are reported before any search
    /// starts.
    #[instrument(level = "debug", skip(requirements, feeds, options), fields(num_feeds = feeds.len()))]
    pub fn build(
        requirements: RequirementSet,
        feeds: Vec<FeedItem>,
        options: &ProblemOptions,
    ) -> Result<Self, ProblemError> {
        if feeds.is_empty() {
            return Err(ProblemError::EmptyCatalog);
        }

        let mut seen = BTreeSet::new();
        for feed in &feeds {
            if !seen.insert(feed.id.clone()) {
                return Err(ProblemError::DuplicateFeed {
                    id: feed.id.clone(),
                });
            }
        }

        let feeds: Vec<FeedItem> = feeds.into_iter().filter(|feed| feed.available).collect();
        if feeds.is_empty() {
            return Err(ProblemError::NoAvailableFeeds);
        }

        let intake = match options.intake_range {
            Some(range) => range,
            None => IntakeRange {
                min_kg: requirements.dm_intake_kg() * 0.9,
                max_kg: requirements.dm_intake_kg() * 1.1,
            },
        };
        if intake.min_kg < 0.0 || intake.min_kg > intake.max_kg {
            return Err(ProblemError::InvalidIntakeRange {
                min_kg: intake.min_kg,
                max_kg: intake.max_kg,
            });
        }

        if let Some(share) = options.forage_share {
            let valid = (0.0..=100.0).contains(&share.min_pct)
                && (0.0..=100.0).contains(&share.max_pct)
                && share.min_pct <= share.max_pct;
            if !valid {
                return Err(ProblemError::InvalidForageShare {
                    min_pct: share.min_pct,
                    max_pct: share.max_pct,
                });
            }
        }

        let default_ceiling = options
            .per_feed_ceiling_kg
            .unwrap_or(intake.max_kg);

        let mut bounds = Vec::with_capacity(feeds.len());
        for feed in &feeds {
            for (nutrient, value) in feed.nutrients.iter() {
                if value < 0.0 {
                    return Err(ProblemError::InvalidComposition {
                        id: feed.id.clone(),
                        nutrient,
                        value,
                    });
                }
            }
            if feed.cost_per_kg < 0.0 {
                return Err(ProblemError::NegativeCost {
                    id: feed.id.clone(),
                    cost: feed.cost_per_kg,
                });
            }

            let upper = feed.max_inclusion_kg.unwrap_or(default_ceiling);
            if feed.min_inclusion_kg > upper {
                return Err(ProblemError::DegenerateBounds {
                    id: feed.id.clone(),
                    min_kg: feed.min_inclusion_kg,
                    max_kg: upper,
                });
            }
            bounds.push(InclusionBounds {
                lower: feed.min_inclusion_kg,
                upper,
            });
        }

        Ok(Self {
            feeds,
            bounds,
            intake,
            forage_share: options.forage_share,
            requirements,
        })
    }

    /// Number of decision variables.
    pub fn dimension(&self) -> usize {
        self.feeds.len()
    }

    pub fn feeds(&self) -> &[FeedItem] {
        &self.feeds
    }

    pub fn bounds(&self) -> &[InclusionBounds] {
        &self.bounds
    }

    pub fn intake(&self) -> IntakeRange {
        self.intake
    }

    pub fn forage_share(&self) -> Option<ForageShare> {
        self.forage_share
    }

    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    /// Total daily supply of one nutrient for the given amounts.
    pub(crate) fn supply(&self, amounts: &[f64], nutrient: Nutrient) -> f64 {
        self.feeds
            .iter()
            .zip(amounts)
            .map(|(feed, &amount)| feed.supply(nutrient, amount))
            .sum()
    }

    pub(crate) fn cost(&self, amounts: &[f64]) -> f64 {
        self.feeds
            .iter()
            .zip(amounts)
            .map(|(feed, &amount)| feed.cost_per_kg * amount)
            .sum()
    }

    /// Forage share of total DM, % (0–100). Zero-intake diets count as 0%.
    pub(crate) fn forage_fraction_pct(&self, amounts: &[f64]) -> f64 {
        let total: f64 = amounts.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        let forage: f64 = self
            .feeds
            .iter()
            .zip(amounts)
            .filter(|(feed, _)| feed.category == FeedCategory::Forage)
            .map(|(_, &amount)| amount)
            .sum();
        forage / total * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feed::FeedCategory;
    use crate::models::nutrient::NutrientVector;
    use crate::models::requirements::{Requirement, RequirementSet};

    fn test_requirements() -> RequirementSet {
        RequirementSet::new(20.0)
            .with_target(Nutrient::NetEnergyLactation, Requirement::at_least(27.0))
    }

    fn forage(id: &str) -> FeedItem {
        FeedItem::new(
            id,
            id,
            FeedCategory::Forage,
            NutrientVector::new().with(Nutrient::NetEnergyLactation, 1.4),
            0.15,
        )
    }

    #[test]
    fn it_rejects_an_empty_catalog() {
        let result = Problem::build(test_requirements(), vec![], &ProblemOptions::default());
        assert_eq!(result.unwrap_err(), ProblemError::EmptyCatalog);
    }

    #[test]
    fn it_rejects_all_unavailable_feeds() {
        let result = Problem::build(
            test_requirements(),
            vec![forage("silage").unavailable()],
            &ProblemOptions::default(),
        );
        assert_eq!(result.unwrap_err(), ProblemError::NoAvailableFeeds);
    }

    #[test]
    fn it_rejects_duplicate_feed_ids() {
        let result = Problem::build(
            test_requirements(),
            vec![forage("silage"), forage("silage")],
            &ProblemOptions::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            ProblemError::DuplicateFeed {
                id: FeedId::from("silage")
            }
        );
    }

    #[test]
    fn it_rejects_degenerate_inclusion_bounds() {
        let result = Problem::build(
            test_requirements(),
            vec![forage("silage").with_inclusion_bounds(5.0, 2.0)],
            &ProblemOptions::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            ProblemError::DegenerateBounds {
                id: FeedId::from("silage"),
                min_kg: 5.0,
                max_kg: 2.0,
            }
        );
    }

    #[test]
    fn it_applies_the_default_per_feed_ceiling() {
        let problem = Problem::build(
            test_requirements(),
            vec![forage("silage")],
            &ProblemOptions::default(),
        )
        .unwrap();

        // Intake window is 18–22 kg around the 20 kg estimate; the default
        // ceiling equals the window maximum.
        approx::assert_relative_eq!(problem.intake().min_kg, 18.0, max_relative = 1e-12);
        approx::assert_relative_eq!(problem.intake().max_kg, 22.0, max_relative = 1e-12);
        assert_eq!(problem.bounds()[0].upper, problem.intake().max_kg);
    }

    #[test]
    fn it_drops_unavailable_feeds() {
        let problem = Problem::build(
            test_requirements(),
            vec![forage("silage"), forage("straw").unavailable()],
            &ProblemOptions::default(),
        )
        .unwrap();

        assert_eq!(problem.dimension(), 1);
        assert_eq!(problem.feeds()[0].id, FeedId::from("silage"));
    }

    #[test]
    fn it_computes_forage_fraction() {
        let grain = FeedItem::new(
            "corn",
            "Corn grain",
            FeedCategory::Concentrate,
            NutrientVector::new(),
            0.25,
        );
        let problem = Problem::build(
            test_requirements(),
            vec![forage("silage"), grain],
            &ProblemOptions::default(),
        )
        .unwrap();

        assert_eq!(problem.forage_fraction_pct(&[6.0, 2.0]), 75.0);
        assert_eq!(problem.forage_fraction_pct(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn it_rejects_negative_composition() {
        let mut bad = forage("silage");
        bad.nutrients.set(Nutrient::CrudeProtein, -3.0);

        let result = Problem::build(test_requirements(), vec![bad], &ProblemOptions::default());
        assert_eq!(
            result.unwrap_err(),
            ProblemError::InvalidComposition {
                id: FeedId::from("silage"),
                nutrient: Nutrient::CrudeProtein,
                value: -3.0,
            }
        );
    }
}
