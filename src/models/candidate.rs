use crate::models::nutrient::Nutrient;
use crate::models::problem::Problem;
use serde::{Deserialize, Serialize};

/// Deviations below this are treated as fully feasible.
pub(crate) const FEASIBLE_EPS: f64 = 1e-9;

/// Inclusions below this don't count toward diet complexity.
pub(crate) const AMOUNT_EPS: f64 = 1e-6;

/// One point in the search space: kg DM per feed, indexed by the problem's
/// feed order. Candidates live in flat per-generation arenas and are
/// replaced wholesale, never mutated in place after evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietCandidate {
    amounts: Vec<f64>,
}

impl DietCandidate {
    pub(crate) fn new(amounts: Vec<f64>) -> Self {
        Self { amounts }
    }

    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }

    pub(crate) fn amounts_mut(&mut self) -> &mut Vec<f64> {
        &mut self.amounts
    }

    /// Number of feeds actually included.
    pub fn feed_count(&self) -> usize {
        self.amounts.iter().filter(|&&a| a > AMOUNT_EPS).count()
    }

    pub fn total_dm_kg(&self) -> f64 {
        self.amounts.iter().sum()
    }

    /// Clamps every amount into its feed's inclusion bounds. Applied after
    /// crossover and mutation so offspring always respect the problem.
    pub(crate) fn clamp_to(&mut self, problem: &Problem) {
        for (amount, bounds) in self.amounts.iter_mut().zip(problem.bounds()) {
            *amount = bounds.clamp(*amount);
        }
    }

    /// Cost and constraint deviation of this candidate against the problem.
    pub fn evaluate(&self, problem: &Problem) -> Fitness {
        let cost = problem.cost(&self.amounts);

        let mut deviation = 0.0;
        for (nutrient, requirement) in problem.requirements().iter() {
            let supplied = problem.supply(&self.amounts, nutrient);
            if requirement.minimum > 0.0 {
                deviation += requirement.shortfall(supplied) / requirement.minimum;
            }
            if let Some(maximum) = requirement.maximum {
                if maximum > 0.0 {
                    deviation += requirement.overage(supplied) / maximum;
                }
            }
        }

        let intake = problem.intake();
        let total = self.total_dm_kg();
        if intake.min_kg > 0.0 && total < intake.min_kg {
            deviation += (intake.min_kg - total) / intake.min_kg;
        }
        if intake.max_kg > 0.0 && total > intake.max_kg {
            deviation += (total - intake.max_kg) / intake.max_kg;
        }

        if let Some(share) = problem.forage_share() {
            let fraction = problem.forage_fraction_pct(&self.amounts);
            if fraction < share.min_pct {
                deviation += (share.min_pct - fraction) / 100.0;
            } else if fraction > share.max_pct {
                deviation += (fraction - share.max_pct) / 100.0;
            }
        }

        Fitness { cost, deviation }
    }

    /// Nutrients still below their minimum, with the shortfall magnitude.
    /// Empty for feasible candidates.
    pub fn deficits(&self, problem: &Problem) -> Vec<NutrientDeficit> {
        problem
            .requirements()
            .iter()
            .filter_map(|(nutrient, requirement)| {
                let supplied = problem.supply(&self.amounts, nutrient);
                let shortfall = requirement.shortfall(supplied);
                (shortfall > FEASIBLE_EPS).then(|| NutrientDeficit {
                    nutrient,
                    required_min: requirement.minimum,
                    supplied,
                    shortfall,
                })
            })
            .collect()
    }
}

/// Objectives of one candidate: both are minimized. Derived from a candidate
/// and a problem, never stored independently of its generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// Total diet cost, Σ amount × feed cost.
    pub cost: f64,
    /// Sum of normalized constraint violations; zero means fully feasible.
    pub deviation: f64,
}

impl Fitness {
    pub fn is_feasible(&self) -> bool {
        self.deviation <= FEASIBLE_EPS
    }
}

/// One unmet minimum, reported when no fully feasible diet exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientDeficit {
    pub nutrient: Nutrient,
    pub required_min: f64,
    pub supplied: f64,
    pub shortfall: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feed::{FeedCategory, FeedItem};
    use crate::models::nutrient::NutrientVector;
    use crate::models::problem::{IntakeRange, ProblemOptions};
    use crate::models::requirements::{Requirement, RequirementSet};
    use approx::assert_relative_eq;

    fn test_problem() -> Problem {
        let requirements = RequirementSet::new(10.0)
            .with_target(Nutrient::NetEnergyLactation, Requirement::at_least(20.0))
            .with_target(Nutrient::CrudeProtein, Requirement::between(1000.0, 3000.0));
        let feeds = vec![
            FeedItem::new(
                "hay",
                "Grass hay",
                FeedCategory::Forage,
                NutrientVector::new()
                    .with(Nutrient::NetEnergyLactation, 1.3)
                    .with(Nutrient::CrudeProtein, 12.0),
                0.18,
            ),
            FeedItem::new(
                "meal",
                "Soybean meal",
                FeedCategory::Concentrate,
                NutrientVector::new()
                    .with(Nutrient::NetEnergyLactation, 2.0)
                    .with(Nutrient::CrudeProtein, 50.0),
                0.40,
            ),
        ];
        let options = ProblemOptions {
            intake_range: Some(IntakeRange {
                min_kg: 0.0,
                max_kg: 30.0,
            }),
            ..ProblemOptions::default()
        };
        Problem::build(requirements, feeds, &options).unwrap()
    }

    #[test]
    fn it_scores_a_feasible_candidate_with_zero_deviation() {
        let problem = test_problem();
        // 10 kg hay + 5 kg meal: 23 Mcal, 3700 g CP, over the 3000 g cap.
        // 10 kg hay + 2 kg meal: 17 Mcal, short on energy.
        // 12 kg hay + 3 kg meal: 21.6 Mcal, 2940 g CP, feasible.
        let candidate = DietCandidate::new(vec![12.0, 3.0]);
        let fitness = candidate.evaluate(&problem);

        assert!(fitness.is_feasible());
        assert_relative_eq!(fitness.cost, 12.0 * 0.18 + 3.0 * 0.40, max_relative = 1e-12);
    }

    #[test]
    fn it_penalizes_shortfall_proportionally() {
        let problem = test_problem();
        // Half the required energy, CP within bounds.
        let candidate = DietCandidate::new(vec![5.0, 1.75]);
        let supplied_energy = 5.0 * 1.3 + 1.75 * 2.0; // 10.0

        let fitness = candidate.evaluate(&problem);
        assert!(!fitness.is_feasible());
        assert_relative_eq!(
            fitness.deviation,
            (20.0 - supplied_energy) / 20.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn it_penalizes_maximum_overage() {
        let problem = test_problem();
        // 20 kg meal: 10,000 g CP against a 3000 g cap.
        let candidate = DietCandidate::new(vec![0.0, 20.0]);

        let fitness = candidate.evaluate(&problem);
        assert!(!fitness.is_feasible());
        assert!(fitness.deviation > 2.0);
    }

    #[test]
    fn it_penalizes_forage_share_outside_the_window() {
        use crate::models::problem::ForageShare;

        let requirements = RequirementSet::new(10.0);
        let feeds = vec![
            FeedItem::new("hay", "Grass hay", FeedCategory::Forage, NutrientVector::new(), 0.18),
            FeedItem::new(
                "meal",
                "Soybean meal",
                FeedCategory::Concentrate,
                NutrientVector::new(),
                0.40,
            ),
        ];
        let options = ProblemOptions {
            intake_range: Some(IntakeRange {
                min_kg: 0.0,
                max_kg: 30.0,
            }),
            forage_share: Some(ForageShare {
                min_pct: 40.0,
                max_pct: 70.0,
            }),
            ..ProblemOptions::default()
        };
        let problem = Problem::build(requirements, feeds, &options).unwrap();

        // 50% forage sits inside the window.
        let balanced = DietCandidate::new(vec![5.0, 5.0]);
        assert!(balanced.evaluate(&problem).is_feasible());

        // 25% forage misses the 40% floor by 15 points.
        let grain_heavy = DietCandidate::new(vec![2.5, 7.5]);
        let fitness = grain_heavy.evaluate(&problem);
        assert!(!fitness.is_feasible());
        assert_relative_eq!(fitness.deviation, 0.15, max_relative = 1e-9);
    }

    #[test]
    fn it_lists_every_unmet_nutrient() {
        let problem = test_problem();
        let candidate = DietCandidate::new(vec![0.0, 0.0]);

        let deficits = candidate.deficits(&problem);
        let named: Vec<Nutrient> = deficits.iter().map(|d| d.nutrient).collect();
        assert_eq!(
            named,
            vec![Nutrient::NetEnergyLactation, Nutrient::CrudeProtein]
        );
        assert_relative_eq!(deficits[0].shortfall, 20.0, max_relative = 1e-12);
    }

    #[test]
    fn it_counts_only_material_inclusions() {
        let candidate = DietCandidate::new(vec![5.0, 0.0, 1e-9]);
        assert_eq!(candidate.feed_count(), 1);
    }

    #[test]
    fn it_clamps_into_problem_bounds() {
        let problem = test_problem();
        let mut candidate = DietCandidate::new(vec![-2.0, 99.0]);
        candidate.clamp_to(&problem);

        assert_eq!(candidate.amounts()[0], 0.0);
        assert_eq!(candidate.amounts()[1], problem.bounds()[1].upper);
    }
}
