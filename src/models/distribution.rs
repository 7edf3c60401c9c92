use crate::models::candidate::DietCandidate;
use crate::models::problem::Problem;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the initial population is spread across the inclusion bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Distribution {
    #[default]
    LatinHypercube,
    Random,
}

impl Distribution {
    pub(crate) fn distribute<R: Rng>(
        &self,
        rng: &mut R,
        problem: &Problem,
        n_samples: usize,
    ) -> Vec<DietCandidate> {
        match self {
            Distribution::LatinHypercube => latin_hypercube(rng, problem, n_samples),
            Distribution::Random => random_distribution(rng, problem, n_samples),
        }
    }
}

fn random_distribution<R: Rng>(
    rng: &mut R,
    problem: &Problem,
    n_samples: usize,
) -> Vec<DietCandidate> {
    let mut candidates = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let amounts = problem
            .bounds()
            .iter()
            .map(|bound| {
                if bound.span() > 0.0 {
                    rng.random_range(bound.lower..=bound.upper)
                } else {
                    bound.lower
                }
            })
            .collect();
        candidates.push(DietCandidate::new(amounts));
    }

    candidates
}

fn latin_hypercube<R: Rng>(rng: &mut R, problem: &Problem, n_samples: usize) -> Vec<DietCandidate> {
    use rand::seq::SliceRandom;

    let n_dimensions = problem.dimension();
    let mut amounts = vec![Vec::with_capacity(n_dimensions); n_samples];

    // For each dimension, sample one point per interval and shuffle the
    // intervals to decorrelate dimensions.
    for bound in problem.bounds() {
        let mut intervals: Vec<f64> = (0..n_samples)
            .map(|i| (i as f64 + 0.5) / n_samples as f64) // Center of each interval
            .collect();
        intervals.shuffle(rng);

        for (sample_idx, interval) in intervals.iter().enumerate() {
            amounts[sample_idx].push(bound.lower + interval * bound.span());
        }
    }

    amounts.into_iter().map(DietCandidate::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feed::{FeedCategory, FeedItem};
    use crate::models::nutrient::NutrientVector;
    use crate::models::problem::ProblemOptions;
    use crate::models::requirements::RequirementSet;
    use rand::{SeedableRng, rngs::StdRng};

    fn test_problem() -> Problem {
        let feeds = vec![
            FeedItem::new(
                "silage",
                "Corn silage",
                FeedCategory::Forage,
                NutrientVector::new(),
                0.13,
            )
            .with_inclusion_bounds(0.0, 12.0),
            FeedItem::new(
                "grain",
                "Corn grain",
                FeedCategory::Concentrate,
                NutrientVector::new(),
                0.25,
            )
            .with_inclusion_bounds(1.0, 8.0),
        ];
        Problem::build(RequirementSet::new(20.0), feeds, &ProblemOptions::default()).unwrap()
    }

    #[test]
    fn it_spreads_latin_hypercube_samples_across_intervals() {
        let mut rng = StdRng::seed_from_u64(7);
        let problem = test_problem();

        let candidates = Distribution::LatinHypercube.distribute(&mut rng, &problem, 4);
        assert_eq!(candidates.len(), 4);

        // Each dimension holds exactly one sample per quartile of its span.
        for dim in 0..problem.dimension() {
            let bound = problem.bounds()[dim];
            let mut quartiles: Vec<usize> = candidates
                .iter()
                .map(|c| {
                    let normalized = (c.amounts()[dim] - bound.lower) / bound.span();
                    (normalized * 4.0).floor().min(3.0) as usize
                })
                .collect();
            quartiles.sort();
            assert_eq!(quartiles, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn it_samples_random_candidates_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let problem = test_problem();

        let candidates = Distribution::Random.distribute(&mut rng, &problem, 20);
        assert_eq!(candidates.len(), 20);

        for candidate in &candidates {
            for (amount, bound) in candidate.amounts().iter().zip(problem.bounds()) {
                assert!(*amount >= bound.lower && *amount <= bound.upper);
            }
        }
    }

    #[test]
    fn it_is_deterministic_under_a_fixed_seed() {
        let problem = test_problem();

        let mut first_rng = StdRng::seed_from_u64(11);
        let mut second_rng = StdRng::seed_from_u64(11);

        let first = Distribution::LatinHypercube.distribute(&mut first_rng, &problem, 8);
        let second = Distribution::LatinHypercube.distribute(&mut second_rng, &problem, 8);

        assert_eq!(first, second);
    }
}
