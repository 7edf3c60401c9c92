use crate::models::candidate::{DietCandidate, Fitness};
use crate::models::problem::Problem;
use crate::models::ranking::{FrontMember, ParetoFront};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One generation's candidate arena with its fitness values, owned by a
/// single optimizer run. A candidate's identity is its slot; the arena is
/// replaced wholesale at each generation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    members: Vec<DietCandidate>,
    fitnesses: Vec<Fitness>,
}

impl Population {
    /// Evaluates all candidates against the problem, in parallel. Evaluation
    /// is pure and order-preserving, so results are deterministic regardless
    /// of worker count.
    pub(crate) fn evaluate(problem: &Problem, members: Vec<DietCandidate>) -> Self {
        let fitnesses = members
            .par_iter()
            .map(|candidate| candidate.evaluate(problem))
            .collect();

        Self { members, fitnesses }
    }

    /// Reassembles an arena from members and their already-known fitnesses.
    /// Both vectors must be aligned by slot.
    pub(crate) fn from_parts(members: Vec<DietCandidate>, fitnesses: Vec<Fitness>) -> Self {
        debug_assert_eq!(members.len(), fitnesses.len());
        Self { members, fitnesses }
    }

    /// Clones the given slots into a new arena.
    pub(crate) fn subset(&self, indices: &[usize]) -> Self {
        Self {
            members: indices.iter().map(|&i| self.members[i].clone()).collect(),
            fitnesses: indices.iter().map(|&i| self.fitnesses[i]).collect(),
        }
    }

    /// Consumes the arena into its parts.
    pub(crate) fn into_parts(self) -> (Vec<DietCandidate>, Vec<Fitness>) {
        (self.members, self.fitnesses)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[DietCandidate] {
        &self.members
    }

    pub fn fitnesses(&self) -> &[Fitness] {
        &self.fitnesses
    }

    pub fn get(&self, index: usize) -> (&DietCandidate, &Fitness) {
        (&self.members[index], &self.fitnesses[index])
    }

    /// Cost of the cheapest fully feasible member, if any.
    pub fn best_feasible_cost(&self) -> Option<f64> {
        self.fitnesses
            .iter()
            .filter(|fitness| fitness.is_feasible())
            .map(|fitness| fitness.cost)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Clones the given arena slots into a Pareto front.
    pub(crate) fn extract_front(&self, indices: &[usize]) -> ParetoFront {
        ParetoFront::new(
            indices
                .iter()
                .map(|&i| FrontMember {
                    diet: self.members[i].clone(),
                    fitness: self.fitnesses[i],
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feed::{FeedCategory, FeedItem};
    use crate::models::nutrient::{Nutrient, NutrientVector};
    use crate::models::problem::{IntakeRange, ProblemOptions};
    use crate::models::requirements::{Requirement, RequirementSet};

    fn test_problem() -> Problem {
        let requirements = RequirementSet::new(10.0)
            .with_target(Nutrient::NetEnergyLactation, Requirement::at_least(10.0));
        let feeds = vec![FeedItem::new(
            "hay",
            "Grass hay",
            FeedCategory::Forage,
            NutrientVector::new().with(Nutrient::NetEnergyLactation, 1.0),
            0.2,
        )];
        let options = ProblemOptions {
            intake_range: Some(IntakeRange {
                min_kg: 0.0,
                max_kg: 50.0,
            }),
            ..ProblemOptions::default()
        };
        Problem::build(requirements, feeds, &options).unwrap()
    }

    #[test]
    fn it_evaluates_members_in_slot_order() {
        let problem = test_problem();
        let members = vec![
            DietCandidate::new(vec![10.0]),
            DietCandidate::new(vec![5.0]),
        ];

        let population = Population::evaluate(&problem, members);

        assert_eq!(population.len(), 2);
        assert!(population.fitnesses()[0].is_feasible());
        assert!(!population.fitnesses()[1].is_feasible());
    }

    #[test]
    fn it_finds_the_cheapest_feasible_member() {
        let problem = test_problem();
        let members = vec![
            DietCandidate::new(vec![12.0]), // feasible, cost 2.4
            DietCandidate::new(vec![10.0]), // feasible, cost 2.0
            DietCandidate::new(vec![2.0]),  // infeasible, cheapest overall
        ];

        let population = Population::evaluate(&problem, members);

        assert_eq!(population.best_feasible_cost(), Some(2.0));
    }

    #[test]
    fn it_reports_no_feasible_cost_when_all_fall_short() {
        let problem = test_problem();
        let population = Population::evaluate(&problem, vec![DietCandidate::new(vec![1.0])]);

        assert_eq!(population.best_feasible_cost(), None);
    }
}
