//! Non-domination ranking and crowding distance.
//!
//! The search minimizes two objectives at once, diet cost and constraint
//! deviation, so candidates are ordered the NSGA-II way: by Pareto rank
//! first, then by crowding distance within a rank to keep the front spread
//! out instead of clustering around one compromise.
//!
//! # Domination
//!
//! Candidate A dominates candidate B when A's cost ≤ B's cost and A's
//! deviation ≤ B's deviation, with at least one strict inequality. Rank 0
//! is the non-dominated front of the current generation.
//!
//! # Crowding distance
//!
//! Within a rank, each candidate is scored by the size of the cuboid spanned
//! by its objective-space neighbors, normalized per objective. Boundary
//! candidates get infinite distance so the extremes of the front always
//! survive. Larger distance wins ties, the conventional NSGA-II tie-break.

use crate::models::candidate::{DietCandidate, Fitness};
use serde::{Deserialize, Serialize};

/// True when `a` is at least as good on both objectives and strictly better
/// on one.
pub(crate) fn dominates(a: &Fitness, b: &Fitness) -> bool {
    let no_worse = a.cost <= b.cost && a.deviation <= b.deviation;
    let strictly_better = a.cost < b.cost || a.deviation < b.deviation;
    no_worse && strictly_better
}

/// Per-candidate rank and crowding distance for one arena of fitnesses.
#[derive(Debug)]
pub(crate) struct Ranking {
    rank: Vec<usize>,
    crowding: Vec<f64>,
    fronts: Vec<Vec<usize>>,
}

impl Ranking {
    pub(crate) fn rank_of(&self, index: usize) -> usize {
        self.rank[index]
    }

    pub(crate) fn crowding_of(&self, index: usize) -> f64 {
        self.crowding[index]
    }

    /// The non-dominated indices of the arena.
    pub(crate) fn first_front(&self) -> &[usize] {
        &self.fronts[0]
    }

    pub(crate) fn fronts(&self) -> &[Vec<usize>] {
        &self.fronts
    }

    /// Crowded-comparison operator: lower rank wins, equal ranks prefer the
    /// less crowded candidate.
    pub(crate) fn is_better(&self, lhs: usize, rhs: usize) -> bool {
        match self.rank_of(lhs).cmp(&self.rank_of(rhs)) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => self.crowding_of(lhs) > self.crowding_of(rhs),
        }
    }
}

/// Fast non-dominated sort (Deb et al.) over the whole arena, followed by
/// per-front crowding distances.
pub(crate) fn rank_candidates(fitnesses: &[Fitness]) -> Ranking {
    let n = fitnesses.len();
    let mut domination_counts = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut first_front = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&fitnesses[i], &fitnesses[j]) {
                dominated[i].push(j);
                domination_counts[j] += 1;
            } else if dominates(&fitnesses[j], &fitnesses[i]) {
                dominated[j].push(i);
                domination_counts[i] += 1;
            }
        }
    }
    for (i, &count) in domination_counts.iter().enumerate() {
        if count == 0 {
            first_front.push(i);
        }
    }
    fronts.push(first_front);

    // Peel fronts: removing a front decrements the domination count of
    // everything it dominates.
    let mut current = 0;
    while current < fronts.len() && !fronts[current].is_empty() {
        let mut next_front = Vec::new();
        for &i in &fronts[current] {
            for &j in &dominated[i] {
                domination_counts[j] -= 1;
                if domination_counts[j] == 0 {
                    next_front.push(j);
                }
            }
        }
        if next_front.is_empty() {
            break;
        }
        fronts.push(next_front);
        current += 1;
    }

    let mut rank = vec![0usize; n];
    for (front_idx, front) in fronts.iter().enumerate() {
        for &i in front {
            rank[i] = front_idx;
        }
    }

    let mut crowding = vec![0.0f64; n];
    for front in &fronts {
        assign_crowding_distances(front, fitnesses, &mut crowding);
    }

    Ranking {
        rank,
        crowding,
        fronts,
    }
}

fn assign_crowding_distances(front: &[usize], fitnesses: &[Fitness], crowding: &mut [f64]) {
    if front.len() <= 2 {
        for &i in front {
            crowding[i] = f64::INFINITY;
        }
        return;
    }

    let objectives: [fn(&Fitness) -> f64; 2] = [|f| f.cost, |f| f.deviation];
    for objective in objectives {
        let mut sorted: Vec<usize> = front.to_vec();
        sorted.sort_by(|&a, &b| {
            objective(&fitnesses[a])
                .partial_cmp(&objective(&fitnesses[b]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let min = objective(&fitnesses[sorted[0]]);
        let max = objective(&fitnesses[sorted[sorted.len() - 1]]);
        let span = max - min;

        crowding[sorted[0]] = f64::INFINITY;
        crowding[sorted[sorted.len() - 1]] = f64::INFINITY;

        if span <= 0.0 {
            continue; // All equal on this objective; no interior spread.
        }
        for window in sorted.windows(3) {
            let (prev, mid, next) = (window[0], window[1], window[2]);
            crowding[mid] +=
                (objective(&fitnesses[next]) - objective(&fitnesses[prev])) / span;
        }
    }
}

/// One member of the non-dominated front, carrying its diet and objectives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMember {
    pub diet: DietCandidate,
    pub fitness: Fitness,
}

/// The non-dominated subset of a generation, sorted by cost ascending.
/// Recomputed each generation; never shared across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoFront {
    members: Vec<FrontMember>,
}

impl ParetoFront {
    pub(crate) fn new(mut members: Vec<FrontMember>) -> Self {
        members.sort_by(|a, b| {
            a.fitness
                .cost
                .partial_cmp(&b.fitness.cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { members }
    }

    pub fn members(&self) -> &[FrontMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Cheapest fully feasible member, if the front has one.
    pub fn best_feasible(&self) -> Option<&FrontMember> {
        self.members
            .iter()
            .find(|member| member.fitness.is_feasible())
    }

    /// Member with the smallest constraint deviation.
    pub fn most_compliant(&self) -> Option<&FrontMember> {
        self.members.iter().min_by(|a, b| {
            a.fitness
                .deviation
                .partial_cmp(&b.fitness.deviation)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitness(cost: f64, deviation: f64) -> Fitness {
        Fitness { cost, deviation }
    }

    #[test]
    fn it_detects_domination() {
        assert!(dominates(&fitness(1.0, 0.0), &fitness(2.0, 0.0)));
        assert!(dominates(&fitness(1.0, 0.0), &fitness(1.0, 0.5)));
        assert!(!dominates(&fitness(1.0, 0.5), &fitness(2.0, 0.0)));
        assert!(!dominates(&fitness(1.0, 0.0), &fitness(1.0, 0.0)));
    }

    #[test]
    fn it_ranks_fronts_by_non_domination() {
        let fitnesses = vec![
            fitness(1.0, 0.0), // rank 0
            fitness(2.0, 0.0), // dominated by [0]
            fitness(0.5, 0.5), // rank 0, trades cost for deviation
            fitness(3.0, 1.0), // dominated by everything
        ];

        let ranking = rank_candidates(&fitnesses);

        assert_eq!(ranking.rank_of(0), 0);
        assert_eq!(ranking.rank_of(2), 0);
        assert_eq!(ranking.rank_of(1), 1);
        assert_eq!(ranking.rank_of(3), 2);
        assert_eq!(ranking.first_front(), &[0, 2]);
    }

    #[test]
    fn it_gives_boundary_candidates_infinite_crowding() {
        let fitnesses = vec![
            fitness(1.0, 0.9),
            fitness(2.0, 0.5),
            fitness(3.0, 0.2),
            fitness(4.0, 0.0),
        ];

        let ranking = rank_candidates(&fitnesses);

        // All non-dominated; extremes are protected, the middle is finite.
        assert_eq!(ranking.first_front().len(), 4);
        assert!(ranking.crowding_of(0).is_infinite());
        assert!(ranking.crowding_of(3).is_infinite());
        assert!(ranking.crowding_of(1).is_finite());
        assert!(ranking.crowding_of(2).is_finite());
    }

    #[test]
    fn it_prefers_lower_rank_then_larger_crowding() {
        let fitnesses = vec![
            fitness(1.0, 0.9),
            fitness(2.0, 0.5),
            fitness(3.0, 0.2),
            fitness(4.0, 0.0),
            fitness(5.0, 1.0), // dominated
        ];

        let ranking = rank_candidates(&fitnesses);

        assert!(ranking.is_better(0, 4)); // rank 0 beats rank 1
        assert!(ranking.is_better(0, 1)); // equal rank, infinite crowding wins
    }

    #[test]
    fn it_sorts_the_front_by_cost() {
        let front = ParetoFront::new(vec![
            FrontMember {
                diet: DietCandidate::new(vec![2.0]),
                fitness: fitness(5.0, 0.0),
            },
            FrontMember {
                diet: DietCandidate::new(vec![1.0]),
                fitness: fitness(2.0, 0.3),
            },
        ]);

        assert_eq!(front.members()[0].fitness.cost, 2.0);
        assert_eq!(front.best_feasible().unwrap().fitness.cost, 5.0);
        assert_eq!(front.most_compliant().unwrap().fitness.deviation, 0.0);
    }
}
