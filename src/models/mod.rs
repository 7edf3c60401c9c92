mod balance;
mod candidate;
mod crossover;
mod distribution;
mod feed;
mod mutagen;
mod nutrient;
mod policy;
mod population;
mod problem;
mod profile;
mod ranking;
mod requirements;
mod schedule;
mod selector;

pub use balance::{
    BalanceReport, ComputationWarning, EvaluationError, NutrientBalance, NutrientStatus,
    PerformancePrediction, evaluate_mix,
};
pub use candidate::{DietCandidate, Fitness, NutrientDeficit};
pub use crossover::{AlphaOutOfRangeError, Crossover, ProbabilityOutOfRangeError};
pub use distribution::Distribution;
pub use feed::{FeedCatalog, FeedCategory, FeedId, FeedItem};
pub use mutagen::{Decay, Mutagen, MutagenError, MutationRate, Temperature};
pub use nutrient::{Nutrient, NutrientVector};
pub use policy::RecommendationPolicy;
pub use population::Population;
pub use problem::{
    ForageShare, InclusionBounds, IntakeRange, Problem, ProblemError, ProblemOptions,
};
pub use profile::{
    AnimalProfile, AnimalType, BreedClass, Environment, Housing, Production, Terrain,
};
pub use ranking::{FrontMember, ParetoFront};
pub use requirements::{ProfileError, Requirement, RequirementSet, compute_requirements};
pub use schedule::{Schedule, StopReason};
pub use selector::{SelectionError, Selector};

pub(crate) use candidate::AMOUNT_EPS;
pub(crate) use ranking::{Ranking, rank_candidates};
