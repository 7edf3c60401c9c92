use crate::models::{EvaluationError, ProblemError, ProfileError};
use crate::services::search;

/// Formulation service failures. All variants are validation or
/// configuration rejections raised before or around the search. An
/// infeasible diet is a tagged result, not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Problem(#[from] ProblemError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Search(#[from] search::Error),

    /// The search returned an empty front. Cannot happen with a non-empty
    /// population; kept as a typed failure instead of a panic path.
    #[error("the search produced an empty front")]
    EmptyFront,
}
