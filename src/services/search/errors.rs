use crate::models::SelectionError;

/// Failures raised before or during an optimizer run. Infeasibility and
/// early termination are not errors; they are tagged result states on the
/// search outcome.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("population_size must be at least 2, got {0}")]
    PopulationTooSmall(u32),

    #[error("crossover_rate must be between 0.0 and 1.0, got {0}")]
    CrossoverRateOutOfRange(f64),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}
