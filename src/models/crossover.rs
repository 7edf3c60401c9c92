use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Blend crossover: each amount is an interpolation between the parents,
/// extended by `alpha` beyond the parent interval.
fn crossover_blend<R: Rng>(rng: &mut R, lhs: &[f64], rhs: &[f64], alpha: f64) -> Vec<f64> {
    lhs.iter()
        .zip(rhs)
        .map(|(&a, &b)| {
            let mix = rng.random_range(-alpha..=1.0 + alpha);
            a + mix * (b - a)
        })
        .collect()
}

/// Uniform crossover: each amount is taken whole from one parent.
fn crossover_uniform<R: Rng>(rng: &mut R, lhs: &[f64], rhs: &[f64], probability: f64) -> Vec<f64> {
    lhs.iter()
        .zip(rhs)
        .map(|(&a, &b)| if rng.random_bool(probability) { a } else { b })
        .collect()
}

/// Crossover strategy for combining two parent diets into an offspring.
///
/// Diet amounts are continuous, so the default operator blends parent
/// amounts rather than splicing gene segments: a child inherits an
/// intermediate inclusion of each feed. Uniform crossover instead copies
/// whole per-feed amounts from either parent, preserving exact inclusions.
///
/// Offspring may leave feed bounds when `alpha > 0`; the breeder re-clamps
/// after every crossover and mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Crossover {
    /// BLX-style blend. `alpha = 0.0` is a plain interpolation between the
    /// parents; larger values let offspring explore slightly outside the
    /// parent interval.
    Blend { alpha: f64 },
    /// Each feed amount comes from the first parent with `probability`,
    /// otherwise from the second.
    Uniform { probability: f64 },
}

impl Default for Crossover {
    fn default() -> Self {
        Self::Blend { alpha: 0.3 }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("uniform crossover probability must be between 0.0 and 1.0, got {0}")]
pub struct ProbabilityOutOfRangeError(f64);

#[derive(Debug, thiserror::Error)]
#[error("blend crossover alpha must be between 0.0 and 1.0, got {0}")]
pub struct AlphaOutOfRangeError(f64);

impl Crossover {
    pub fn blend(alpha: f64) -> Result<Self, AlphaOutOfRangeError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(AlphaOutOfRangeError(alpha));
        }

        Ok(Self::Blend { alpha })
    }

    pub fn uniform(probability: f64) -> Result<Self, ProbabilityOutOfRangeError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(ProbabilityOutOfRangeError(probability));
        }

        Ok(Self::Uniform { probability })
    }

    /// Applies the crossover to two parents, producing offspring amounts.
    #[instrument(level = "debug", skip(self, rng, lhs, rhs), fields(crossover = ?self, dimension = lhs.len()))]
    pub(crate) fn apply<R: Rng>(&self, rng: &mut R, lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
        match self {
            Self::Blend { alpha } => crossover_blend(rng, lhs, rhs, *alpha),
            Self::Uniform { probability } => crossover_uniform(rng, lhs, rhs, *probability),
        }
    }
}
