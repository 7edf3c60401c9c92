use crate::models::problem::InclusionBounds;
use rand::Rng;
use serde::{Deserialize, Serialize};

fn decay_linear(value: f64, progress: f64, multiplier: f64) -> f64 {
    value * (1.0 - progress * multiplier).max(0.0)
}

fn decay_exponential(value: f64, progress: f64, multiplier: f64, exponent: i32) -> f64 {
    value * (1.0 - progress * multiplier).max(0.0).powi(exponent)
}

// ============================================================
// Decay
// ============================================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decay {
    Constant,
    Linear { multiplier: f64 },
    Exponential { multiplier: f64, exponent: i32 },
}

impl Decay {
    fn apply(&self, value: f64, progress: f64) -> f64 {
        match self {
            Decay::Constant => value,
            Decay::Linear { multiplier } => decay_linear(value, progress, *multiplier),
            Decay::Exponential {
                multiplier,
                exponent,
            } => decay_exponential(value, progress, *multiplier, *exponent),
        }
    }
}

// ============================================================
// Temperature
// ============================================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Temperature {
    value: f64,
    decay: Decay,
}

#[derive(Debug, thiserror::Error)]
#[error("temperature must be between 0.0 and 1.0, got: {0}")]
pub struct TemperatureOutOfRange(f64);

impl Temperature {
    pub fn new(value: f64, decay: Decay) -> Result<Self, TemperatureOutOfRange> {
        let value = Self::validate(value)?;

        Ok(Self { value, decay })
    }

    pub fn constant(value: f64) -> Result<Self, TemperatureOutOfRange> {
        let value = Self::validate(value)?;

        Ok(Self {
            value,
            decay: Decay::Constant,
        })
    }

    fn validate(value: f64) -> Result<f64, TemperatureOutOfRange> {
        if !(0.0..=1.0).contains(&value) {
            return Err(TemperatureOutOfRange(value));
        }

        Ok(value)
    }

    fn get(&self, progress: f64) -> f64 {
        self.decay.apply(self.value, progress)
    }
}

// ============================================================
// MutationRate
// ============================================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRate {
    value: f64,
    decay: Decay,
}

#[derive(Debug, thiserror::Error)]
#[error("mutation_rate must be between 0.0 and 1.0, got: {0}")]
pub struct MutationRateOutOfRange(f64);

impl MutationRate {
    pub fn new(value: f64, decay: Decay) -> Result<Self, MutationRateOutOfRange> {
        let value = Self::validate(value)?;

        Ok(Self { value, decay })
    }

    pub fn constant(value: f64) -> Result<Self, MutationRateOutOfRange> {
        let value = Self::validate(value)?;

        Ok(Self {
            value,
            decay: Decay::Constant,
        })
    }

    fn validate(value: f64) -> Result<f64, MutationRateOutOfRange> {
        if !(0.0..=1.0).contains(&value) {
            return Err(MutationRateOutOfRange(value));
        }

        Ok(value)
    }

    fn get(&self, progress: f64) -> f64 {
        self.decay.apply(self.value, progress)
    }
}

// ============================================================
// Mutagen
// ============================================================

/// Bounded random perturbation of diet amounts.
///
/// `mutation_rate` decides whether a feed's amount mutates at all;
/// `temperature` scales the perturbation as a fraction of that feed's
/// inclusion span. Both may decay as the search progresses so late
/// generations fine-tune instead of jumping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mutagen {
    mutation_rate: MutationRate,
    temperature: Temperature,
}

#[derive(Debug, thiserror::Error)]
pub enum MutagenError {
    #[error("Mutation rate error: {0}")]
    MutationRate(#[from] MutationRateOutOfRange),
    #[error("Temperature error: {0}")]
    Temperature(#[from] TemperatureOutOfRange),
}

impl Default for Mutagen {
    /// Moderate perturbation that anneals away over the run: 20% of feeds
    /// mutate, steps start at a quarter of the inclusion span.
    fn default() -> Self {
        Self {
            temperature: Temperature {
                value: 0.25,
                decay: Decay::Linear { multiplier: 0.8 },
            },
            mutation_rate: MutationRate {
                value: 0.20,
                decay: Decay::Constant,
            },
        }
    }
}

impl Mutagen {
    pub fn new(temperature: Temperature, mutation_rate: MutationRate) -> Self {
        Self {
            temperature,
            mutation_rate,
        }
    }

    pub fn constant(
        temperature_value: f64,
        mutation_rate_value: f64,
    ) -> Result<Self, MutagenError> {
        let temperature = Temperature::constant(temperature_value)?;
        let mutation_rate = MutationRate::constant(mutation_rate_value)?;

        Ok(Self {
            temperature,
            mutation_rate,
        })
    }

    pub(crate) fn mutate<R: Rng>(
        &self,
        rng: &mut R,
        amounts: &mut [f64],
        bounds: &[InclusionBounds],
        progress: f64,
    ) {
        let temperature = self.temperature.get(progress);
        let mutation_rate = self.mutation_rate.get(progress);

        for (amount, bound) in amounts.iter_mut().zip(bounds) {
            // Should we mutate this feed?
            if rng.random_range(0.0..1.0) < mutation_rate {
                // Temperature controls the step: higher = larger jumps
                // relative to the feed's inclusion span.
                let max_step = bound.span() * temperature;
                if max_step <= 0.0 {
                    continue;
                }

                let step = rng.random_range(-max_step..=max_step);
                *amount = bound.clamp(*amount + step);
            }
        }
    }
}
