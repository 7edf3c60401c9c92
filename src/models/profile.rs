use serde::{Deserialize, Serialize};

/// Physiological class of the animal being fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalType {
    /// In milk; requires a [`Production`] block.
    Lactating,
    /// Pregnant, not in milk.
    Dry,
    /// Growing replacement, not yet calved.
    Heifer,
    /// Pre-ruminant or weaned young stock.
    Calf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreedClass {
    LargeDairy,
    SmallDairy,
    DualPurpose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    Flat,
    Rolling,
    Hilly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Housing {
    Confined,
    Pasture,
}

/// Milk production figures for lactating animals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// Milk yield, kg/day.
    pub milk_yield: f64,
    /// Milk fat, % (0–100).
    pub fat_pct: f64,
    /// Milk true protein, % (0–100).
    pub protein_pct: f64,
    /// Days since calving.
    pub days_in_milk: u32,
    /// Completed lactations.
    pub parity: u32,
}

/// Environmental conditions the animal is kept under. These adjust the
/// maintenance side of the requirement model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Ambient temperature, °C.
    pub temperature_c: f64,
    /// Distance walked, km/day.
    pub walking_km: f64,
    pub terrain: Terrain,
    pub housing: Housing,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature_c: 15.0,
            walking_km: 0.0,
            terrain: Terrain::Flat,
            housing: Housing::Confined,
        }
    }
}

/// Immutable description of one animal for a single formulation or
/// evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalProfile {
    pub animal_type: AnimalType,
    pub breed: BreedClass,
    /// Body weight, kg.
    pub body_weight_kg: f64,
    /// Body condition score on the 1–5 scale.
    pub body_condition_score: f64,
    /// Required for [`AnimalType::Lactating`], rejected otherwise.
    pub production: Option<Production>,
    pub environment: Environment,
}

impl AnimalProfile {
    /// Metabolic body weight, kg^0.75.
    pub(crate) fn metabolic_weight(&self) -> f64 {
        self.body_weight_kg.powf(0.75)
    }
}
