use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of nutrients this engine balances.
///
/// Each nutrient has a fixed unit: composition values describe one kilogram
/// of feed dry matter, requirement values describe one animal-day.
/// Percentages are expressed as 0–100 throughout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Nutrient {
    /// Dry matter content, % of the feed as fed. Composition only, never a
    /// requirement target.
    DryMatter,
    /// Net energy for lactation, Mcal/kg DM. Requirement in Mcal/day.
    NetEnergyLactation,
    /// Crude protein, % of DM. Requirement in g/day.
    CrudeProtein,
    /// Neutral detergent fiber, % of DM. Requirement in g/day.
    Ndf,
    /// Acid detergent fiber, % of DM. Requirement in g/day.
    Adf,
    /// Calcium, % of DM. Requirement in g/day.
    Calcium,
    /// Phosphorus, % of DM. Requirement in g/day.
    Phosphorus,
}

impl Nutrient {
    pub const ALL: [Nutrient; 7] = [
        Nutrient::DryMatter,
        Nutrient::NetEnergyLactation,
        Nutrient::CrudeProtein,
        Nutrient::Ndf,
        Nutrient::Adf,
        Nutrient::Calcium,
        Nutrient::Phosphorus,
    ];

    /// Unit of a composition value, per kg of feed dry matter.
    pub fn composition_unit(&self) -> &'static str {
        match self {
            Nutrient::DryMatter => "% as fed",
            Nutrient::NetEnergyLactation => "Mcal/kg DM",
            _ => "% of DM",
        }
    }

    /// Unit of a requirement or supply value, per animal-day.
    pub fn requirement_unit(&self) -> &'static str {
        match self {
            Nutrient::DryMatter => "kg/day",
            Nutrient::NetEnergyLactation => "Mcal/day",
            _ => "g/day",
        }
    }

    /// Converts a composition value into the daily supply contributed by one
    /// kilogram of feed dry matter: Mcal stay Mcal, percentages become grams
    /// (1 kg × pct/100 × 1000 g).
    pub(crate) fn supply_per_kg_dm(&self, composition: f64) -> f64 {
        match self {
            Nutrient::NetEnergyLactation => composition,
            _ => composition * 10.0,
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Nutrient::DryMatter => "dry matter",
            Nutrient::NetEnergyLactation => "net energy (lactation)",
            Nutrient::CrudeProtein => "crude protein",
            Nutrient::Ndf => "NDF",
            Nutrient::Adf => "ADF",
            Nutrient::Calcium => "calcium",
            Nutrient::Phosphorus => "phosphorus",
        };
        f.write_str(name)
    }
}

/// Per-nutrient composition of a feed, keyed by [`Nutrient`].
///
/// Backed by a `BTreeMap` so iteration order is deterministic; fitness
/// evaluation and report rendering must not depend on hash ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientVector(BTreeMap<Nutrient, f64>);

impl NutrientVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insertion.
    pub fn with(mut self, nutrient: Nutrient, value: f64) -> Self {
        self.0.insert(nutrient, value);
        self
    }

    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        self.0.insert(nutrient, value);
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        self.0.get(&nutrient).copied()
    }

    /// Composition value, treating absent nutrients as zero.
    pub fn get_or_zero(&self, nutrient: Nutrient) -> f64 {
        self.get(nutrient).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        self.0.iter().map(|(n, v)| (*n, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
