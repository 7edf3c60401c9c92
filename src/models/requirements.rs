//! Converts an [`AnimalProfile`] into quantitative nutrient targets.
//!
//! The equations are the NRC (2001) dairy class: metabolic-weight
//! maintenance, milk energy from yield and composition, gestation and growth
//! allowances, and environmental corrections for temperature, walking and
//! terrain. They are deterministic and perform no I/O; the same profile
//! always produces the same targets.

use crate::models::nutrient::Nutrient;
use crate::models::profile::{AnimalProfile, AnimalType, BreedClass, Housing, Terrain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

// Maintenance scale factors.
const NEL_MAINTENANCE_MCAL_PER_MBW: f64 = 0.080;
const CP_MAINTENANCE_G_PER_MBW: f64 = 3.8;
const NEL_WALKING_MCAL_PER_KG_KM: f64 = 0.00045;
const PASTURE_MAINTENANCE_FACTOR: f64 = 1.10;
const THERMAL_STRESS_CAP: f64 = 1.25;

// Milk energy, Mcal per kg, from fat and true protein percentages. The
// constant term carries the lactose contribution.
const MILK_NEL_PER_FAT_PCT: f64 = 0.0929;
const MILK_NEL_PER_PROTEIN_PCT: f64 = 0.0547;
const MILK_NEL_LACTOSE_TERM: f64 = 0.192;

// Efficiency of converting dietary crude protein into milk protein.
const MILK_PROTEIN_EFFICIENCY: f64 = 0.67;

// Gestation and growth allowances.
const GESTATION_NEL_MCAL: f64 = 3.0;
const GESTATION_CP_G: f64 = 250.0;
pub(crate) const NEL_MCAL_PER_KG_GAIN: f64 = 4.5;
pub(crate) const CP_G_PER_KG_GAIN: f64 = 320.0;
const HEIFER_TARGET_GAIN_KG: f64 = 0.8;
const CALF_TARGET_GAIN_KG: f64 = 0.6;

// Mineral factors: requirements are computed on an absorbed basis and
// divided by the absorption coefficient to reach dietary totals.
const CA_ABSORPTION: f64 = 0.38;
const CA_MAINTENANCE_G_PER_KG_BW: f64 = 0.0154;
const CA_G_PER_KG_MILK: f64 = 1.22;
const CA_GESTATION_G: f64 = 8.0;
const CA_G_PER_KG_GAIN: f64 = 9.8;
const P_ABSORPTION: f64 = 0.64;
const P_MAINTENANCE_G_PER_KG_DMI: f64 = 1.0;
const P_G_PER_KG_MILK: f64 = 0.90;
const P_GESTATION_G: f64 = 3.0;
const P_G_PER_KG_GAIN: f64 = 4.9;
const MINERAL_CEILING_FACTOR: f64 = 2.0;

// Intake-driven fiber floors, % of dry matter, and the lactating NDF
// ceiling in g per kg of body weight.
const NDF_CEILING_G_PER_KG_BW: f64 = 12.0;

/// Per-nutrient requirement bound. `maximum` absent means unbounded above.
///
/// Invariant: `minimum <= maximum` whenever both are present; both
/// constructors uphold it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub minimum: f64,
    pub maximum: Option<f64>,
}

impl Requirement {
    /// Lower bound only.
    pub fn at_least(minimum: f64) -> Self {
        Self {
            minimum,
            maximum: None,
        }
    }

    /// Bounded on both sides. The upper bound is raised to the lower bound
    /// if the caller supplies a crossed pair.
    pub fn between(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum,
            maximum: Some(maximum.max(minimum)),
        }
    }

    /// Amount still missing below the minimum; zero when satisfied.
    pub(crate) fn shortfall(&self, supplied: f64) -> f64 {
        (self.minimum - supplied).max(0.0)
    }

    /// Amount above the maximum; zero when unbounded or satisfied.
    pub(crate) fn overage(&self, supplied: f64) -> f64 {
        match self.maximum {
            Some(maximum) => (supplied - maximum).max(0.0),
            None => 0.0,
        }
    }
}

/// The requirement targets derived from one profile, plus the dry-matter
/// intake estimate used for intake bounds and fiber floors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    targets: BTreeMap<Nutrient, Requirement>,
    dm_intake_kg: f64,
}

impl RequirementSet {
    /// An empty set around a given intake estimate. Targets are added with
    /// [`RequirementSet::with_target`]; the requirement model does this from
    /// a profile, tests may do it by hand.
    pub fn new(dm_intake_kg: f64) -> Self {
        Self {
            targets: BTreeMap::new(),
            dm_intake_kg,
        }
    }

    pub fn with_target(mut self, nutrient: Nutrient, requirement: Requirement) -> Self {
        self.targets.insert(nutrient, requirement);
        self
    }

    pub fn get(&self, nutrient: Nutrient) -> Option<&Requirement> {
        self.targets.get(&nutrient)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, &Requirement)> + '_ {
        self.targets.iter().map(|(n, r)| (*n, r))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Estimated dry-matter intake, kg/day.
    pub fn dm_intake_kg(&self) -> f64 {
        self.dm_intake_kg
    }
}

/// Rejections for physically impossible profiles. Each variant names the
/// offending field so the caller can surface it.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProfileError {
    #[error("body_weight_kg must be positive, got {0}")]
    NonPositiveWeight(f64),

    #[error("body_condition_score must be within 1.0–5.0, got {0}")]
    ConditionScoreOutOfRange(f64),

    #[error("walking_km must be non-negative, got {0}")]
    NegativeWalkingDistance(f64),

    #[error("{field} must be non-negative, got {value}")]
    NegativeProduction { field: &'static str, value: f64 },

    #[error("{field} must be within 0–100, got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },

    #[error("lactating profiles require a production block")]
    MissingProduction,

    #[error("production block given for a non-lactating animal type")]
    UnexpectedProduction,
}

fn validate(profile: &AnimalProfile) -> Result<(), ProfileError> {
    if profile.body_weight_kg <= 0.0 {
        return Err(ProfileError::NonPositiveWeight(profile.body_weight_kg));
    }
    if !(1.0..=5.0).contains(&profile.body_condition_score) {
        return Err(ProfileError::ConditionScoreOutOfRange(
            profile.body_condition_score,
        ));
    }
    if profile.environment.walking_km < 0.0 {
        return Err(ProfileError::NegativeWalkingDistance(
            profile.environment.walking_km,
        ));
    }

    match (profile.animal_type, &profile.production) {
        (AnimalType::Lactating, None) => Err(ProfileError::MissingProduction),
        (AnimalType::Lactating, Some(production)) => {
            if production.milk_yield < 0.0 {
                return Err(ProfileError::NegativeProduction {
                    field: "milk_yield",
                    value: production.milk_yield,
                });
            }
            for (field, value) in [
                ("fat_pct", production.fat_pct),
                ("protein_pct", production.protein_pct),
            ] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(ProfileError::PercentOutOfRange { field, value });
                }
            }
            Ok(())
        }
        (_, Some(_)) => Err(ProfileError::UnexpectedProduction),
        (_, None) => Ok(()),
    }
}

fn breed_maintenance_factor(breed: BreedClass) -> f64 {
    match breed {
        BreedClass::LargeDairy => 1.0,
        // Small-framed dairy breeds run hotter per unit metabolic weight.
        BreedClass::SmallDairy => 1.06,
        BreedClass::DualPurpose => 0.97,
    }
}

fn terrain_factor(terrain: Terrain) -> f64 {
    match terrain {
        Terrain::Flat => 1.0,
        Terrain::Rolling => 1.5,
        Terrain::Hilly => 2.0,
    }
}

/// Combined thermal and housing multiplier on maintenance energy.
fn environment_factor(profile: &AnimalProfile) -> f64 {
    let temperature = profile.environment.temperature_c;
    let thermal = if temperature > 25.0 {
        1.0 + 0.0070 * (temperature - 25.0)
    } else if temperature < 5.0 {
        1.0 + 0.0050 * (5.0 - temperature)
    } else {
        1.0
    };
    let thermal = thermal.min(THERMAL_STRESS_CAP);

    let housing = match profile.environment.housing {
        Housing::Confined => 1.0,
        Housing::Pasture => PASTURE_MAINTENANCE_FACTOR,
    };

    thermal * housing
}

/// Condition-score correction: thin animals get extra allowance to rebuild
/// reserves, over-conditioned animals slightly less.
fn condition_factor(score: f64) -> f64 {
    if score < 2.5 {
        1.10
    } else if score > 4.0 {
        0.95
    } else {
        1.0
    }
}

fn target_gain_kg(animal_type: AnimalType) -> f64 {
    match animal_type {
        AnimalType::Heifer => HEIFER_TARGET_GAIN_KG,
        AnimalType::Calf => CALF_TARGET_GAIN_KG,
        _ => 0.0,
    }
}

/// Energy content of one kg of milk at the given composition, Mcal NEL.
pub(crate) fn milk_nel_per_kg(fat_pct: f64, protein_pct: f64) -> f64 {
    MILK_NEL_PER_FAT_PCT * fat_pct + MILK_NEL_PER_PROTEIN_PCT * protein_pct + MILK_NEL_LACTOSE_TERM
}

/// Dietary crude protein needed per kg of milk at the given composition, g.
pub(crate) fn milk_cp_g_per_kg(protein_pct: f64) -> f64 {
    protein_pct * 10.0 / MILK_PROTEIN_EFFICIENCY
}

fn estimate_dm_intake(profile: &AnimalProfile) -> f64 {
    match (profile.animal_type, &profile.production) {
        (AnimalType::Lactating, Some(production)) => {
            // Fat-corrected milk drives intake; the exponential term damps
            // intake in early lactation.
            let fat_kg = production.milk_yield * production.fat_pct / 100.0;
            let fcm = 0.4 * production.milk_yield + 15.0 * fat_kg;
            let week_of_lactation = production.days_in_milk as f64 / 7.0;
            let early_lactation = 1.0 - (-0.192 * (week_of_lactation + 3.67)).exp();
            (0.372 * fcm + 0.0968 * profile.metabolic_weight()) * early_lactation
        }
        // A lactating profile without production never passes validation.
        (AnimalType::Lactating, None) | (AnimalType::Dry, _) => 0.020 * profile.body_weight_kg,
        (AnimalType::Heifer, _) => 0.024 * profile.body_weight_kg,
        (AnimalType::Calf, _) => 0.028 * profile.body_weight_kg,
    }
}

/// Derives the full requirement set for a profile.
///
/// Pure function of the profile; fails only on invalid input, never on a
/// demanding one.
#[instrument(level = "debug", skip(profile), fields(animal_type = ?profile.animal_type, body_weight_kg = profile.body_weight_kg))]
pub fn compute_requirements(profile: &AnimalProfile) -> Result<RequirementSet, ProfileError> {
    validate(profile)?;

    let dm_intake = estimate_dm_intake(profile);
    let gain = target_gain_kg(profile.animal_type);

    // Energy, Mcal NEL/day.
    let maintenance_nel = NEL_MAINTENANCE_MCAL_PER_MBW
        * profile.metabolic_weight()
        * breed_maintenance_factor(profile.breed)
        * environment_factor(profile)
        * condition_factor(profile.body_condition_score);
    let walking_nel = NEL_WALKING_MCAL_PER_KG_KM
        * profile.body_weight_kg
        * profile.environment.walking_km
        * terrain_factor(profile.environment.terrain);
    let production_nel = match (profile.animal_type, &profile.production) {
        (AnimalType::Lactating, Some(production)) => {
            production.milk_yield * milk_nel_per_kg(production.fat_pct, production.protein_pct)
        }
        (AnimalType::Dry, _) => GESTATION_NEL_MCAL,
        _ => gain * NEL_MCAL_PER_KG_GAIN,
    };
    let nel = maintenance_nel + walking_nel + production_nel;

    // Crude protein, g/day.
    let maintenance_cp = CP_MAINTENANCE_G_PER_MBW * profile.metabolic_weight();
    let production_cp = match (profile.animal_type, &profile.production) {
        (AnimalType::Lactating, Some(production)) => {
            production.milk_yield * milk_cp_g_per_kg(production.protein_pct)
        }
        (AnimalType::Dry, _) => GESTATION_CP_G,
        _ => gain * CP_G_PER_KG_GAIN,
    };
    let cp = maintenance_cp + production_cp;

    // Minerals, g/day, absorbed basis scaled to dietary totals.
    let milk_yield = profile
        .production
        .as_ref()
        .map(|p| p.milk_yield)
        .unwrap_or(0.0);
    let gestation_ca = if profile.animal_type == AnimalType::Dry {
        CA_GESTATION_G
    } else {
        0.0
    };
    let calcium = (CA_MAINTENANCE_G_PER_KG_BW * profile.body_weight_kg
        + CA_G_PER_KG_MILK * milk_yield
        + gestation_ca
        + CA_G_PER_KG_GAIN * gain)
        / CA_ABSORPTION;
    let gestation_p = if profile.animal_type == AnimalType::Dry {
        P_GESTATION_G
    } else {
        0.0
    };
    let phosphorus = (P_MAINTENANCE_G_PER_KG_DMI * dm_intake
        + P_G_PER_KG_MILK * milk_yield
        + gestation_p
        + P_G_PER_KG_GAIN * gain)
        / P_ABSORPTION;

    // Fiber floors as g/day at the estimated intake.
    let (ndf_floor_pct, adf_floor_pct) = match profile.animal_type {
        AnimalType::Lactating => (28.0, 19.0),
        AnimalType::Dry => (33.0, 21.0),
        AnimalType::Heifer => (30.0, 20.0),
        AnimalType::Calf => (25.0, 16.0),
    };
    let ndf_floor = ndf_floor_pct * 10.0 * dm_intake;
    let adf_floor = adf_floor_pct * 10.0 * dm_intake;

    let ndf = match profile.animal_type {
        // High-yield diets cap NDF to protect intake.
        AnimalType::Lactating => Requirement::between(
            ndf_floor,
            (NDF_CEILING_G_PER_KG_BW * profile.body_weight_kg).max(ndf_floor),
        ),
        _ => Requirement::at_least(ndf_floor),
    };

    Ok(RequirementSet::new(dm_intake)
        .with_target(Nutrient::NetEnergyLactation, Requirement::at_least(nel))
        .with_target(Nutrient::CrudeProtein, Requirement::at_least(cp))
        .with_target(Nutrient::Ndf, ndf)
        .with_target(Nutrient::Adf, Requirement::at_least(adf_floor))
        .with_target(
            Nutrient::Calcium,
            Requirement::between(calcium, calcium * MINERAL_CEILING_FACTOR),
        )
        .with_target(
            Nutrient::Phosphorus,
            Requirement::between(phosphorus, phosphorus * MINERAL_CEILING_FACTOR),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Environment, Production};
    use approx::assert_relative_eq;

    fn lactating_profile() -> AnimalProfile {
        AnimalProfile {
            animal_type: AnimalType::Lactating,
            breed: BreedClass::LargeDairy,
            body_weight_kg: 600.0,
            body_condition_score: 3.0,
            production: Some(Production {
                milk_yield: 25.0,
                fat_pct: 3.8,
                protein_pct: 3.2,
                days_in_milk: 150,
                parity: 2,
            }),
            environment: Environment::default(),
        }
    }

    #[test]
    fn it_rejects_non_positive_weight() {
        let mut profile = lactating_profile();
        profile.body_weight_kg = -10.0;

        assert_eq!(
            compute_requirements(&profile),
            Err(ProfileError::NonPositiveWeight(-10.0))
        );
    }

    #[test]
    fn it_rejects_missing_production_for_lactating() {
        let mut profile = lactating_profile();
        profile.production = None;

        assert_eq!(
            compute_requirements(&profile),
            Err(ProfileError::MissingProduction)
        );
    }

    #[test]
    fn it_rejects_production_for_dry_cow() {
        let mut profile = lactating_profile();
        profile.animal_type = AnimalType::Dry;

        assert_eq!(
            compute_requirements(&profile),
            Err(ProfileError::UnexpectedProduction)
        );
    }

    #[test]
    fn it_rejects_negative_milk_yield() {
        let mut profile = lactating_profile();
        profile.production.as_mut().unwrap().milk_yield = -1.0;

        assert_eq!(
            compute_requirements(&profile),
            Err(ProfileError::NegativeProduction {
                field: "milk_yield",
                value: -1.0
            })
        );
    }

    #[test]
    fn it_rejects_fat_percentage_above_100() {
        let mut profile = lactating_profile();
        profile.production.as_mut().unwrap().fat_pct = 120.0;

        assert_eq!(
            compute_requirements(&profile),
            Err(ProfileError::PercentOutOfRange {
                field: "fat_pct",
                value: 120.0
            })
        );
    }

    #[test]
    fn it_is_deterministic() {
        let profile = lactating_profile();

        let first = compute_requirements(&profile).unwrap();
        let second = compute_requirements(&profile).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn it_computes_lactating_energy_in_published_range() {
        let requirements = compute_requirements(&lactating_profile()).unwrap();
        let energy = requirements.get(Nutrient::NetEnergyLactation).unwrap();

        // 600 kg cow at 25 kg milk: maintenance ~9.7 Mcal + milk ~18 Mcal.
        assert_relative_eq!(energy.minimum, 27.7, max_relative = 0.05);
        assert!(energy.maximum.is_none());
    }

    #[test]
    fn it_estimates_lactating_intake_near_table_values() {
        let requirements = compute_requirements(&lactating_profile()).unwrap();

        // NRC tables put this cow near 20–21 kg DM/day.
        assert!(requirements.dm_intake_kg() > 19.0 && requirements.dm_intake_kg() < 22.0);
    }

    #[test]
    fn it_adds_energy_for_heat_stress_and_walking() {
        let baseline = compute_requirements(&lactating_profile()).unwrap();

        let mut stressed = lactating_profile();
        stressed.environment.temperature_c = 35.0;
        stressed.environment.walking_km = 4.0;
        stressed.environment.terrain = Terrain::Hilly;
        let stressed = compute_requirements(&stressed).unwrap();

        let baseline_nel = baseline.get(Nutrient::NetEnergyLactation).unwrap().minimum;
        let stressed_nel = stressed.get(Nutrient::NetEnergyLactation).unwrap().minimum;
        assert!(stressed_nel > baseline_nel + 2.0);
    }

    #[test]
    fn it_bounds_minerals_above_and_below() {
        let requirements = compute_requirements(&lactating_profile()).unwrap();

        for nutrient in [Nutrient::Calcium, Nutrient::Phosphorus] {
            let requirement = requirements.get(nutrient).unwrap();
            let maximum = requirement.maximum.expect("minerals carry a ceiling");
            assert!(requirement.minimum > 0.0);
            assert!(maximum > requirement.minimum);
        }
    }

    #[test]
    fn it_gives_dry_cows_lower_targets_than_lactating() {
        let lactating = compute_requirements(&lactating_profile()).unwrap();

        let dry = AnimalProfile {
            animal_type: AnimalType::Dry,
            production: None,
            ..lactating_profile()
        };
        let dry = compute_requirements(&dry).unwrap();

        assert!(
            dry.get(Nutrient::NetEnergyLactation).unwrap().minimum
                < lactating.get(Nutrient::NetEnergyLactation).unwrap().minimum
        );
        assert!(
            dry.get(Nutrient::CrudeProtein).unwrap().minimum
                < lactating.get(Nutrient::CrudeProtein).unwrap().minimum
        );
        assert!(dry.dm_intake_kg() < lactating.dm_intake_kg());
    }

    #[test]
    fn requirement_shortfall_and_overage() {
        let bounded = Requirement::between(10.0, 20.0);
        assert_eq!(bounded.shortfall(6.0), 4.0);
        assert_eq!(bounded.shortfall(15.0), 0.0);
        assert_eq!(bounded.overage(25.0), 5.0);
        assert_eq!(bounded.overage(15.0), 0.0);

        let open = Requirement::at_least(10.0);
        assert_eq!(open.overage(1e9), 0.0);
    }
}
