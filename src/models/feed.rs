use crate::models::nutrient::{Nutrient, NutrientVector};
use serde::{Deserialize, Serialize};

/// Identifier of a feed within one catalogue snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedId(String);

impl FeedId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeedId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Closed feed taxonomy. Ratio constraints count [`FeedCategory::Forage`]
/// against everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedCategory {
    Forage,
    Concentrate,
    Mineral,
}

/// One candidate feed in a catalogue snapshot. Composition and cost are per
/// kg of dry matter; inclusion bounds are kg DM per day. Never mutated by
/// the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: FeedId,
    pub name: String,
    pub category: FeedCategory,
    pub nutrients: NutrientVector,
    /// Cost per kg DM, in the caller's currency unit.
    pub cost_per_kg: f64,
    /// Minimum inclusion, kg DM/day.
    pub min_inclusion_kg: f64,
    /// Palatability or safety ceiling, kg DM/day. Absent means the global
    /// per-feed ceiling applies.
    pub max_inclusion_kg: Option<f64>,
    pub available: bool,
}

impl FeedItem {
    /// A freely usable feed with zero minimum and no explicit ceiling.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: FeedCategory,
        nutrients: NutrientVector,
        cost_per_kg: f64,
    ) -> Self {
        Self {
            id: FeedId::new(id),
            name: name.into(),
            category,
            nutrients,
            cost_per_kg,
            min_inclusion_kg: 0.0,
            max_inclusion_kg: None,
            available: true,
        }
    }

    pub fn with_inclusion_bounds(mut self, min_kg: f64, max_kg: f64) -> Self {
        self.min_inclusion_kg = min_kg;
        self.max_inclusion_kg = Some(max_kg);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Daily supply of a nutrient contributed by `amount_kg` of this feed.
    pub(crate) fn supply(&self, nutrient: Nutrient, amount_kg: f64) -> f64 {
        nutrient.supply_per_kg_dm(self.nutrients.get_or_zero(nutrient)) * amount_kg
    }
}

/// In-memory view of the feeds offered for one run. A snapshot owned by the
/// request; catalogue persistence lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedCatalog {
    feeds: Vec<FeedItem>,
}

impl FeedCatalog {
    pub fn new(feeds: Vec<FeedItem>) -> Self {
        Self { feeds }
    }

    pub fn get(&self, id: &FeedId) -> Option<&FeedItem> {
        self.feeds.iter().find(|feed| &feed.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedItem> {
        self.feeds.iter()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_computes_daily_supply() {
        let feed = FeedItem::new(
            "alfalfa",
            "Alfalfa hay",
            FeedCategory::Forage,
            NutrientVector::new()
                .with(Nutrient::CrudeProtein, 19.0)
                .with(Nutrient::NetEnergyLactation, 1.35),
            0.22,
        );

        // 5 kg DM at 19% CP = 950 g; energy stays in Mcal.
        assert_eq!(feed.supply(Nutrient::CrudeProtein, 5.0), 950.0);
        assert_eq!(feed.supply(Nutrient::NetEnergyLactation, 5.0), 6.75);
        assert_eq!(feed.supply(Nutrient::Calcium, 5.0), 0.0);
    }

    #[test]
    fn it_looks_feeds_up_by_id() {
        let catalog = FeedCatalog::new(vec![FeedItem::new(
            "corn",
            "Corn grain",
            FeedCategory::Concentrate,
            NutrientVector::new(),
            0.25,
        )]);

        assert!(catalog.get(&FeedId::from("corn")).is_some());
        assert!(catalog.get(&FeedId::from("barley")).is_none());
    }
}
