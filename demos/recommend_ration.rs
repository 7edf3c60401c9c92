use anyhow::Result;
use feedmix::Service;
use feedmix::models::{
    AnimalProfile, AnimalType, BreedClass, Environment, FeedCategory, FeedItem, Nutrient,
    NutrientVector, Production, Schedule,
};
use feedmix::services::formulation::RecommendOptions;
use feedmix::services::search::SearchParams;

fn catalog() -> Vec<FeedItem> {
    vec![
        FeedItem::new(
            "corn-silage",
            "Corn silage",
            FeedCategory::Forage,
            NutrientVector::new()
                .with(Nutrient::DryMatter, 35.0)
                .with(Nutrient::NetEnergyLactation, 1.45)
                .with(Nutrient::CrudeProtein, 8.8)
                .with(Nutrient::Ndf, 45.0)
                .with(Nutrient::Adf, 28.0)
                .with(Nutrient::Calcium, 0.28)
                .with(Nutrient::Phosphorus, 0.26),
            0.13,
        )
        .with_inclusion_bounds(0.0, 14.0),
        FeedItem::new(
            "alfalfa-hay",
            "Alfalfa hay",
            FeedCategory::Forage,
            NutrientVector::new()
                .with(Nutrient::DryMatter, 88.0)
                .with(Nutrient::NetEnergyLactation, 1.35)
                .with(Nutrient::CrudeProtein, 19.0)
                .with(Nutrient::Ndf, 42.0)
                .with(Nutrient::Adf, 32.0)
                .with(Nutrient::Calcium, 1.40)
                .with(Nutrient::Phosphorus, 0.24),
            0.22,
        )
        .with_inclusion_bounds(0.0, 8.0),
        FeedItem::new(
            "corn-grain",
            "Ground corn grain",
            FeedCategory::Concentrate,
            NutrientVector::new()
                .with(Nutrient::DryMatter, 88.0)
                .with(Nutrient::NetEnergyLactation, 2.01)
                .with(Nutrient::CrudeProtein, 9.4)
                .with(Nutrient::Ndf, 9.5)
                .with(Nutrient::Adf, 3.5)
                .with(Nutrient::Calcium, 0.03)
                .with(Nutrient::Phosphorus, 0.30),
            0.25,
        )
        .with_inclusion_bounds(0.0, 10.0),
        FeedItem::new(
            "soybean-meal",
            "Soybean meal, 48%",
            FeedCategory::Concentrate,
            NutrientVector::new()
                .with(Nutrient::DryMatter, 89.0)
                .with(Nutrient::NetEnergyLactation, 2.06)
                .with(Nutrient::CrudeProtein, 49.9)
                .with(Nutrient::Ndf, 9.8)
                .with(Nutrient::Adf, 6.2)
                .with(Nutrient::Calcium, 0.40)
                .with(Nutrient::Phosphorus, 0.71),
            0.42,
        )
        .with_inclusion_bounds(0.0, 4.0),
        FeedItem::new(
            "mineral-premix",
            "Ca/P mineral premix",
            FeedCategory::Mineral,
            NutrientVector::new()
                .with(Nutrient::DryMatter, 98.0)
                .with(Nutrient::Calcium, 24.0)
                .with(Nutrient::Phosphorus, 12.0),
            0.80,
        )
        .with_inclusion_bounds(0.0, 0.3),
    ]
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let profile = AnimalProfile {
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
    };

    let service = Service::default();
    let options = RecommendOptions {
        search: Some(SearchParams {
            population_size: 150,
            schedule: Schedule::generations(250).with_patience(60),
            seed: Some(2024),
            ..SearchParams::default()
        }),
        ..RecommendOptions::default()
    };

    let recommendation = service.recommend(&profile, catalog(), options)?;

    println!(
        "recommended ration (feasible: {}, cost {:.2}/day, stopped: {:?} after {} generations):",
        recommendation.feasible,
        recommendation.fitness.cost,
        recommendation.stop_reason,
        recommendation.generations,
    );
    for entry in &recommendation.diet {
        println!("  {:>14}  {:6.2} kg DM", entry.feed.as_str(), entry.amount_kg);
    }

    let mix: Vec<_> = recommendation
        .diet
        .iter()
        .map(|entry| (entry.feed.clone(), entry.amount_kg))
        .collect();
    let report = service.evaluate(&profile, &mix, catalog(), Default::default())?;

    println!("\nbalance:");
    for balance in &report.balances {
        println!(
            "  {:>24}  {:10.1} / {:10.1}  {:?}",
            balance.nutrient.to_string(),
            balance.supplied,
            balance.required_min,
            balance.status,
        );
    }
    if let Some(prediction) = report.predicted_performance {
        println!("\npredicted performance: {prediction:?}");
    }

    Ok(())
}
