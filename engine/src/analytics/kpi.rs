use std::collections::HashSet;

use shared::models::{KpiSet, PurchaseTable};

use super::reduction::{Field, Reduction};

/// Computes the eight headline KPIs from the whole table.
pub fn compute_kpis(table: &PurchaseTable) -> KpiSet {
    let records = table.records();

    let fragrances: HashSet<(&str, &str)> = records
        .iter()
        .map(|p| (p.house.as_str(), p.fragrance.as_str()))
        .collect();
    let houses: HashSet<&str> = records.iter().map(|p| p.house.as_str()).collect();

    KpiSet {
        unique_fragrances: fragrances.len(),
        unique_houses: houses.len(),
        total_ml_samples: Reduction::Sum(Field::SampleMl).apply(records),
        total_ml_bottles: Reduction::Sum(Field::BottleMl).apply(records),
        total_cost_sampling: Reduction::Sum(Field::SampleCost).apply(records),
        total_cost_bottles: Reduction::Sum(Field::BottleCost).apply(records),
        average_cost_per_ml_sampling: Reduction::Mean(Field::SampleCostMl).apply(records),
        average_cost_per_ml_bottles: Reduction::Mean(Field::BottleCostMl).apply(records),
    }
}
