// Aggregation over the canonical purchase table: KPIs and chart views.
pub mod grouping;
pub mod kpi;
pub mod reduction;

pub use kpi::compute_kpis;

use serde_json::Value;
use shared::models::{AggregateTable, Aggregates, ChartKind, PurchaseTable};

use grouping::{GroupKey, GroupedReduction, RowOrder};
use reduction::{Field, Reduction};

/// A dashboard chart and the grouped reduction that feeds it.
#[derive(Debug, Clone, Copy)]
pub struct ChartDefinition {
    pub kind: ChartKind,
    pub grouping: GroupedReduction,
}

impl ChartDefinition {
    pub fn parameters(&self) -> Value {
        self.grouping.parameters()
    }

    pub fn aggregate(&self, table: &PurchaseTable) -> AggregateTable {
        AggregateTable::new(self.kind, self.grouping.apply(table.records()))
    }
}

pub static CHARTS: [ChartDefinition; 6] = [
    ChartDefinition {
        kind: ChartKind::OrderCost,
        grouping: GroupedReduction::new(GroupKey::OrderDate, Reduction::Sum(Field::SampleCost), RowOrder::ByKey),
    },
    ChartDefinition {
        kind: ChartKind::OrderAmount,
        grouping: GroupedReduction::new(GroupKey::OrderDate, Reduction::Sum(Field::Amount), RowOrder::ByKey),
    },
    ChartDefinition {
        kind: ChartKind::OrderRating,
        grouping: GroupedReduction::new(GroupKey::OrderDate, Reduction::Mean(Field::Rating), RowOrder::ByKey),
    },
    ChartDefinition {
        kind: ChartKind::HouseRating,
        grouping: GroupedReduction::new(GroupKey::House, Reduction::Mean(Field::Rating), RowOrder::ByValue),
    },
    ChartDefinition {
        kind: ChartKind::FragrancesPerHouse,
        grouping: GroupedReduction::new(GroupKey::House, Reduction::Count, RowOrder::ByValue),
    },
    ChartDefinition {
        kind: ChartKind::RatingHistogram,
        grouping: GroupedReduction::new(GroupKey::Rating, Reduction::Count, RowOrder::ByKey),
    },
];

pub fn chart(kind: ChartKind) -> &'static ChartDefinition {
    match kind {
        ChartKind::OrderCost => &CHARTS[0],
        ChartKind::OrderAmount => &CHARTS[1],
        ChartKind::OrderRating => &CHARTS[2],
        ChartKind::HouseRating => &CHARTS[3],
        ChartKind::FragrancesPerHouse => &CHARTS[4],
        ChartKind::RatingHistogram => &CHARTS[5],
    }
}

/// Builds all six chart tables from the table.
pub fn compute_aggregates(table: &PurchaseTable) -> Aggregates {
    let build = |kind: ChartKind| chart(kind).aggregate(table);
    Aggregates {
        order_cost: build(ChartKind::OrderCost),
        order_amount: build(ChartKind::OrderAmount),
        order_rating: build(ChartKind::OrderRating),
        house_rating: build(ChartKind::HouseRating),
        fragrances_per_house: build(ChartKind::FragrancesPerHouse),
        rating_histogram: build(ChartKind::RatingHistogram),
    }
}
