use std::fmt;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::missing;

/// Columns that must be present in the purchase CSV header.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "house",
    "fragrance",
    "order_date",
    "arrival_date",
    "shipping_date",
    "sample_ml",
    "sample_cost",
    "bottle_ml",
    "bottle_cost",
    "amount",
    "rating",
];

/// Column order of the serialized table: the input columns, then the derived ones.
pub const TABLE_COLUMNS: [&str; 13] = [
    "house",
    "fragrance",
    "order_date",
    "arrival_date",
    "shipping_date",
    "sample_ml",
    "sample_cost",
    "bottle_ml",
    "bottle_cost",
    "amount",
    "rating",
    "sample_cost_ml",
    "bottle_cost_ml",
];

/// Cost per millilitre. A zero volume yields a non-finite value, which
/// downstream means treat as missing.
pub fn cost_per_ml(cost: f64, ml: f64) -> f64 {
    cost / ml
}

/// One purchased sample/bottle line item.
///
/// Numeric fields hold NaN when the source cell was empty.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub house: String,
    pub fragrance: String,
    pub order_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub shipping_date: NaiveDate,
    pub sample_ml: f64,
    pub sample_cost: f64,
    pub bottle_ml: f64,
    pub bottle_cost: f64,
    pub amount: f64,
    pub rating: f64,
    pub sample_cost_ml: f64,
    pub bottle_cost_ml: f64,
}

impl Purchase {
    /// Recomputes `sample_cost_ml` and `bottle_cost_ml` from the raw fields.
    pub fn with_derived_costs(mut self) -> Self {
        self.sample_cost_ml = cost_per_ml(self.sample_cost, self.sample_ml);
        self.bottle_cost_ml = cost_per_ml(self.bottle_cost, self.bottle_ml);
        self
    }
}

// Positional form of a `Purchase`, one JSON array per row in `TABLE_COLUMNS` order.
#[derive(Serialize, Deserialize)]
struct PurchaseRow(
    String,
    String,
    NaiveDate,
    NaiveDate,
    NaiveDate,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
    #[serde(with = "missing")] f64,
);

impl From<&Purchase> for PurchaseRow {
    fn from(p: &Purchase) -> Self {
        PurchaseRow(
            p.house.clone(),
            p.fragrance.clone(),
            p.order_date,
            p.arrival_date,
            p.shipping_date,
            p.sample_ml,
            p.sample_cost,
            p.bottle_ml,
            p.bottle_cost,
            p.amount,
            p.rating,
            p.sample_cost_ml,
            p.bottle_cost_ml,
        )
    }
}

impl From<PurchaseRow> for Purchase {
    fn from(row: PurchaseRow) -> Self {
        Purchase {
            house: row.0,
            fragrance: row.1,
            order_date: row.2,
            arrival_date: row.3,
            shipping_date: row.4,
            sample_ml: row.5,
            sample_cost: row.6,
            bottle_ml: row.7,
            bottle_cost: row.8,
            amount: row.9,
            rating: row.10,
            sample_cost_ml: row.11,
            bottle_cost_ml: row.12,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SplitFrame {
    columns: Vec<String>,
    data: Vec<PurchaseRow>,
}

/// The canonical purchase table: file order, immutable once built.
///
/// Serializes in split form, `{"columns": [...], "data": [[...], ...]}`,
/// with ISO-8601 dates and `null` for missing numbers.
#[derive(Debug, Clone, Default)]
pub struct PurchaseTable {
    records: Vec<Purchase>,
}

impl PurchaseTable {
    pub fn new(records: Vec<Purchase>) -> Self {
        PurchaseTable { records }
    }

    pub fn records(&self) -> &[Purchase] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Purchase> {
        self.records.iter()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Serialize for PurchaseTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SplitFrame {
            columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            data: self.records.iter().map(PurchaseRow::from).collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PurchaseTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let frame = SplitFrame::deserialize(deserializer)?;
        if !frame.columns.iter().map(String::as_str).eq(TABLE_COLUMNS) {
            return Err(D::Error::custom(format!(
                "unexpected table columns {:?}, expected {:?}",
                frame.columns, TABLE_COLUMNS
            )));
        }
        Ok(PurchaseTable::new(frame.data.into_iter().map(Purchase::from).collect()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KpiLabel {
    UniqueFragrances,
    UniqueHouses,
    TotalMlSamples,
    TotalMlBottles,
    TotalCostSampling,
    TotalCostBottles,
    AverageCostPerMlSampling,
    AverageCostPerMlBottles,
}

impl KpiLabel {
    /// Display order of the KPI panel.
    pub const ALL: [KpiLabel; 8] = [
        KpiLabel::UniqueFragrances,
        KpiLabel::UniqueHouses,
        KpiLabel::TotalMlSamples,
        KpiLabel::TotalMlBottles,
        KpiLabel::TotalCostSampling,
        KpiLabel::TotalCostBottles,
        KpiLabel::AverageCostPerMlSampling,
        KpiLabel::AverageCostPerMlBottles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KpiLabel::UniqueFragrances => "Unique Fragrances",
            KpiLabel::UniqueHouses => "Unique Houses",
            KpiLabel::TotalMlSamples => "Total ML (Samples)",
            KpiLabel::TotalMlBottles => "Total ML (Bottles)",
            KpiLabel::TotalCostSampling => "Total Cost (Sampling)",
            KpiLabel::TotalCostBottles => "Total Cost (Bottles)",
            KpiLabel::AverageCostPerMlSampling => "Average Cost/ML (Sampling)",
            KpiLabel::AverageCostPerMlBottles => "Average Cost/ML (Bottles)",
        }
    }
}

impl fmt::Display for KpiLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight headline numbers of the dashboard.
///
/// Averages are NaN when no finite per-ml cost exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiSet {
    pub unique_fragrances: usize,
    pub unique_houses: usize,
    pub total_ml_samples: f64,
    pub total_ml_bottles: f64,
    pub total_cost_sampling: f64,
    pub total_cost_bottles: f64,
    pub average_cost_per_ml_sampling: f64,
    pub average_cost_per_ml_bottles: f64,
}

impl KpiSet {
    pub fn get(&self, label: KpiLabel) -> f64 {
        match label {
            KpiLabel::UniqueFragrances => self.unique_fragrances as f64,
            KpiLabel::UniqueHouses => self.unique_houses as f64,
            KpiLabel::TotalMlSamples => self.total_ml_samples,
            KpiLabel::TotalMlBottles => self.total_ml_bottles,
            KpiLabel::TotalCostSampling => self.total_cost_sampling,
            KpiLabel::TotalCostBottles => self.total_cost_bottles,
            KpiLabel::AverageCostPerMlSampling => self.average_cost_per_ml_sampling,
            KpiLabel::AverageCostPerMlBottles => self.average_cost_per_ml_bottles,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (KpiLabel, f64)> + '_ {
        KpiLabel::ALL.into_iter().map(move |label| (label, self.get(label)))
    }
}

// Serialized as a label -> value object in panel order.
impl Serialize for KpiSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Value(#[serde(with = "missing")] f64);

        let mut map = serializer.serialize_map(Some(KpiLabel::ALL.len()))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label.as_str(), &Value(value))?;
        }
        map.end()
    }
}

/// The grouping key of one aggregate row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupValue {
    Date(NaiveDate),
    House(String),
    Rating(f64),
}

impl fmt::Display for GroupValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            GroupValue::House(house) => f.write_str(house),
            GroupValue::Rating(rating) => write!(f, "{}", rating),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupValue,
    #[serde(with = "missing")]
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// The six charts of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    OrderCost,
    OrderAmount,
    OrderRating,
    HouseRating,
    FragrancesPerHouse,
    RatingHistogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::OrderCost,
        ChartKind::OrderAmount,
        ChartKind::OrderRating,
        ChartKind::HouseRating,
        ChartKind::FragrancesPerHouse,
        ChartKind::RatingHistogram,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::OrderCost => "Cost per Order",
            ChartKind::OrderAmount => "Fragrances per Order",
            ChartKind::OrderRating => "Rating per Order",
            ChartKind::HouseRating => "Average Rating per House",
            ChartKind::FragrancesPerHouse => "Fragrances per House",
            ChartKind::RatingHistogram => "Rating Distribution",
        }
    }

    /// Vertical bars for date and rating axes, horizontal for the per-house charts.
    pub fn orientation(&self) -> Orientation {
        match self {
            ChartKind::HouseRating | ChartKind::FragrancesPerHouse => Orientation::Horizontal,
            _ => Orientation::Vertical,
        }
    }

    /// Value-axis range hint; ratings live in [0, 5] and get a little headroom.
    pub fn value_range(&self) -> Option<[f64; 2]> {
        match self {
            ChartKind::OrderRating | ChartKind::HouseRating => Some([0.0, 5.5]),
            _ => None,
        }
    }
}

/// One chart-ready grouped view of the purchase table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub kind: ChartKind,
    pub title: &'static str,
    pub orientation: Orientation,
    pub value_range: Option<[f64; 2]>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn new(kind: ChartKind, rows: Vec<AggregateRow>) -> Self {
        AggregateTable {
            kind,
            title: kind.title(),
            orientation: kind.orientation(),
            value_range: kind.value_range(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of the row keyed by `key`, if any.
    pub fn value_of(&self, key: &GroupValue) -> Option<f64> {
        self.rows.iter().find(|row| &row.key == key).map(|row| row.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    pub order_cost: AggregateTable,
    pub order_amount: AggregateTable,
    pub order_rating: AggregateTable,
    pub house_rating: AggregateTable,
    pub fragrances_per_house: AggregateTable,
    pub rating_histogram: AggregateTable,
}

impl Aggregates {
    pub fn get(&self, kind: ChartKind) -> &AggregateTable {
        match kind {
            ChartKind::OrderCost => &self.order_cost,
            ChartKind::OrderAmount => &self.order_amount,
            ChartKind::OrderRating => &self.order_rating,
            ChartKind::HouseRating => &self.house_rating,
            ChartKind::FragrancesPerHouse => &self.fragrances_per_house,
            ChartKind::RatingHistogram => &self.rating_histogram,
        }
    }

    /// Tables in dashboard order.
    pub fn iter(&self) -> impl Iterator<Item = &AggregateTable> + '_ {
        ChartKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}
