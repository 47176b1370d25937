// Group-by-then-reduce over the purchase table.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use shared::models::{AggregateRow, GroupValue, Purchase};

use super::reduction::{Accumulator, Reduction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    OrderDate,
    House,
    Rating,
}

impl GroupKey {
    pub fn name(&self) -> &'static str {
        match self {
            GroupKey::OrderDate => "order_date",
            GroupKey::House => "house",
            GroupKey::Rating => "rating",
        }
    }

    // Rows with a missing rating fall out of rating groups.
    fn extract(&self, purchase: &Purchase) -> Option<SortKey> {
        match self {
            GroupKey::OrderDate => Some(SortKey::Date(purchase.order_date)),
            GroupKey::House => Some(SortKey::House(purchase.house.clone())),
            GroupKey::Rating if purchase.rating.is_nan() => None,
            // + 0.0 folds -0.0 into 0.0
            GroupKey::Rating => Some(SortKey::Rating(RatingKey(purchase.rating + 0.0))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Natural key order (dates ascending, houses lexicographic, ratings ascending).
    ByKey,
    /// Stable ascending sort on the reduced value, NaN last.
    ByValue,
}

// Totally ordered rating, NaN already filtered out.
#[derive(Debug, Clone, Copy)]
struct RatingKey(f64);

impl PartialEq for RatingKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RatingKey {}

impl PartialOrd for RatingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RatingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Date(NaiveDate),
    House(String),
    Rating(RatingKey),
}

impl From<SortKey> for GroupValue {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Date(date) => GroupValue::Date(date),
            SortKey::House(house) => GroupValue::House(house),
            SortKey::Rating(RatingKey(rating)) => GroupValue::Rating(rating),
        }
    }
}

fn compare_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// One grouped view: key dimension, reduction and row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedReduction {
    pub key: GroupKey,
    pub reduction: Reduction,
    pub order: RowOrder,
}

impl GroupedReduction {
    pub const fn new(key: GroupKey, reduction: Reduction, order: RowOrder) -> Self {
        GroupedReduction { key, reduction, order }
    }

    pub fn parameters(&self) -> Value {
        serde_json::json!({
            "key": self.key.name(),
            "reduction": self.reduction.name(),
            "field": self.reduction.field().map(|f| f.name()),
            "order": match self.order {
                RowOrder::ByKey => "key",
                RowOrder::ByValue => "value",
            },
        })
    }

    pub fn apply(&self, records: &[Purchase]) -> Vec<AggregateRow> {
        let mut groups: BTreeMap<SortKey, Accumulator> = BTreeMap::new();
        for purchase in records {
            if let Some(key) = self.key.extract(purchase) {
                groups.entry(key).or_default().push(&self.reduction, purchase);
            }
        }

        let mut rows: Vec<AggregateRow> = groups
            .into_iter()
            .map(|(key, acc)| AggregateRow {
                key: key.into(),
                value: acc.finish(&self.reduction),
            })
            .collect();

        if self.order == RowOrder::ByValue {
            // sort_by is stable: equal values keep key order
            rows.sort_by(|a, b| compare_nan_last(a.value, b.value));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::reduction::Field;

    fn create_purchase(house: &str, day: u32, sample_cost: f64, rating: f64) -> Purchase {
        let date = NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
        Purchase {
            house: house.to_string(),
            fragrance: "X".to_string(),
            order_date: date,
            arrival_date: date,
            shipping_date: date,
            sample_ml: 1.0,
            sample_cost,
            bottle_ml: 0.0,
            bottle_cost: 0.0,
            amount: 1.0,
            rating,
            sample_cost_ml: sample_cost,
            bottle_cost_ml: f64::NAN,
        }
    }

    fn keys(rows: &[AggregateRow]) -> Vec<String> {
        rows.iter().map(|r| r.key.to_string()).collect()
    }

    #[test]
    fn test_dates_in_natural_order() {
        let records = vec![
            create_purchase("A", 9, 1.0, 1.0),
            create_purchase("A", 2, 2.0, 1.0),
            create_purchase("A", 9, 3.0, 1.0),
        ];
        let rows = GroupedReduction::new(GroupKey::OrderDate, Reduction::Sum(Field::SampleCost), RowOrder::ByKey)
            .apply(&records);
        assert_eq!(keys(&rows), ["2023-01-02", "2023-01-09"]);
        assert_eq!(rows[1].value, 4.0);
    }

    #[test]
    fn test_value_order_is_stable_and_nan_last() {
        let records = vec![
            create_purchase("D", 1, 1.0, f64::NAN),
            create_purchase("C", 1, 1.0, 3.0),
            create_purchase("B", 1, 1.0, 1.0),
            create_purchase("A", 1, 1.0, 3.0),
        ];
        let rows = GroupedReduction::new(GroupKey::House, Reduction::Mean(Field::Rating), RowOrder::ByValue)
            .apply(&records);
        // A and C tie; lexicographic group order decides
        assert_eq!(keys(&rows), ["B", "A", "C", "D"]);
        assert!(rows[3].value.is_nan());
    }

    #[test]
    fn test_rating_groups_skip_missing_and_fold_negative_zero() {
        let records = vec![
            create_purchase("A", 1, 1.0, 4.5),
            create_purchase("A", 1, 1.0, f64::NAN),
            create_purchase("A", 1, 1.0, 0.0),
            create_purchase("A", 1, 1.0, -0.0),
            create_purchase("A", 1, 1.0, 4.5),
        ];
        let rows = GroupedReduction::new(GroupKey::Rating, Reduction::Count, RowOrder::ByKey).apply(&records);
        assert_eq!(
            rows,
            vec![
                AggregateRow { key: GroupValue::Rating(0.0), value: 2.0 },
                AggregateRow { key: GroupValue::Rating(4.5), value: 2.0 },
            ]
        );
    }

    #[test]
    fn test_empty_records() {
        let rows = GroupedReduction::new(GroupKey::House, Reduction::Count, RowOrder::ByValue).apply(&[]);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parameters() {
        let params = GroupedReduction::new(GroupKey::OrderDate, Reduction::Mean(Field::Rating), RowOrder::ByKey)
            .parameters();
        assert_eq!(
            params,
            serde_json::json!({ "key": "order_date", "reduction": "mean", "field": "rating", "order": "key" })
        );
    }
}
