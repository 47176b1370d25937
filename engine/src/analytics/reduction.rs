// Missing-aware reductions: non-finite values are skipped by sum and mean,
// every row counts towards count.
use shared::models::Purchase;

/// Numeric purchase field a reduction reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SampleMl,
    SampleCost,
    BottleMl,
    BottleCost,
    Amount,
    Rating,
    SampleCostMl,
    BottleCostMl,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::SampleMl => "sample_ml",
            Field::SampleCost => "sample_cost",
            Field::BottleMl => "bottle_ml",
            Field::BottleCost => "bottle_cost",
            Field::Amount => "amount",
            Field::Rating => "rating",
            Field::SampleCostMl => "sample_cost_ml",
            Field::BottleCostMl => "bottle_cost_ml",
        }
    }

    pub fn read(&self, purchase: &Purchase) -> f64 {
        match self {
            Field::SampleMl => purchase.sample_ml,
            Field::SampleCost => purchase.sample_cost,
            Field::BottleMl => purchase.bottle_ml,
            Field::BottleCost => purchase.bottle_cost,
            Field::Amount => purchase.amount,
            Field::Rating => purchase.rating,
            Field::SampleCostMl => purchase.sample_cost_ml,
            Field::BottleCostMl => purchase.bottle_cost_ml,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum(Field),
    Mean(Field),
    Count,
}

impl Reduction {
    pub fn name(&self) -> &'static str {
        match self {
            Reduction::Sum(_) => "sum",
            Reduction::Mean(_) => "mean",
            Reduction::Count => "count",
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            Reduction::Sum(field) | Reduction::Mean(field) => Some(*field),
            Reduction::Count => None,
        }
    }

    /// Reduces all of `records` at once.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a Purchase>) -> f64 {
        let mut acc = Accumulator::default();
        for purchase in records {
            acc.push(self, purchase);
        }
        acc.finish(self)
    }
}

/// Running state for one group.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
    sum: f64,
    present: usize,
    rows: usize,
}

impl Accumulator {
    pub fn push(&mut self, reduction: &Reduction, purchase: &Purchase) {
        self.rows += 1;
        if let Some(field) = reduction.field() {
            let value = field.read(purchase);
            if value.is_finite() {
                self.sum += value;
                self.present += 1;
            }
        }
    }

    pub fn finish(&self, reduction: &Reduction) -> f64 {
        match reduction {
            Reduction::Sum(_) => self.sum,
            Reduction::Mean(_) if self.present == 0 => f64::NAN,
            Reduction::Mean(_) => self.sum / self.present as f64,
            Reduction::Count => self.rows as f64,
        }
    }
}
