// Helpers shared between the engine and any presentation layer:
// fixed-precision rendering and the "missing value" JSON encoding.

/// Renders `value` with exactly `decimals` fractional digits.
///
/// Missing values (NaN) render as `NaN` so an empty table still produces a
/// full KPI listing instead of failing.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    format!("{:.decimals$}", value, decimals = decimals)
}

/// Serde adapter for `f64` columns that may hold missing values.
///
/// Non-finite numbers are written as `null`; `null` reads back as NaN.
pub mod missing {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}
