// Plain-text and JSON renderings of a dashboard snapshot.
use shared::models::{AggregateTable, KpiSet};
use shared::utils::format_fixed;

use super::dashboard_service::DashboardSnapshot;
use crate::config::OutputFormat;
use crate::error::EngineError;

/// KPI values are always shown with two decimals.
pub const KPI_DECIMALS: usize = 2;

pub fn render(snapshot: &DashboardSnapshot, format: OutputFormat) -> Result<String, EngineError> {
    match format {
        OutputFormat::Text => Ok(render_text(snapshot)),
        OutputFormat::Json => snapshot.to_json(),
    }
}

pub fn render_kpis(kpis: &KpiSet) -> String {
    let mut out = String::from("KPIs\n");
    for (label, value) in kpis.iter() {
        out.push_str(&format!("{}: {}\n", label, format_fixed(value, KPI_DECIMALS)));
    }
    out
}

pub fn render_chart(table: &AggregateTable) -> String {
    let mut out = format!("{}\n", table.title);
    if table.is_empty() {
        out.push_str("  (no data)\n");
    }
    for row in &table.rows {
        out.push_str(&format!("  {}: {}\n", row.key, format_fixed(row.value, KPI_DECIMALS)));
    }
    out
}

pub fn render_text(snapshot: &DashboardSnapshot) -> String {
    let mut out = render_kpis(&snapshot.kpis);
    out.push_str("\nOrders\n");
    for table in snapshot.aggregates.iter() {
        out.push('\n');
        out.push_str(&render_chart(table));
    }
    out
}
