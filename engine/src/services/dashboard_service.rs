// Load -> KPIs -> aggregates, once or on a refresh interval.
use std::time::Instant;

use serde::Serialize;
use shared::models::{Aggregates, KpiSet, PurchaseTable};

use crate::analytics::{self, CHARTS};
use crate::config::EngineSettings;
use crate::data::FragranceCsvParser;
use crate::error::EngineError;

/// Everything one load cycle produces. Built fresh each cycle, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub table: PurchaseTable,
    pub kpis: KpiSet,
    pub aggregates: Aggregates,
}

impl DashboardSnapshot {
    pub fn from_table(table: PurchaseTable) -> Self {
        let kpis = analytics::compute_kpis(&table);
        let aggregates = analytics::compute_aggregates(&table);
        DashboardSnapshot { table, kpis, aggregates }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

pub struct DashboardService {
    settings: EngineSettings,
}

impl DashboardService {
    pub fn new(settings: EngineSettings) -> Self {
        DashboardService { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn load_snapshot(&self) -> Result<DashboardSnapshot, EngineError> {
        let path = &self.settings.data_path;
        tracing::info!(path = %path.display(), "Loading purchase log");
        let started = Instant::now();

        let table = FragranceCsvParser::load_from_path(path)?;
        let snapshot = DashboardSnapshot::from_table(table);

        for chart in CHARTS.iter() {
            tracing::debug!(
                chart = chart.kind.title(),
                parameters = %chart.parameters(),
                rows = snapshot.aggregates.get(chart.kind).rows.len(),
                "Aggregated chart"
            );
        }
        tracing::info!(
            records = snapshot.table.len(),
            unique_houses = snapshot.kpis.unique_houses,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dashboard snapshot ready"
        );
        Ok(snapshot)
    }

    /// Runs load cycles and hands each outcome to `on_cycle`.
    ///
    /// Without a refresh interval a single cycle runs. With one, cycles repeat
    /// until `max_cycles` is reached (forever when `None`); a failed cycle is
    /// logged and the next tick retries from scratch.
    pub async fn watch<F>(&self, max_cycles: Option<usize>, mut on_cycle: F)
    where
        F: FnMut(Result<DashboardSnapshot, EngineError>),
    {
        let Some(period) = self.settings.refresh_interval() else {
            on_cycle(self.load_snapshot());
            return;
        };

        let mut ticker = tokio::time::interval(period);
        let mut cycles = 0usize;
        while max_cycles.map_or(true, |max| cycles < max) {
            ticker.tick().await;
            cycles += 1;

            let result = self.load_snapshot();
            if let Err(e) = &result {
                if e.is_load_failure() {
                    tracing::warn!(cycle = cycles, error = %e, "Dashboard refresh could not load the purchase log");
                } else {
                    tracing::error!(cycle = cycles, error = %e, "Dashboard refresh failed");
                }
            }
            on_cycle(result);
        }
    }
}
