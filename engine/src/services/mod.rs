// Thin reporting layer: runs the pipeline and renders its output.
pub mod dashboard_service;
pub mod report;

pub use dashboard_service::{DashboardService, DashboardSnapshot};
