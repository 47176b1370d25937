// Engine main entry point
use fragrance_engine::config::EngineSettings;
use fragrance_engine::services::{report, DashboardService};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    info!("Starting fragrance sampling engine...");

    let settings = EngineSettings::load_from_env()?;
    info!(
        data_path = %settings.data_path.display(),
        refresh_interval_secs = settings.refresh_interval_secs,
        "Settings loaded"
    );

    let output = settings.output;
    let service = DashboardService::new(settings);

    // A one-shot run fails hard; a refreshing run keeps going past bad cycles.
    if service.settings().refresh_interval().is_none() {
        let snapshot = service.load_snapshot()?;
        println!("{}", report::render(&snapshot, output)?);
        return Ok(());
    }

    service
        .watch(None, |result| {
            let Ok(snapshot) = result else { return };
            match report::render(&snapshot, output) {
                Ok(text) => println!("{}", text),
                Err(e) => error!(error = %e, "Failed to render dashboard"),
            }
        })
        .await;

    Ok(())
}
