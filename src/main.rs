use std::time::Duration;
use anyhow::Result;
use tracing::{error, info};
use tokio::signal::ctrl_c;
use tokio::time::interval;
use shipment_board::init::{initialize, AppContext};
use shipment_board::projection::PeriodSummary;

/// The main entry point of the shipment board runner
///
/// Loads the configuration, keeps the shipment store in sync with the backend and logs a summary of the active
/// view after every refresh
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

/// The core loop of the shipment board runner
///
/// 1. Loads settings and initializes logging
/// 2. Builds the HTTP backend, shipment store and scheduling board
/// 3. Refreshes the store on the configured interval, logging the active view's summary
/// 4. Stops on Ctrl-C
///
/// # Returns
///
/// * `Ok(())` if the runner shuts down gracefully
/// * `Err(anyhow::Error)` if initialization fails
async fn run() -> Result<()> {
    let AppContext { settings, board, log_guard: _log_guard, .. } = initialize()?;

    let period = Duration::from_secs(settings.board.refresh_interval_secs.max(1));
    let mut refresh_interval = interval(period);

    loop {
        tokio::select! {
            _ = refresh_interval.tick() => {
                info!("Refreshing shipments for {}", board.title());
                match board.refresh().await {
                    Ok(_) => log_summary(&board.title(), &board.summary()),
                    Err(e) => error!("Error during refresh cycle: {}", e),
                }
            }
            _ = ctrl_c() => {
                info!("Received shutdown signal. Shutting down gracefully...");
                break;
            }
        }
    }
    Ok(())
}

fn log_summary(title: &str, summary: &PeriodSummary) {
    info!("{}: {} shipments, {} units", title, summary.total, summary.total_quantity);
    for (status, count) in summary.by_status.iter() {
        info!("  {}: {}", status, count);
    }
    if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
        info!("  Window: {} .. {}", earliest, latest);
    }
}
