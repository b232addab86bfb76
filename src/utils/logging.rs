use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_appender::non_blocking::WorkerGuard;
use anyhow::Result;
use crate::config::LoggingSettings;

const NOISY_CRATES: &str = "reqwest=warn,hyper=warn";

/// Initializes the logging system for the shipment board
///
/// Logs go to the console and, when a directory is configured, to a file named
/// `shipment-board_{current_date}.log` (or the configured file name) inside it.
/// The filter comes from `RUST_LOG` when set, otherwise from the configured level with the HTTP stack held at "warn"
///
/// # Arguments
///
/// * `settings`: The logging section of the application settings
///
/// # Returns
///
/// * `Ok(Some(WorkerGuard))`: If logging is initialized with a file appender; keep the guard alive to flush the file
/// * `Ok(None)`: If logging is initialized console only
/// * `Err(anyhow::Error)`: If the filter is invalid, the directory cannot be created or a subscriber is already set
pub fn init_logger(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(&settings.level)))?;

    let format = fmt::format()
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    let console_layer = fmt::Layer::default()
        .event_format(format.clone().with_ansi(true))
        .with_writer(std::io::stdout);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    match settings.path.clone() {
        Some(path) => {
            std::fs::create_dir_all(&path)?;
            let file_name = settings.file.clone().unwrap_or_else(|| {
                format!("shipment-board_{}.log", chrono::Local::now().format("%Y-%m-%d"))
            });
            let file_appender = RollingFileAppender::new(Rotation::NEVER, &path, &file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::Layer::default()
                .event_format(format)
                .with_writer(non_blocking);

            tracing::subscriber::set_global_default(subscriber.with(file_layer))?;
            tracing::info!("Logging initialized, writing to {}", path.join(&file_name).display());
            Ok(Some(guard))
        }
        None => {
            tracing::subscriber::set_global_default(subscriber)?;
            tracing::info!("Logging initialized successfully (console only)");
            Ok(None)
        }
    }
}

/// Builds the fallback filter directive for a configured level.
pub fn default_filter(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("{},{}", level, NOISY_CRATES)
}
