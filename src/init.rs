use std::sync::Arc;
use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use crate::alerting::{LogNotifier, Notifier};
use crate::config::Settings;
use crate::controllers::SchedulingBoard;
use crate::services::{HttpShipmentBackend, ShipmentBackend};
use crate::state_management::{RescheduleEngine, ShipmentStore};
use crate::utils::logging;

/// Everything the runner needs, wired together.
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub store: Arc<ShipmentStore>,
    pub backend: Arc<dyn ShipmentBackend>,
    pub notifier: Arc<dyn Notifier>,
    pub board: SchedulingBoard,
    /// Flushes the log file when dropped.
    pub log_guard: Option<WorkerGuard>,
}

/// Loads settings, starts logging and builds the board over the HTTP backend.
pub fn initialize() -> Result<AppContext> {
    let settings = Arc::new(Settings::new()?);
    let log_guard = logging::init_logger(&settings.logging)?;
    info!("Starting shipment board with {}", settings.backend);

    let backend: Arc<dyn ShipmentBackend> = Arc::new(HttpShipmentBackend::new(&settings.backend)?);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    Ok(build_context(settings, backend, notifier, log_guard))
}

/// Wires a context around an already constructed backend and notifier.
pub fn build_context(
    settings: Arc<Settings>,
    backend: Arc<dyn ShipmentBackend>,
    notifier: Arc<dyn Notifier>,
    log_guard: Option<WorkerGuard>,
) -> AppContext {
    let store = Arc::new(ShipmentStore::new());
    let engine = RescheduleEngine::new(Arc::clone(&store), Arc::clone(&backend), Arc::clone(&notifier))
        .with_resync(settings.board.resync_on_success);
    let board = SchedulingBoard::from_settings(engine, &settings.board);
    if !board.can_drag() {
        info!("Operator role {:?} may not drag shipments", settings.board.operator_role);
    }

    AppContext {
        settings,
        store,
        backend,
        notifier,
        board,
        log_guard,
    }
}
