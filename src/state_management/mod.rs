pub mod shipment_store;
pub mod drag_session;
pub mod reschedule_engine;

pub use shipment_store::{PendingMutation, ShipmentStore};
pub use drag_session::{candidate_timestamp, DragSession, DragSessionManager, DragState, DropOutcome, DroppedSession};
pub use reschedule_engine::{InFlightReschedule, RescheduleEngine, RescheduleOutcome};
