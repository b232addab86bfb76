pub mod backend;

pub use backend::{HttpShipmentBackend, RescheduleRequest, ShipmentBackend};
