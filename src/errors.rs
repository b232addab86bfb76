/// # Board Errors
/// This module defines the `BoardError` enum, which encapsulates every failure the scheduling board can report.
/// None of these are fatal: the store is always left consistent and callers decide how to surface them.


use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum BoardError {
    /// The shipment id is not present in the store.
    #[error("Shipment not found: {0}")]
    ShipmentNotFound(String),

    /// A reschedule for this shipment is still waiting on the backend.
    #[error("Reschedule already in flight for shipment {0}")]
    RescheduleInFlight(String),

    /// A computed or supplied delivery timestamp is not a usable local time.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The operator's capability flag does not allow dragging.
    #[error("Dragging is not permitted for this operator")]
    DragNotPermitted,

    /// A drag gesture is already underway.
    #[error("A drag is already in progress for shipment {0}")]
    DragInProgress(String),

    /// A drop or cancel arrived without a matching pick-up.
    #[error("No drag in progress")]
    NoActiveDrag,

    /// Represents errors establishing or completing an HTTP exchange.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// The backend answered with a non-2xx status.
    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// The backend answered 2xx but the body could not be understood.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents errors that occur during serialization or deserialization of data.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl BoardError {
    /// Returns true for failures that came back from the remote reschedule call.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BoardError::TransportError(_)
                | BoardError::ServerRejected { .. }
                | BoardError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for BoardError {
    fn from(err: reqwest::Error) -> Self {
        BoardError::TransportError(err.to_string())
    }
}

impl From<config::ConfigError> for BoardError {
    fn from(err: config::ConfigError) -> Self {
        BoardError::ConfigError(err.to_string())
    }
}

pub type BoardResult<T> = Result<T, BoardError>;
