use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use crate::models::ShipmentId;

/// User-facing outcome of a board operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    RescheduleConfirmed {
        shipment_id: ShipmentId,
        delivery_date: NaiveDateTime,
    },
    RescheduleFailed {
        shipment_id: ShipmentId,
        restored: Option<NaiveDateTime>,
        reason: String,
    },
    RefreshFailed {
        reason: String,
    },
}

impl Notification {
    pub fn is_error(&self) -> bool {
        !matches!(self, Notification::RescheduleConfirmed { .. })
    }

    /// Text shown in the toast.
    pub fn message(&self) -> String {
        match self {
            Notification::RescheduleConfirmed { .. } => "Delivery date has been updated.".to_string(),
            Notification::RescheduleFailed { reason, .. } => {
                format!("Failed to update delivery date: {}", reason)
            }
            Notification::RefreshFailed { reason } => {
                format!("Failed to load shipments: {}", reason)
            }
        }
    }
}

/// Receives notifications for display. Implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match &notification {
            Notification::RescheduleConfirmed { shipment_id, delivery_date } => {
                info!("Shipment {} rescheduled to {}", shipment_id, delivery_date)
            }
            Notification::RescheduleFailed { shipment_id, .. } => {
                error!("Shipment {}: {}", shipment_id, notification.message())
            }
            Notification::RefreshFailed { .. } => warn!("{}", notification.message()),
        }
    }
}

/// Forwards notifications over a channel to whatever renders them.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            warn!("Notification dropped, receiver closed: {:?}", e.0);
        }
    }
}
