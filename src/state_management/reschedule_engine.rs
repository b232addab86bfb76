use std::sync::Arc;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, warn};
use crate::alerting::{Notification, Notifier};
use crate::errors::{BoardError, BoardResult};
use crate::models::timestamp::to_wire_timestamp;
use crate::models::ShipmentId;
use crate::services::{RescheduleRequest, ShipmentBackend};
use crate::state_management::shipment_store::{PendingMutation, ShipmentStore};

/// How a reschedule ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RescheduleOutcome {
    /// The candidate equals the stored value; nothing was written or sent.
    Unchanged,
    /// The backend accepted the candidate.
    Confirmed {
        shipment_id: ShipmentId,
        delivery_date: NaiveDateTime,
    },
    /// The backend call failed and the original value was restored.
    RolledBack {
        shipment_id: ShipmentId,
        restored: Option<NaiveDateTime>,
        reason: String,
    },
}

impl RescheduleOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, RescheduleOutcome::Confirmed { .. })
    }
}

/// Applies delivery-date changes to the store before the backend confirms them and reconciles afterwards.
#[derive(Clone)]
pub struct RescheduleEngine {
    store: Arc<ShipmentStore>,
    backend: Arc<dyn ShipmentBackend>,
    notifier: Arc<dyn Notifier>,
    resync_on_success: bool,
}

impl RescheduleEngine {
    /// Creates a new `RescheduleEngine`.
    ///
    /// # Arguments
    ///
    /// * `store` - The shipment store to mutate.
    /// * `backend` - The remote store receiving the reschedule call.
    /// * `notifier` - Where success and failure toasts go.
    pub fn new(store: Arc<ShipmentStore>, backend: Arc<dyn ShipmentBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            backend,
            notifier,
            resync_on_success: true,
        }
    }

    /// Whether a confirmed reschedule is followed by a full refresh.
    pub fn with_resync(mut self, resync_on_success: bool) -> Self {
        self.resync_on_success = resync_on_success;
        self
    }

    pub fn store(&self) -> &Arc<ShipmentStore> {
        &self.store
    }

    pub fn backend(&self) -> &Arc<dyn ShipmentBackend> {
        &self.backend
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Validates the candidate and applies it to the store, without any I/O.
    ///
    /// When this returns `Ok(Some(_))` the store already shows the candidate. The returned handle owns the
    /// pending mutation; settle it to issue the backend call. Dropping it unsettled rolls the change back.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(InFlightReschedule))` once the candidate is visible
    /// * `Ok(None)` when the candidate equals the stored value
    /// * `Err(BoardError)` for an invalid candidate, an unknown shipment or one already in flight;
    ///   the store is untouched
    pub fn begin(&self, id: &ShipmentId, candidate: NaiveDateTime) -> BoardResult<Option<InFlightReschedule>> {
        let delivery_date = to_wire_timestamp(&candidate)?;
        let Some(mutation) = self.store.begin_reschedule(id, candidate)? else {
            return Ok(None);
        };
        Ok(Some(InFlightReschedule {
            engine: self.clone(),
            request: RescheduleRequest { id: id.clone(), delivery_date },
            mutation,
            settled: false,
        }))
    }

    /// Reschedules a shipment: optimistic write, backend call, then confirm or roll back.
    ///
    /// Backend failures are recovered here and reported as `RescheduleOutcome::RolledBack`; only failures
    /// that happen before the store is touched are returned as errors.
    pub async fn reschedule(&self, id: &ShipmentId, candidate: NaiveDateTime) -> BoardResult<RescheduleOutcome> {
        match self.begin(id, candidate)? {
            Some(in_flight) => Ok(in_flight.settle().await),
            None => Ok(RescheduleOutcome::Unchanged),
        }
    }

    async fn confirm(&self, mutation: &PendingMutation) -> RescheduleOutcome {
        self.store.confirm_reschedule(&mutation.shipment_id);
        info!("Reschedule of {} to {} confirmed", mutation.shipment_id, mutation.candidate);
        self.notifier.notify(Notification::RescheduleConfirmed {
            shipment_id: mutation.shipment_id.clone(),
            delivery_date: mutation.candidate,
        });

        if self.resync_on_success {
            if let Err(e) = self.store.refresh(self.backend.as_ref()).await {
                warn!("Resync after reschedule of {} failed: {}", mutation.shipment_id, e);
                self.notifier.notify(Notification::RefreshFailed { reason: e.to_string() });
            }
        }

        RescheduleOutcome::Confirmed {
            shipment_id: mutation.shipment_id.clone(),
            delivery_date: mutation.candidate,
        }
    }

    fn rollback(&self, mutation: &PendingMutation, cause: BoardError) -> RescheduleOutcome {
        self.store.rollback_reschedule(&mutation.shipment_id);
        let reason = match cause {
            BoardError::ServerRejected { message, .. } => message,
            other => other.to_string(),
        };
        error!(
            "Reschedule of {} failed, restored {:?}: {}",
            mutation.shipment_id, mutation.original, reason
        );
        self.notifier.notify(Notification::RescheduleFailed {
            shipment_id: mutation.shipment_id.clone(),
            restored: mutation.original,
            reason: reason.clone(),
        });
        RescheduleOutcome::RolledBack {
            shipment_id: mutation.shipment_id.clone(),
            restored: mutation.original,
            reason,
        }
    }
}

/// A reschedule whose candidate is already in the store and whose backend call has not settled.
pub struct InFlightReschedule {
    engine: RescheduleEngine,
    request: RescheduleRequest,
    mutation: PendingMutation,
    settled: bool,
}

impl InFlightReschedule {
    pub fn mutation(&self) -> &PendingMutation {
        &self.mutation
    }

    pub fn request(&self) -> &RescheduleRequest {
        &self.request
    }

    /// Issues the backend call and reconciles the store with its result.
    pub async fn settle(mut self) -> RescheduleOutcome {
        let result = self.engine.backend.update_delivery_date(&self.request).await;
        self.settled = true;
        match result {
            Ok(()) => self.engine.confirm(&self.mutation).await,
            Err(e) => self.engine.rollback(&self.mutation, e),
        }
    }
}

impl Drop for InFlightReschedule {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Reschedule of {} abandoned before settling; rolling back", self.mutation.shipment_id);
            self.engine.store.rollback_reschedule(&self.mutation.shipment_id);
        }
    }
}
