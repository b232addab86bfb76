use std::collections::HashMap;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use crate::errors::{BoardError, BoardResult};
use crate::models::{local_now, Shipment, ShipmentId};
use crate::services::ShipmentBackend;

/// An optimistic reschedule waiting on the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub shipment_id: ShipmentId,
    /// Delivery date read when the mutation began; the rollback target.
    pub original: Option<NaiveDateTime>,
    pub candidate: NaiveDateTime,
    pub in_flight: bool,
    pub started_at: NaiveDateTime,
}

#[derive(Debug, Default)]
struct StoreState {
    shipments: Vec<Shipment>,
    index: HashMap<ShipmentId, usize>,
    pending: HashMap<ShipmentId, PendingMutation>,
    loading: bool,
    last_error: Option<String>,
    last_refreshed: Option<NaiveDateTime>,
    /// Bumped whenever a reschedule settles; a fetch that began under an older value is stale.
    settled_epoch: u64,
}

impl StoreState {
    fn reindex(&mut self) {
        self.index = self.shipments.iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
    }

    fn shipment_mut(&mut self, id: &ShipmentId) -> Option<&mut Shipment> {
        let i = *self.index.get(id)?;
        self.shipments.get_mut(i)
    }

    fn replace_records(&mut self, shipments: Vec<Shipment>) {
        self.shipments = shipments;
        self.reindex();
        let overlays: Vec<(ShipmentId, NaiveDateTime)> = self.pending.values()
            .map(|p| (p.shipment_id.clone(), p.candidate))
            .collect();
        for (id, candidate) in overlays {
            if let Some(shipment) = self.shipment_mut(&id) {
                shipment.delivery_date = Some(candidate);
            }
        }
        self.loading = false;
        self.last_error = None;
        self.last_refreshed = Some(local_now());
    }
}

/// In-memory cache of the backend's shipments.
///
/// Reads are open to everyone. Writes come from exactly two places: a full refresh from the backend and
/// the optimistic reschedule primitive (`begin_reschedule` with its `confirm`/`rollback` pair). Every write
/// bumps a version that renderers can watch to re-project.
pub struct ShipmentStore {
    state: RwLock<StoreState>,
    version: watch::Sender<u64>,
}

impl Default for ShipmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipmentStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            state: RwLock::new(StoreState::default()),
            version,
        }
    }

    /// Creates a store already holding `shipments`.
    pub fn with_shipments(shipments: Vec<Shipment>) -> Self {
        let store = Self::new();
        store.apply_refresh(shipments);
        store
    }

    // ---- reads ----

    pub fn snapshot(&self) -> Vec<Shipment> {
        self.state.read().shipments.clone()
    }

    pub fn get(&self, id: &ShipmentId) -> Option<Shipment> {
        let state = self.state.read();
        state.index.get(id).and_then(|&i| state.shipments.get(i).cloned())
    }

    pub fn delivery_date(&self, id: &ShipmentId) -> BoardResult<Option<NaiveDateTime>> {
        let state = self.state.read();
        state.index.get(id)
            .and_then(|&i| state.shipments.get(i))
            .map(|s| s.delivery_date)
            .ok_or_else(|| BoardError::ShipmentNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.state.read().shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    pub fn last_refreshed(&self) -> Option<NaiveDateTime> {
        self.state.read().last_refreshed
    }

    pub fn is_pending(&self, id: &ShipmentId) -> bool {
        self.state.read().pending.contains_key(id)
    }

    pub fn pending(&self, id: &ShipmentId) -> Option<PendingMutation> {
        self.state.read().pending.get(id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.state.read().pending.len()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Receiver that changes whenever the store is written.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    // ---- full refresh ----

    /// Reloads every record from the backend.
    ///
    /// On failure the previous records stay in place and the error is kept for display. A fetch that was
    /// overtaken by a reschedule settling while it ran is discarded, since the server answered before it
    /// held that reschedule.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` with the number of records now in the store
    /// * `Err(BoardError)` with the backend failure
    pub async fn refresh(&self, backend: &dyn ShipmentBackend) -> BoardResult<usize> {
        let started_epoch = {
            let mut state = self.state.write();
            state.loading = true;
            state.last_error = None;
            state.settled_epoch
        };
        self.bump();

        match backend.fetch_shipments().await {
            Ok(shipments) => {
                let count = shipments.len();
                let applied = {
                    let mut state = self.state.write();
                    if state.settled_epoch == started_epoch {
                        state.replace_records(shipments);
                        true
                    } else {
                        state.loading = false;
                        false
                    }
                };
                self.bump();
                if applied {
                    info!("Shipment store refreshed with {} records", count);
                    Ok(count)
                } else {
                    debug!("Discarded a refresh that started before a reschedule settled");
                    Ok(self.len())
                }
            }
            Err(e) => {
                warn!("Shipment refresh failed: {}", e);
                {
                    let mut state = self.state.write();
                    state.loading = false;
                    state.last_error = Some(e.to_string());
                }
                self.bump();
                Err(e)
            }
        }
    }

    /// Replaces the cached records with a fresh server copy.
    ///
    /// Candidates of reschedules still in flight are laid back over the fresh records so a shipment never
    /// shows anything but its original or its candidate while the backend is deciding.
    pub fn apply_refresh(&self, shipments: Vec<Shipment>) {
        self.state.write().replace_records(shipments);
        self.bump();
    }

    // ---- optimistic reschedule ----

    /// Reads the current delivery date, writes `candidate` and records the pending mutation, all under one
    /// write lock.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(PendingMutation))` once the candidate is visible
    /// * `Ok(None)` if the shipment already has that delivery date; nothing is written
    /// * `Err(BoardError::ShipmentNotFound)` if the id is unknown
    /// * `Err(BoardError::RescheduleInFlight)` if another reschedule for it has not settled
    pub fn begin_reschedule(&self, id: &ShipmentId, candidate: NaiveDateTime) -> BoardResult<Option<PendingMutation>> {
        let mutation = {
            let mut state = self.state.write();
            if state.pending.contains_key(id) {
                return Err(BoardError::RescheduleInFlight(id.to_string()));
            }
            let shipment = state.shipment_mut(id)
                .ok_or_else(|| BoardError::ShipmentNotFound(id.to_string()))?;
            let original = shipment.delivery_date;
            if original == Some(candidate) {
                return Ok(None);
            }
            shipment.delivery_date = Some(candidate);

            let mutation = PendingMutation {
                shipment_id: id.clone(),
                original,
                candidate,
                in_flight: true,
                started_at: local_now(),
            };
            state.pending.insert(id.clone(), mutation.clone());
            mutation
        };
        self.bump();
        debug!("Optimistically moved {} from {:?} to {}", id, mutation.original, candidate);
        Ok(Some(mutation))
    }

    /// Accepts the candidate as final and clears the pending entry.
    pub fn confirm_reschedule(&self, id: &ShipmentId) -> Option<PendingMutation> {
        let mutation = {
            let mut state = self.state.write();
            let mutation = state.pending.remove(id);
            if mutation.is_some() {
                state.settled_epoch += 1;
            }
            mutation
        };
        if mutation.is_some() {
            self.bump();
        }
        mutation
    }

    /// Restores the delivery date captured by `begin_reschedule` and clears the pending entry.
    ///
    /// The captured original is written regardless of what the store holds now.
    pub fn rollback_reschedule(&self, id: &ShipmentId) -> Option<PendingMutation> {
        let mutation = {
            let mut state = self.state.write();
            let mutation = state.pending.remove(id)?;
            state.settled_epoch += 1;
            match state.shipment_mut(id) {
                Some(shipment) => shipment.delivery_date = mutation.original,
                None => warn!("Shipment {} disappeared before its reschedule was rolled back", id),
            }
            mutation
        };
        self.bump();
        Some(mutation)
    }
}
