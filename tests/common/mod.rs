#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use shipment_board::alerting::{ChannelNotifier, Notification};
use shipment_board::errors::{BoardError, BoardResult};
use shipment_board::models::{timestamp::parse_timestamp, LineItem, PartyRef, Shipment, ShipmentId, ShipmentStatus};
use shipment_board::services::{RescheduleRequest, ShipmentBackend};
use shipment_board::state_management::{RescheduleEngine, ShipmentStore};

pub fn dt(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("test timestamp")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("test date")
}

pub fn id(raw: &str) -> ShipmentId {
    ShipmentId::from(raw)
}

pub fn shipment(raw_id: &str, delivery: &str) -> Shipment {
    Shipment::new(raw_id, Some(dt(delivery)))
}

pub fn unscheduled(raw_id: &str) -> Shipment {
    Shipment::new(raw_id, None)
}

/// Fluent tweaks for fixtures.
pub trait ShipmentFixture {
    fn status(self, status: ShipmentStatus) -> Self;
    fn missed(self) -> Self;
    fn courier(self, name: &str) -> Self;
    fn supplier(self, name: &str) -> Self;
    fn quantities(self, quantities: &[Option<f64>]) -> Self;
    fn actual(self, raw: &str) -> Self;
}

impl ShipmentFixture for Shipment {
    fn status(mut self, status: ShipmentStatus) -> Self {
        self.status = status;
        self
    }

    fn missed(mut self) -> Self {
        self.missed_delivery = true;
        self
    }

    fn courier(mut self, name: &str) -> Self {
        self.courier = Some(name.to_string());
        self
    }

    fn supplier(mut self, name: &str) -> Self {
        self.supplier = Some(PartyRef { id: None, name: Some(name.to_string()) });
        self
    }

    fn quantities(mut self, quantities: &[Option<f64>]) -> Self {
        self.items = quantities.iter()
            .map(|q| LineItem { quantity: *q, ..LineItem::default() })
            .collect();
        self
    }

    fn actual(mut self, raw: &str) -> Self {
        self.actual_delivery_date = Some(dt(raw));
        self
    }
}

/// In-memory backend that records every call and fails on request.
#[derive(Default)]
pub struct MockBackend {
    records: Mutex<Vec<Shipment>>,
    requests: Mutex<Vec<RescheduleRequest>>,
    update_failures: Mutex<VecDeque<BoardError>>,
    fetch_failures: Mutex<VecDeque<BoardError>>,
    fetches: Mutex<usize>,
    gate: Option<Arc<Semaphore>>,
    fetch_gate: Option<Arc<Semaphore>>,
}

impl MockBackend {
    pub fn new(records: Vec<Shipment>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// A backend whose reschedule calls wait until the returned semaphore hands out a permit.
    pub fn gated(records: Vec<Shipment>) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            records: Mutex::new(records),
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        (backend, gate)
    }

    /// A backend whose fetches snapshot the records immediately but only answer once the returned
    /// semaphore hands out a permit, like a slow GET served from an older state.
    pub fn gated_fetch(records: Vec<Shipment>) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            records: Mutex::new(records),
            fetch_gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        (backend, gate)
    }

    pub fn fail_next_update(&self, error: BoardError) {
        self.update_failures.lock().push_back(error);
    }

    pub fn fail_next_fetch(&self, error: BoardError) {
        self.fetch_failures.lock().push_back(error);
    }

    pub fn requests(&self) -> Vec<RescheduleRequest> {
        self.requests.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock()
    }

    pub fn set_records(&self, records: Vec<Shipment>) {
        *self.records.lock() = records;
    }
}

#[async_trait]
impl ShipmentBackend for MockBackend {
    async fn fetch_shipments(&self) -> BoardResult<Vec<Shipment>> {
        *self.fetches.lock() += 1;
        if let Some(error) = self.fetch_failures.lock().pop_front() {
            return Err(error);
        }
        let records = self.records.lock().clone();
        if let Some(gate) = &self.fetch_gate {
            gate.acquire().await.expect("fetch gate open").forget();
        }
        Ok(records)
    }

    async fn update_delivery_date(&self, request: &RescheduleRequest) -> BoardResult<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        self.requests.lock().push(request.clone());
        if let Some(error) = self.update_failures.lock().pop_front() {
            return Err(error);
        }
        let delivery = parse_timestamp(&request.delivery_date)?;
        if let Some(record) = self.records.lock().iter_mut().find(|s| s.id == request.id) {
            record.delivery_date = Some(delivery);
        }
        Ok(())
    }
}

/// Store, backend and engine wired together, with notifications captured on a channel.
pub struct Harness {
    pub store: Arc<ShipmentStore>,
    pub backend: Arc<MockBackend>,
    pub engine: RescheduleEngine,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new(shipments: Vec<Shipment>) -> Self {
        Self::with_backend(shipments.clone(), MockBackend::new(shipments))
    }

    pub fn with_backend(shipments: Vec<Shipment>, backend: MockBackend) -> Self {
        let store = Arc::new(ShipmentStore::with_shipments(shipments));
        let backend = Arc::new(backend);
        let (notifier, notifications) = ChannelNotifier::new();
        let engine = RescheduleEngine::new(Arc::clone(&store), backend.clone(), Arc::new(notifier))
            .with_resync(false);
        Self { store, backend, engine, notifications }
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }
}
