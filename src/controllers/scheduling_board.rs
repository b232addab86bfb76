//! # Scheduling Board Controller

//! The `SchedulingBoard` ties the store, projector, drag state machine, reschedule engine and summary
//! aggregator together. A rendering layer holds one board, renders `grid()` and dispatches pointer events
//! into `begin_drag`, `drop_on` and `cancel_drag`.

use std::collections::HashSet;
use std::sync::Arc;
use chrono::NaiveDate;
use tracing::{debug, info, warn};
use crate::alerting::Notification;
use crate::config::BoardSettings;
use crate::errors::{BoardError, BoardResult};
use crate::models::{local_now, BoardGrid, BucketKey, DropTarget, GridLayout, Shipment, ShipmentId, ViewMode, ViewState};
use crate::projection::summary::select;
use crate::projection::{KpiSnapshot, PeriodSummary, Selection, SummaryAggregator, TimeBucketProjector};
use crate::state_management::{DragSession, DragSessionManager, DragState, DropOutcome, InFlightReschedule, RescheduleEngine, RescheduleOutcome, ShipmentStore};

pub struct SchedulingBoard {
    engine: RescheduleEngine,
    projector: TimeBucketProjector,
    aggregator: SummaryAggregator,
    view: ViewState,
    drag: DragSessionManager,
    expanded_days: HashSet<NaiveDate>,
    selection: Option<Selection>,
}

impl SchedulingBoard {
    /// Creates a board over the engine's store.
    ///
    /// # Arguments
    ///
    /// * `engine` - The reschedule engine, which also provides the store and backend.
    /// * `layout` - Shape of the month, week and day grids.
    /// * `view` - The initial view.
    /// * `can_drag` - Capability flag; without it cards cannot be picked up.
    pub fn new(engine: RescheduleEngine, layout: GridLayout, view: ViewState, can_drag: bool) -> Self {
        Self {
            engine,
            projector: TimeBucketProjector::new(layout),
            aggregator: SummaryAggregator::default(),
            view,
            drag: DragSessionManager::new(can_drag),
            expanded_days: HashSet::new(),
            selection: None,
        }
    }

    /// Creates a board anchored on today using the board settings.
    pub fn from_settings(engine: RescheduleEngine, settings: &BoardSettings) -> Self {
        let can_drag = settings.can_drag(settings.operator_role.as_deref());
        let mut board = Self::new(
            engine,
            settings.grid_layout(),
            ViewState::today(settings.default_view),
            can_drag,
        );
        board.aggregator = SummaryAggregator::new(settings.top_n);
        board
    }

    pub fn store(&self) -> &Arc<ShipmentStore> {
        self.engine.store()
    }

    pub fn engine(&self) -> &RescheduleEngine {
        &self.engine
    }

    pub fn layout(&self) -> &GridLayout {
        self.projector.layout()
    }

    // ---- view ----

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn title(&self) -> String {
        self.view.title(self.projector.layout())
    }

    pub fn set_view(&mut self, view: ViewState) {
        if view != self.view {
            if self.drag.is_dragging() {
                self.drag.reset();
            }
            self.view = view;
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.set_view(self.view.with_mode(mode));
    }

    pub fn go_previous(&mut self) {
        self.set_view(self.view.previous());
    }

    pub fn go_next(&mut self) {
        self.set_view(self.view.next());
    }

    pub fn go_today(&mut self) {
        self.set_view(ViewState::new(self.view.mode, local_now().date()));
    }

    // ---- rendering ----

    /// Projects the current store contents into the active view.
    pub fn grid(&self) -> BoardGrid {
        self.grid_at(local_now().date())
    }

    pub fn grid_at(&self, today: NaiveDate) -> BoardGrid {
        self.projector.project(&self.store().snapshot(), &self.view, today)
    }

    pub fn is_expanded(&self, date: NaiveDate) -> bool {
        self.expanded_days.contains(&date)
    }

    /// Expands or collapses a month-view day cell. Hourly views have no inline expansion.
    ///
    /// # Returns
    ///
    /// The new expansion state of the day.
    pub fn toggle_expanded(&mut self, date: NaiveDate) -> bool {
        if self.view.mode != ViewMode::Month {
            return false;
        }
        if !self.expanded_days.remove(&date) {
            self.expanded_days.insert(date);
        }
        self.is_expanded(date)
    }

    // ---- selection and summaries ----

    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Routes an overflowing hour bucket to the detail list.
    pub fn open_bucket_details(&mut self, key: BucketKey) {
        self.selection = Some(match key {
            BucketKey::Day(date) => Selection::Day(date),
            BucketKey::Hour(date, hour) => Selection::Hour(date, hour),
        });
    }

    /// Detail list for the current selection.
    pub fn selected_shipments(&self) -> Vec<Shipment> {
        let Some(selection) = self.selection else {
            return Vec::new();
        };
        let snapshot = self.store().snapshot();
        select(&snapshot, &selection).into_iter().cloned().collect()
    }

    pub fn selection_summary(&self) -> Option<PeriodSummary> {
        let selection = self.selection?;
        Some(self.aggregator.summarize_selection(&self.store().snapshot(), &selection))
    }

    /// Summary of everything placed in the active view.
    pub fn summary(&self) -> PeriodSummary {
        self.aggregator.summarize_grid(&self.grid())
    }

    pub fn bucket_summary(&self, key: &BucketKey) -> Option<PeriodSummary> {
        let grid = self.grid();
        grid.bucket(key).map(|bucket| self.aggregator.summarize_bucket(bucket))
    }

    pub fn kpis(&self, reference_day: NaiveDate) -> KpiSnapshot {
        KpiSnapshot::compute(&self.store().snapshot(), reference_day)
    }

    // ---- drag and drop ----

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn can_drag(&self) -> bool {
        self.drag.can_drag()
    }

    /// Picks up a card.
    pub fn begin_drag(&mut self, id: &ShipmentId) -> BoardResult<DragSession> {
        let shipment = self.store().get(id)
            .ok_or_else(|| BoardError::ShipmentNotFound(id.to_string()))?;
        let in_flight = self.store().is_pending(id);
        self.drag.pick_up(&shipment, self.view.mode, in_flight)
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Releases the card over `target` (`None` for outside the grid).
    ///
    /// A valid move is applied to the store before this returns; the returned handle issues the backend
    /// call when settled. Targets that are not buckets of the active view are treated as outside.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(InFlightReschedule))` when the store now shows the candidate
    /// * `Ok(None)` when the drop was cancelled or changed nothing
    /// * `Err(BoardError)` when no drag was active or the candidate was rejected before any write
    pub fn drop_on(&mut self, target: Option<DropTarget>) -> BoardResult<Option<InFlightReschedule>> {
        let target = target.filter(|t| {
            let valid = self.projector.bucket_keys(&self.view).contains(&BucketKey::from(*t));
            if !valid {
                debug!("Drop target {:?} is not part of the {} view", t, self.view.mode);
            }
            valid
        });

        let dropped = match self.drag.drop_on(target)? {
            DropOutcome::Moved(dropped) => dropped,
            DropOutcome::Cancelled | DropOutcome::Unchanged => return Ok(None),
        };

        match self.engine.begin(&dropped.session.shipment_id, dropped.candidate) {
            Ok(Some(in_flight)) => Ok(Some(in_flight)),
            Ok(None) => {
                self.drag.reset();
                Ok(None)
            }
            Err(e) => {
                warn!("Drop of {} rejected: {}", dropped.session.shipment_id, e);
                self.drag.reset();
                Err(e)
            }
        }
    }

    /// Records the backend's verdict on the last drop.
    pub fn settle_drag(&mut self, outcome: &RescheduleOutcome) {
        match outcome {
            RescheduleOutcome::Confirmed { shipment_id, .. } => self.drag.settle(shipment_id, true),
            RescheduleOutcome::RolledBack { shipment_id, .. } => self.drag.settle(shipment_id, false),
            RescheduleOutcome::Unchanged => {}
        }
    }

    /// Drops, waits for the backend and records the verdict.
    pub async fn drop_and_reschedule(&mut self, target: Option<DropTarget>) -> BoardResult<RescheduleOutcome> {
        let Some(in_flight) = self.drop_on(target)? else {
            return Ok(RescheduleOutcome::Unchanged);
        };
        let outcome = in_flight.settle().await;
        self.settle_drag(&outcome);
        Ok(outcome)
    }

    // ---- refresh ----

    /// Reloads the store from the backend, notifying on failure.
    pub async fn refresh(&self) -> BoardResult<usize> {
        match self.store().refresh(self.engine.backend().as_ref()).await {
            Ok(count) => {
                info!("Board refreshed: {} shipments", count);
                Ok(count)
            }
            Err(e) => {
                self.engine.notifier().notify(Notification::RefreshFailed { reason: e.to_string() });
                Err(e)
            }
        }
    }
}
