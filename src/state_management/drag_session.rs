//! # Drag Sessions

//! A drag-and-drop gesture as an explicit state machine. The rendering layer only dispatches pick-up,
//! drop and cancel events; every transition here is synchronous and free of I/O.
//!
//! `Idle → Dragging → Dropped → {Confirmed | RolledBack}`. A drop outside the grid, or one that would not
//! change the timestamp, falls straight back to `Idle`.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use tracing::{debug, info};
use crate::errors::{BoardError, BoardResult};
use crate::models::{DropTarget, Shipment, ShipmentId, ViewMode};

/// Payload captured at pick-up. The original timestamp is never re-read during the drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragSession {
    pub shipment_id: ShipmentId,
    pub original: NaiveDateTime,
    pub view: ViewMode,
}

/// A drag that landed on a valid bucket with a new timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedSession {
    pub session: DragSession,
    pub target: DropTarget,
    pub candidate: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DragState {
    Idle,
    Dragging(DragSession),
    Dropped(DroppedSession),
    Confirmed(ShipmentId),
    RolledBack(ShipmentId),
}

/// Result of releasing a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DropOutcome {
    /// Released outside any bucket.
    Cancelled,
    /// Released where the timestamp would not change.
    Unchanged,
    /// Released on a new slot; hand this to the reschedule engine.
    Moved(DroppedSession),
}

/// Computes the new delivery timestamp for a drop.
///
/// Day targets keep the original time of day. Hour targets take the hour from the target and keep the
/// original minutes and seconds.
pub fn candidate_timestamp(original: &NaiveDateTime, target: &DropTarget) -> BoardResult<NaiveDateTime> {
    match target {
        DropTarget::Day(date) => Ok(date.and_time(original.time())),
        DropTarget::Hour(date, hour) => {
            NaiveTime::from_hms_opt(*hour, original.minute(), original.second())
                .map(|time| date.and_time(time))
                .ok_or_else(|| BoardError::InvalidTimestamp(format!("hour {} on {}", hour, date)))
        }
    }
}

/// Tracks the single gesture the operator is performing.
#[derive(Debug, Clone)]
pub struct DragSessionManager {
    can_drag: bool,
    state: DragState,
}

impl DragSessionManager {
    /// `can_drag` is the caller's capability flag; without it every pick-up is refused.
    pub fn new(can_drag: bool) -> Self {
        Self { can_drag, state: DragState::Idle }
    }

    pub fn can_drag(&self) -> bool {
        self.can_drag
    }

    pub fn set_can_drag(&mut self, can_drag: bool) {
        self.can_drag = can_drag;
        if !can_drag && matches!(self.state, DragState::Dragging(_)) {
            self.state = DragState::Idle;
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// `Idle → Dragging`.
    ///
    /// Refused when dragging is not permitted, when another gesture is underway, when the shipment has no
    /// delivery date, or when `in_flight` reports an unsettled reschedule for it.
    pub fn pick_up(&mut self, shipment: &Shipment, view: ViewMode, in_flight: bool) -> BoardResult<DragSession> {
        if !self.can_drag {
            return Err(BoardError::DragNotPermitted);
        }
        if let DragState::Dragging(current) = &self.state {
            return Err(BoardError::DragInProgress(current.shipment_id.to_string()));
        }
        if in_flight {
            return Err(BoardError::RescheduleInFlight(shipment.id.to_string()));
        }
        let original = shipment.delivery_date
            .ok_or_else(|| BoardError::InvalidTimestamp(format!("shipment {} has no delivery date", shipment.id)))?;

        debug!("Picked up shipment {} at {}", shipment.id, original);
        let session = DragSession {
            shipment_id: shipment.id.clone(),
            original,
            view,
        };
        self.state = DragState::Dragging(session.clone());
        Ok(session)
    }

    /// `Dragging → Dropped`, or back to `Idle` when there is nothing to do.
    ///
    /// A target of the wrong granularity for the session's view counts as outside the grid.
    pub fn drop_on(&mut self, target: Option<DropTarget>) -> BoardResult<DropOutcome> {
        let session = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(session) => session,
            other => {
                self.state = other;
                return Err(BoardError::NoActiveDrag);
            }
        };

        let Some(target) = target else {
            debug!("Shipment {} released outside the grid", session.shipment_id);
            return Ok(DropOutcome::Cancelled);
        };
        let granularity_matches = matches!(
            (session.view.is_hourly(), target),
            (true, DropTarget::Hour(..)) | (false, DropTarget::Day(_))
        );
        if !granularity_matches {
            debug!("Shipment {} released on {:?}, not a {} bucket", session.shipment_id, target, session.view);
            return Ok(DropOutcome::Cancelled);
        }

        let candidate = candidate_timestamp(&session.original, &target)?;
        if candidate == session.original {
            return Ok(DropOutcome::Unchanged);
        }

        info!("Shipment {} dropped: {} -> {}", session.shipment_id, session.original, candidate);
        let dropped = DroppedSession { session, target, candidate };
        self.state = DragState::Dropped(dropped.clone());
        Ok(DropOutcome::Moved(dropped))
    }

    /// Abandons the gesture without effect.
    pub fn cancel(&mut self) {
        if !matches!(self.state, DragState::Dropped(_)) {
            self.state = DragState::Idle;
        }
    }

    /// Forces the machine back to `Idle`, discarding any dropped session.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// `Dropped → Confirmed | RolledBack`. The session itself is discarded either way.
    ///
    /// Outcomes for any shipment other than the last dropped one are ignored.
    pub fn settle(&mut self, shipment_id: &ShipmentId, confirmed: bool) {
        if let DragState::Dropped(dropped) = &self.state {
            if &dropped.session.shipment_id == shipment_id {
                self.state = if confirmed {
                    DragState::Confirmed(shipment_id.clone())
                } else {
                    DragState::RolledBack(shipment_id.clone())
                };
            }
        }
    }
}
