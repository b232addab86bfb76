//! # Time Buckets

//! Derived, render-only groupings of shipments. A `BoardGrid` is rebuilt from the store on every render
//! and is never written back anywhere.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use crate::models::{DropTarget, Shipment, ShipmentId, ViewState};

/// The span a bucket covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BucketKey {
    /// A whole calendar day (month view).
    Day(NaiveDate),
    /// One hour of one day (week and day views).
    Hour(NaiveDate, u32),
}

impl BucketKey {
    pub fn date(&self) -> NaiveDate {
        match self {
            BucketKey::Day(date) | BucketKey::Hour(date, _) => *date,
        }
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        match self {
            BucketKey::Day(date) => timestamp.date() == *date,
            BucketKey::Hour(date, hour) => timestamp.date() == *date && timestamp.hour() == *hour,
        }
    }

    pub fn as_drop_target(&self) -> DropTarget {
        match self {
            BucketKey::Day(date) => DropTarget::Day(*date),
            BucketKey::Hour(date, hour) => DropTarget::Hour(*date, *hour),
        }
    }
}

impl From<DropTarget> for BucketKey {
    fn from(target: DropTarget) -> Self {
        match target {
            DropTarget::Day(date) => BucketKey::Day(date),
            DropTarget::Hour(date, hour) => BucketKey::Hour(date, hour),
        }
    }
}

/// What to do with the cards beyond a bucket's visible limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverflowPolicy {
    /// Month view: the cell can be expanded in place.
    ExpandInline,
    /// Week and day views: the badge opens a detail list instead.
    DetailList,
}

/// One slot of the grid with the shipments that fall inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub key: BucketKey,
    /// Shipments ordered by delivery date, then id.
    pub shipments: Vec<Shipment>,
    /// How many cards are shown before the overflow badge.
    pub visible_limit: usize,
    pub overflow: OverflowPolicy,
    /// Month view only: whether the day belongs to the anchor month.
    pub in_anchor_month: bool,
    pub is_today: bool,
}

impl TimeBucket {
    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }

    /// Cards to draw, honouring an in-place expansion.
    pub fn visible(&self, expanded: bool) -> &[Shipment] {
        if expanded && self.overflow == OverflowPolicy::ExpandInline {
            &self.shipments
        } else {
            &self.shipments[..self.shipments.len().min(self.visible_limit)]
        }
    }

    /// Number behind the "+N" badge.
    pub fn hidden_count(&self, expanded: bool) -> usize {
        self.shipments.len() - self.visible(expanded).len()
    }

    pub fn ids(&self) -> Vec<ShipmentId> {
        self.shipments.iter().map(|s| s.id.clone()).collect()
    }
}

/// The projected board for one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardGrid {
    pub view: ViewState,
    /// Calendar days covered, in order.
    pub days: Vec<NaiveDate>,
    /// Buckets in display order (day-major for hourly grids).
    pub buckets: Vec<TimeBucket>,
    /// Shipments with a delivery date that no bucket covers.
    pub outside: Vec<ShipmentId>,
    /// Shipments without a delivery date.
    pub unscheduled: Vec<ShipmentId>,
}

impl BoardGrid {
    pub fn bucket(&self, key: &BucketKey) -> Option<&TimeBucket> {
        self.buckets.iter().find(|b| b.key == *key)
    }

    /// Every bucket on the given day.
    pub fn buckets_on(&self, date: NaiveDate) -> impl Iterator<Item = &TimeBucket> {
        self.buckets.iter().filter(move |b| b.key.date() == date)
    }

    /// Shipments placed on the given day, across its buckets.
    pub fn shipments_on(&self, date: NaiveDate) -> Vec<&Shipment> {
        self.buckets_on(date).flat_map(|b| b.shipments.iter()).collect()
    }

    pub fn shipments(&self) -> impl Iterator<Item = &Shipment> {
        self.buckets.iter().flat_map(|b| b.shipments.iter())
    }

    /// Locates the bucket currently holding a shipment.
    pub fn bucket_of(&self, id: &ShipmentId) -> Option<&TimeBucket> {
        self.buckets.iter().find(|b| b.shipments.iter().any(|s| &s.id == id))
    }

    /// Whether a drop target names a bucket of this grid.
    pub fn accepts(&self, target: &DropTarget) -> bool {
        self.bucket(&BucketKey::from(*target)).is_some()
    }
}
