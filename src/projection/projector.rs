use std::collections::HashMap;
use chrono::{Datelike, Duration, NaiveDate, Timelike};
use tracing::debug;
use crate::models::{first_of_month, last_of_month, local_now, BoardGrid, BucketKey, GridLayout, OverflowPolicy, Shipment, TimeBucket, ViewMode, ViewState};

/// Maps a shipment collection onto the buckets of a calendar view.
///
/// Projection is pure: the same shipments, view and `today` always yield the same grid.
#[derive(Debug, Clone, Default)]
pub struct TimeBucketProjector {
    layout: GridLayout,
}

impl TimeBucketProjector {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Calendar days covered by a view.
    ///
    /// Month views pad the leading and trailing partial weeks so the grid is made of whole weeks.
    pub fn visible_days(&self, view: &ViewState) -> Vec<NaiveDate> {
        let (start, end) = match view.mode {
            ViewMode::Month => (
                self.layout.week_start_of(first_of_month(view.anchor)),
                self.layout.week_end_of(last_of_month(view.anchor)),
            ),
            ViewMode::Week => (
                self.layout.week_start_of(view.anchor),
                self.layout.week_end_of(view.anchor),
            ),
            ViewMode::Day => (view.anchor, view.anchor),
        };
        start.iter_days().take_while(|d| *d <= end).collect()
    }

    /// Bucket keys of a view in display order.
    pub fn bucket_keys(&self, view: &ViewState) -> Vec<BucketKey> {
        let days = self.visible_days(view);
        if view.mode.is_hourly() {
            days.into_iter()
                .flat_map(|day| self.layout.hours().map(move |hour| BucketKey::Hour(day, hour)))
                .collect()
        } else {
            days.into_iter().map(BucketKey::Day).collect()
        }
    }

    /// Projects shipments into the buckets of `view`.
    ///
    /// Placement only ever looks at `delivery_date`; shipments without one are listed as unscheduled
    /// and shipments whose date no bucket covers are listed as outside.
    pub fn project(&self, shipments: &[Shipment], view: &ViewState, today: NaiveDate) -> BoardGrid {
        let days = self.visible_days(view);
        let (visible_limit, overflow) = if view.mode.is_hourly() {
            (self.layout.hour_visible, OverflowPolicy::DetailList)
        } else {
            (self.layout.month_visible, OverflowPolicy::ExpandInline)
        };

        let mut buckets: Vec<TimeBucket> = self.bucket_keys(view)
            .into_iter()
            .map(|key| TimeBucket {
                key,
                shipments: Vec::new(),
                visible_limit,
                overflow,
                in_anchor_month: key.date().year() == view.anchor.year()
                    && key.date().month() == view.anchor.month(),
                is_today: key.date() == today,
            })
            .collect();
        let index: HashMap<BucketKey, usize> = buckets.iter()
            .enumerate()
            .map(|(i, b)| (b.key, i))
            .collect();

        let mut outside = Vec::new();
        let mut unscheduled = Vec::new();
        for shipment in shipments {
            let Some(ts) = shipment.delivery_date else {
                unscheduled.push(shipment.id.clone());
                continue;
            };
            let key = if view.mode.is_hourly() {
                BucketKey::Hour(ts.date(), ts.hour())
            } else {
                BucketKey::Day(ts.date())
            };
            match index.get(&key) {
                Some(&i) => buckets[i].shipments.push(shipment.clone()),
                None => outside.push(shipment.id.clone()),
            }
        }

        for bucket in &mut buckets {
            bucket.shipments.sort_by(|a, b| {
                a.delivery_date.cmp(&b.delivery_date).then_with(|| a.id.cmp(&b.id))
            });
        }

        debug!(
            "Projected {} shipments into {} {} buckets ({} outside, {} unscheduled)",
            shipments.len(), buckets.len(), view.mode, outside.len(), unscheduled.len()
        );

        BoardGrid {
            view: *view,
            days,
            buckets,
            outside,
            unscheduled,
        }
    }

    pub fn project_now(&self, shipments: &[Shipment], view: &ViewState) -> BoardGrid {
        self.project(shipments, view, local_now().date())
    }

    /// Days of the week ending on `day`, oldest first.
    pub fn trailing_week(day: NaiveDate) -> Vec<NaiveDate> {
        (0..7).rev().map(|i| day - Duration::days(i)).collect()
    }
}
