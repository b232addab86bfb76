//! # Summary Aggregation

//! Read-side counts for the board's side panels: totals, effective-status breakdown, delivery window,
//! item quantity and the busiest couriers and suppliers. Everything here is recomputed from a bucket set
//! or a selection and never mutates anything.

use std::collections::HashMap;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use crate::models::{BoardGrid, EffectiveStatus, Shipment, TimeBucket};

/// Default length of the courier and supplier leaderboards.
pub const DEFAULT_TOP_N: usize = 5;

/// Shipment counts per effective status, in panel order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusCounts(Vec<(EffectiveStatus, usize)>);

impl StatusCounts {
    pub fn get(&self, status: &EffectiveStatus) -> usize {
        self.0.iter()
            .find(|(s, _)| s == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EffectiveStatus, usize)> {
        self.0.iter()
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }

    fn add(&mut self, status: EffectiveStatus) {
        match self.0.iter_mut().find(|(s, _)| *s == status) {
            Some((_, count)) => *count += 1,
            None => self.0.push((status, 1)),
        }
    }
}

/// A name with the number of shipments carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedName {
    pub name: String,
    pub count: usize,
}

/// Aggregates for one bucket, one day, or a whole view.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PeriodSummary {
    pub total: usize,
    pub by_status: StatusCounts,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
    /// Sum of item quantities over every shipment in the set.
    pub total_quantity: f64,
    pub top_couriers: Vec<RankedName>,
    pub top_suppliers: Vec<RankedName>,
}

/// A day or hour picked on the board for the detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Selection {
    Day(NaiveDate),
    Hour(NaiveDate, u32),
}

impl Selection {
    fn matches(&self, timestamp: &NaiveDateTime) -> bool {
        match self {
            Selection::Day(date) => timestamp.date() == *date,
            Selection::Hour(date, hour) => timestamp.date() == *date && timestamp.hour() == *hour,
        }
    }
}

/// Computes `PeriodSummary` values.
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    top_n: usize,
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl SummaryAggregator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Summarises an arbitrary set of shipments.
    pub fn summarize<'a, I>(&self, shipments: I) -> PeriodSummary
        where
            I: IntoIterator<Item = &'a Shipment>,
    {
        let mut summary = PeriodSummary::default();
        let mut couriers = Leaderboard::default();
        let mut suppliers = Leaderboard::default();

        for shipment in shipments {
            summary.total += 1;
            summary.by_status.add(shipment.effective_status());
            summary.total_quantity += shipment.total_quantity();
            if let Some(ts) = shipment.delivery_date {
                summary.earliest = Some(summary.earliest.map_or(ts, |e| e.min(ts)));
                summary.latest = Some(summary.latest.map_or(ts, |l| l.max(ts)));
            }
            couriers.record(shipment.courier_name());
            suppliers.record(shipment.supplier_name());
        }

        summary.by_status.0.sort_by_key(|(status, _)| status.rank());
        summary.top_couriers = couriers.top(self.top_n);
        summary.top_suppliers = suppliers.top(self.top_n);
        summary
    }

    pub fn summarize_bucket(&self, bucket: &TimeBucket) -> PeriodSummary {
        self.summarize(&bucket.shipments)
    }

    /// Summarises every bucketed shipment of a view.
    pub fn summarize_grid(&self, grid: &BoardGrid) -> PeriodSummary {
        self.summarize(grid.shipments())
    }

    /// Summarises the shipments the grid placed on one day.
    pub fn summarize_day(&self, grid: &BoardGrid, date: NaiveDate) -> PeriodSummary {
        self.summarize(grid.shipments_on(date))
    }

    /// Summarises an explicit day or hour selection straight from the store contents.
    pub fn summarize_selection(&self, shipments: &[Shipment], selection: &Selection) -> PeriodSummary {
        self.summarize(select(shipments, selection))
    }
}

/// Shipments belonging to a selection, ordered by time then id.
///
/// Unlike bucket placement this falls back to `actual_delivery_date` when no delivery date is planned.
pub fn select<'a>(shipments: &'a [Shipment], selection: &Selection) -> Vec<&'a Shipment> {
    let mut selected: Vec<&Shipment> = shipments.iter()
        .filter(|s| s.summary_timestamp().is_some_and(|ts| selection.matches(&ts)))
        .collect();
    selected.sort_by(|a, b| {
        a.summary_timestamp().cmp(&b.summary_timestamp()).then_with(|| a.id.cmp(&b.id))
    });
    selected
}

/// Counts names while remembering the order they were first seen in.
#[derive(Default)]
struct Leaderboard {
    counts: Vec<RankedName>,
    index: HashMap<String, usize>,
}

impl Leaderboard {
    fn record(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&i) => self.counts[i].count += 1,
            None => {
                self.index.insert(name.to_string(), self.counts.len());
                self.counts.push(RankedName { name: name.to_string(), count: 1 });
            }
        }
    }

    /// Highest counts first; ties keep first-seen order because the sort is stable.
    fn top(mut self, n: usize) -> Vec<RankedName> {
        self.counts.sort_by(|a, b| b.count.cmp(&a.count));
        self.counts.truncate(n);
        self.counts
    }
}
