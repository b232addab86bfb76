//! # Board View State

//! Transient view selection for the scheduling board: which granularity is shown, which date anchors it,
//! and how the grids are laid out. Nothing here is persisted.

use chrono::{Datelike, Duration, Local, Months, NaiveDate, Weekday};
use derive_more::{Display, FromStr};
use serde::{Deserialize, Serialize};

/// Calendar granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, FromStr)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Day buckets covering complete weeks around the anchor month.
    #[default]
    Month,
    /// Seven days, each split into hour buckets.
    Week,
    /// The anchor day split into hour buckets.
    Day,
}

impl ViewMode {
    /// Whether drop targets in this view carry an hour.
    pub fn is_hourly(&self) -> bool {
        matches!(self, ViewMode::Week | ViewMode::Day)
    }
}

/// Fixed shape of the grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub week_start: Weekday,
    /// First hour bucket of the hourly grids.
    pub first_hour: u32,
    /// Last hour bucket of the hourly grids, inclusive.
    pub last_hour: u32,
    /// Cards shown in a month-view day cell before the "+N" badge.
    pub month_visible: usize,
    /// Cards shown in an hour bucket before the "+N" badge.
    pub hour_visible: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        GridLayout {
            week_start: Weekday::Sun,
            first_hour: 6,
            last_hour: 20,
            month_visible: 2,
            hour_visible: 1,
        }
    }
}

impl GridLayout {
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.first_hour..=self.last_hour.min(23)
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.first_hour && hour <= self.last_hour.min(23)
    }

    pub fn week_start_of(&self, date: NaiveDate) -> NaiveDate {
        let offset = (7 + date.weekday().num_days_from_sunday() as i64
            - self.week_start.num_days_from_sunday() as i64) % 7;
        date - Duration::days(offset)
    }

    pub fn week_end_of(&self, date: NaiveDate) -> NaiveDate {
        self.week_start_of(date) + Duration::days(6)
    }
}

/// Where a dragged card was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropTarget {
    /// A month-view day cell.
    Day(NaiveDate),
    /// An hour bucket of the week or day view.
    Hour(NaiveDate, u32),
}

impl DropTarget {
    pub fn date(&self) -> NaiveDate {
        match self {
            DropTarget::Day(date) | DropTarget::Hour(date, _) => *date,
        }
    }
}

/// The active view mode and the date it is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: ViewMode,
    pub anchor: NaiveDate,
}

impl ViewState {
    pub fn new(mode: ViewMode, anchor: NaiveDate) -> Self {
        Self { mode, anchor }
    }

    pub fn today(mode: ViewMode) -> Self {
        Self::new(mode, Local::now().date_naive())
    }

    /// Steps back one period. Month view lands on the last day of the previous month.
    pub fn previous(&self) -> Self {
        let anchor = match self.mode {
            ViewMode::Month => first_of_month(self.anchor).pred_opt().unwrap_or(self.anchor),
            ViewMode::Week => self.anchor - Duration::days(7),
            ViewMode::Day => self.anchor - Duration::days(1),
        };
        Self::new(self.mode, anchor)
    }

    /// Steps forward one period. Month view lands on the first day of the next month.
    pub fn next(&self) -> Self {
        let anchor = match self.mode {
            ViewMode::Month => last_of_month(self.anchor).succ_opt().unwrap_or(self.anchor),
            ViewMode::Week => self.anchor + Duration::days(7),
            ViewMode::Day => self.anchor + Duration::days(1),
        };
        Self::new(self.mode, anchor)
    }

    pub fn with_mode(&self, mode: ViewMode) -> Self {
        Self::new(mode, self.anchor)
    }

    pub fn title(&self, layout: &GridLayout) -> String {
        match self.mode {
            ViewMode::Month => self.anchor.format("%B %Y").to_string(),
            ViewMode::Week => format!(
                "{} – {}",
                layout.week_start_of(self.anchor).format("%b %-d"),
                layout.week_end_of(self.anchor).format("%b %-d, %Y")
            ),
            ViewMode::Day => self.anchor.format("%A, %B %-d, %Y").to_string(),
        }
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}
