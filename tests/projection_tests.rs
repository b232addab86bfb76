mod common;

use std::collections::HashSet;
use chrono::Weekday;
use common::{date, dt, id, shipment, unscheduled};
use shipment_board::models::{BucketKey, GridLayout, OverflowPolicy, Shipment, ShipmentId, ViewMode, ViewState};
use shipment_board::projection::TimeBucketProjector;

fn projector() -> TimeBucketProjector {
    TimeBucketProjector::new(GridLayout::default())
}

fn ids(raw: &[&str]) -> Vec<ShipmentId> {
    raw.iter().map(|r| id(r)).collect()
}

#[test]
fn test_month_grid_covers_whole_weeks() {
    let view = ViewState::new(ViewMode::Month, date(2024, 3, 10));
    let grid = projector().project(&[], &view, date(2024, 3, 10));

    assert_eq!(grid.days.len(), 42);
    assert_eq!(grid.days.first(), Some(&date(2024, 2, 25)));
    assert_eq!(grid.days.last(), Some(&date(2024, 4, 6)));
    assert_eq!(grid.buckets.len(), 42);
    assert!(grid.buckets.iter().all(|b| matches!(b.key, BucketKey::Day(_))));
    assert!(grid.buckets.iter().all(|b| b.overflow == OverflowPolicy::ExpandInline && b.visible_limit == 2));

    let leading = grid.bucket(&BucketKey::Day(date(2024, 2, 25))).unwrap();
    assert!(!leading.in_anchor_month);
    let first = grid.bucket(&BucketKey::Day(date(2024, 3, 1))).unwrap();
    assert!(first.in_anchor_month);
    let today = grid.bucket(&BucketKey::Day(date(2024, 3, 10))).unwrap();
    assert!(today.is_today);
    assert_eq!(grid.buckets.iter().filter(|b| b.is_today).count(), 1);
}

#[test]
fn test_month_grid_respects_configured_week_start() {
    let layout = GridLayout { week_start: Weekday::Mon, ..GridLayout::default() };
    let view = ViewState::new(ViewMode::Month, date(2024, 3, 10));
    let days = TimeBucketProjector::new(layout).visible_days(&view);

    assert_eq!(days.first(), Some(&date(2024, 2, 26)));
    assert_eq!(days.last(), Some(&date(2024, 3, 31)));
    assert_eq!(days.len(), 35);
}

#[test]
fn test_week_grid_is_days_by_hours() {
    let view = ViewState::new(ViewMode::Week, date(2024, 3, 12));
    let grid = projector().project(&[], &view, date(2024, 3, 12));

    assert_eq!(grid.days, (10..=16).map(|d| date(2024, 3, d)).collect::<Vec<_>>());
    assert_eq!(grid.buckets.len(), 7 * 15);
    assert_eq!(grid.buckets.first().unwrap().key, BucketKey::Hour(date(2024, 3, 10), 6));
    assert_eq!(grid.buckets.last().unwrap().key, BucketKey::Hour(date(2024, 3, 16), 20));
    assert!(grid.buckets.iter().all(|b| b.overflow == OverflowPolicy::DetailList && b.visible_limit == 1));
}

#[test]
fn test_day_grid_has_fifteen_hour_buckets() {
    let view = ViewState::new(ViewMode::Day, date(2024, 3, 12));
    let keys = projector().bucket_keys(&view);

    assert_eq!(keys.len(), 15);
    assert_eq!(keys[0], BucketKey::Hour(date(2024, 3, 12), 6));
    assert_eq!(keys[14], BucketKey::Hour(date(2024, 3, 12), 20));
}

#[test]
fn test_buckets_are_ordered_by_time_then_id() {
    let shipments = vec![
        shipment("c", "2024-03-12T09:30:00"),
        shipment("b", "2024-03-12T09:00:00"),
        shipment("a", "2024-03-12T09:00:00"),
        shipment("d", "2024-03-12T08:59:59"),
    ];

    let day = ViewState::new(ViewMode::Day, date(2024, 3, 12));
    let grid = projector().project(&shipments, &day, date(2024, 3, 1));
    assert_eq!(grid.bucket(&BucketKey::Hour(date(2024, 3, 12), 9)).unwrap().ids(), ids(&["a", "b", "c"]));
    assert_eq!(grid.bucket(&BucketKey::Hour(date(2024, 3, 12), 8)).unwrap().ids(), ids(&["d"]));

    let month = ViewState::new(ViewMode::Month, date(2024, 3, 12));
    let grid = projector().project(&shipments, &month, date(2024, 3, 1));
    assert_eq!(grid.bucket(&BucketKey::Day(date(2024, 3, 12))).unwrap().ids(), ids(&["d", "a", "b", "c"]));
}

#[test]
fn test_every_shipment_lands_exactly_once() {
    let shipments = vec![
        shipment("in-view", "2024-03-12T09:15:00"),
        shipment("early", "2024-03-12T05:30:00"),
        shipment("late", "2024-03-12T21:00:00"),
        shipment("next-month", "2024-05-01T10:00:00"),
        unscheduled("no-date"),
        Shipment::new("actual-only", None),
    ];

    for mode in [ViewMode::Month, ViewMode::Week, ViewMode::Day] {
        let view = ViewState::new(mode, date(2024, 3, 12));
        let grid = projector().project(&shipments, &view, date(2024, 3, 12));

        let mut seen: Vec<ShipmentId> = grid.shipments().map(|s| s.id.clone()).collect();
        seen.extend(grid.outside.iter().cloned());
        seen.extend(grid.unscheduled.iter().cloned());
        let unique: HashSet<_> = seen.iter().cloned().collect();

        assert_eq!(seen.len(), shipments.len(), "{} view", mode);
        assert_eq!(unique.len(), shipments.len(), "{} view", mode);
        assert_eq!(grid.unscheduled, ids(&["no-date", "actual-only"]));
    }

    let week = ViewState::new(ViewMode::Week, date(2024, 3, 12));
    let grid = projector().project(&shipments, &week, date(2024, 3, 12));
    assert_eq!(grid.outside, ids(&["early", "late", "next-month"]));

    let month = ViewState::new(ViewMode::Month, date(2024, 3, 12));
    let grid = projector().project(&shipments, &month, date(2024, 3, 12));
    assert_eq!(grid.outside, ids(&["next-month"]));
}

#[test]
fn test_placement_ignores_actual_delivery_date() {
    let mut delivered = Shipment::new("delivered", None);
    delivered.actual_delivery_date = Some(dt("2024-03-12T10:00:00"));

    let view = ViewState::new(ViewMode::Month, date(2024, 3, 12));
    let grid = projector().project(&[delivered], &view, date(2024, 3, 12));

    assert_eq!(grid.shipments().count(), 0);
    assert_eq!(grid.unscheduled, ids(&["delivered"]));
}

#[test]
fn test_overflow_badges_and_expansion() {
    let shipments = vec![
        shipment("a", "2024-03-12T09:00:00"),
        shipment("b", "2024-03-12T09:10:00"),
        shipment("c", "2024-03-12T09:20:00"),
    ];

    let month = ViewState::new(ViewMode::Month, date(2024, 3, 12));
    let grid = projector().project(&shipments, &month, date(2024, 3, 12));
    let cell = grid.bucket(&BucketKey::Day(date(2024, 3, 12))).unwrap();
    assert_eq!(cell.visible(false).len(), 2);
    assert_eq!(cell.hidden_count(false), 1);
    assert_eq!(cell.visible(true).len(), 3);
    assert_eq!(cell.hidden_count(true), 0);

    let day = ViewState::new(ViewMode::Day, date(2024, 3, 12));
    let grid = projector().project(&shipments, &day, date(2024, 3, 12));
    let slot = grid.bucket(&BucketKey::Hour(date(2024, 3, 12), 9)).unwrap();
    assert_eq!(slot.visible(false).len(), 1);
    assert_eq!(slot.hidden_count(false), 2);
    // hour buckets never expand in place
    assert_eq!(slot.hidden_count(true), 2);
}

#[test]
fn test_projection_is_deterministic() {
    let shipments = vec![
        shipment("z", "2024-03-12T09:00:00"),
        shipment("y", "2024-03-14T13:45:00"),
        shipment("x", "2024-03-12T09:00:00"),
    ];
    let view = ViewState::new(ViewMode::Week, date(2024, 3, 12));

    let first = projector().project(&shipments, &view, date(2024, 3, 12));
    let mut reversed = shipments.clone();
    reversed.reverse();
    let second = projector().project(&reversed, &view, date(2024, 3, 12));

    assert_eq!(first.buckets, second.buckets);
    assert_eq!(first.bucket_of(&id("y")).unwrap().key, BucketKey::Hour(date(2024, 3, 14), 13));
}

#[test]
fn test_navigation_steps_per_view() {
    let month = ViewState::new(ViewMode::Month, date(2024, 3, 10));
    assert_eq!(month.previous().anchor, date(2024, 2, 29));
    assert_eq!(month.next().anchor, date(2024, 4, 1));
    assert_eq!(ViewState::new(ViewMode::Month, date(2024, 12, 31)).next().anchor, date(2025, 1, 1));

    let week = ViewState::new(ViewMode::Week, date(2024, 3, 12));
    assert_eq!(week.previous().anchor, date(2024, 3, 5));
    assert_eq!(week.next().anchor, date(2024, 3, 19));

    let day = ViewState::new(ViewMode::Day, date(2024, 3, 1));
    assert_eq!(day.previous().anchor, date(2024, 2, 29));
    assert_eq!(day.next().anchor, date(2024, 3, 2));
    assert_eq!(day.next().mode, ViewMode::Day);
}

#[test]
fn test_view_titles() {
    let layout = GridLayout::default();
    assert_eq!(ViewState::new(ViewMode::Month, date(2024, 3, 10)).title(&layout), "March 2024");
    assert_eq!(ViewState::new(ViewMode::Week, date(2024, 3, 12)).title(&layout), "Mar 10 – Mar 16, 2024");
    assert_eq!(ViewState::new(ViewMode::Day, date(2024, 3, 10)).title(&layout), "Sunday, March 10, 2024");
}
