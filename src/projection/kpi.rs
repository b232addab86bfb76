use chrono::NaiveDate;
use serde::Serialize;
use crate::models::{EffectiveStatus, Shipment, ShipmentStatus};
use crate::projection::TimeBucketProjector;

/// Headline delivery rates over a set of shipments, as whole percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub total: usize,
    pub received_rate: u32,
    pub missed_rate: u32,
    /// Received or not yet received, i.e. neither delayed, undecided nor missed.
    pub on_time_rate: u32,
    /// Received and never flagged as a missed delivery.
    pub otif_rate: u32,
    /// Shipment counts for the seven days ending on the reference day, oldest first.
    pub daily_trend: Vec<(NaiveDate, usize)>,
}

impl KpiSnapshot {
    pub fn compute(shipments: &[Shipment], reference_day: NaiveDate) -> Self {
        let total = shipments.len();
        let count = |status: EffectiveStatus| {
            shipments.iter().filter(|s| s.effective_status() == status).count()
        };
        let received = count(EffectiveStatus::Received);
        let not_received = count(EffectiveStatus::NotReceived);
        let missed = count(EffectiveStatus::Missed);
        let perfect = shipments.iter()
            .filter(|s| s.status == ShipmentStatus::Received && !s.missed_delivery)
            .count();

        let daily_trend = TimeBucketProjector::trailing_week(reference_day)
            .into_iter()
            .map(|day| {
                let n = shipments.iter()
                    .filter(|s| s.summary_timestamp().is_some_and(|ts| ts.date() == day))
                    .count();
                (day, n)
            })
            .collect();

        KpiSnapshot {
            total,
            received_rate: percent(received, total),
            missed_rate: percent(missed, total),
            on_time_rate: percent(received + not_received, total),
            otif_rate: percent(perfect, total),
            daily_trend,
        }
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 * 100.0 / total as f64).round() as u32
}
