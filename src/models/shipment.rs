//! # Shipment Records

//! This module defines the `Shipment` record the scheduling board works on, together with its
//! status vocabulary. The board only ever rewrites `delivery_date`; every other field is read-only here.

use chrono::NaiveDateTime;
use derive_more::{Display, From};
use serde::{Deserialize, Deserializer, Serialize};
use crate::models::timestamp;

/// Opaque, stable identity of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct ShipmentId(pub String);

impl ShipmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShipmentId {
    fn from(value: &str) -> Self {
        ShipmentId(value.to_string())
    }
}

/// Raw status as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ShipmentStatus {
    Received,
    #[display("Not Received")]
    NotReceived,
    Delay,
    #[display("TBD")]
    Tbd,
    /// No status recorded yet.
    #[default]
    Scheduled,
    /// Any status string outside the known vocabulary, kept verbatim.
    #[display("{_0}")]
    Other(String),
}

impl From<Option<String>> for ShipmentStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            None | Some("") => ShipmentStatus::Scheduled,
            Some("Received") => ShipmentStatus::Received,
            Some("Not Received") => ShipmentStatus::NotReceived,
            Some("Delay") => ShipmentStatus::Delay,
            Some("TBD") => ShipmentStatus::Tbd,
            Some("Scheduled") => ShipmentStatus::Scheduled,
            Some(other) => ShipmentStatus::Other(other.to_string()),
        }
    }
}

impl From<ShipmentStatus> for Option<String> {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Scheduled => None,
            other => Some(other.to_string()),
        }
    }
}

/// Status used for grouping and colouring: a missed delivery outranks whatever `status` says.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize)]
pub enum EffectiveStatus {
    Missed,
    Received,
    #[display("Not Received")]
    NotReceived,
    Delay,
    #[display("TBD")]
    Tbd,
    Scheduled,
    #[display("{_0}")]
    Other(String),
}

impl EffectiveStatus {
    /// Display order used by summary panels; unknown statuses sort last.
    pub fn rank(&self) -> u8 {
        match self {
            EffectiveStatus::Missed => 0,
            EffectiveStatus::Received => 1,
            EffectiveStatus::NotReceived => 2,
            EffectiveStatus::Delay => 3,
            EffectiveStatus::Tbd => 4,
            EffectiveStatus::Scheduled => 5,
            EffectiveStatus::Other(_) => 6,
        }
    }
}

impl From<&ShipmentStatus> for EffectiveStatus {
    fn from(status: &ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Received => EffectiveStatus::Received,
            ShipmentStatus::NotReceived => EffectiveStatus::NotReceived,
            ShipmentStatus::Delay => EffectiveStatus::Delay,
            ShipmentStatus::Tbd => EffectiveStatus::Tbd,
            ShipmentStatus::Scheduled => EffectiveStatus::Scheduled,
            ShipmentStatus::Other(s) => EffectiveStatus::Other(s.clone()),
        }
    }
}

/// Reference to a supplier or receiving location.
///
/// The backend sends either a populated object or just the id string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "PartyRefRepr")]
pub struct PartyRef {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PartyRefRepr {
    Id(String),
    Object {
        #[serde(default, rename = "_id", alias = "id")]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<PartyRefRepr> for PartyRef {
    fn from(repr: PartyRefRepr) -> Self {
        match repr {
            PartyRefRepr::Id(id) => PartyRef { id: Some(id), name: None },
            PartyRefRepr::Object { id, name } => PartyRef { id, name },
        }
    }
}

/// A single line on a shipment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Quantity in `uom`; fractional amounts are allowed.
    #[serde(default, deserialize_with = "deserialize_quantity")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
}

/// Accepts a number or a numeric string. Anything else counts as no quantity.
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawQuantity {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let quantity = match Option::<RawQuantity>::deserialize(deserializer)? {
        Some(RawQuantity::Number(n)) => Some(n),
        Some(RawQuantity::Text(raw)) => raw.trim().parse::<f64>().ok(),
        Some(RawQuantity::Other(_)) | None => None,
    };
    Ok(quantity.filter(|q| q.is_finite()))
}

/// The unit of scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Stable identity of the record.
    #[serde(rename = "_id", alias = "id")]
    pub id: ShipmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, rename = "shortId", skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    /// Planned delivery instant in local time. `None` means the shipment is not on the board.
    #[serde(default, with = "timestamp::optional")]
    pub delivery_date: Option<NaiveDateTime>,
    /// Set once delivery is confirmed. Never written by the board.
    #[serde(default, with = "timestamp::optional")]
    pub actual_delivery_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: ShipmentStatus,
    #[serde(default)]
    pub missed_delivery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<PartyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PartyRef>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Shipment {
    /// Creates a bare shipment with only an id and a delivery date.
    pub fn new(id: impl Into<ShipmentId>, delivery_date: Option<NaiveDateTime>) -> Self {
        Shipment {
            id: id.into(),
            tracking_number: None,
            short_id: None,
            delivery_date,
            actual_delivery_date: None,
            status: ShipmentStatus::Scheduled,
            missed_delivery: false,
            courier: None,
            supplier: None,
            location: None,
            items: Vec::new(),
        }
    }

    pub fn effective_status(&self) -> EffectiveStatus {
        if self.missed_delivery {
            EffectiveStatus::Missed
        } else {
            EffectiveStatus::from(&self.status)
        }
    }

    /// Timestamp used by summary-only views: the planned date, or the actual one when unplanned.
    pub fn summary_timestamp(&self) -> Option<NaiveDateTime> {
        self.delivery_date.or(self.actual_delivery_date)
    }

    pub fn total_quantity(&self) -> f64 {
        self.items.iter().filter_map(|item| item.quantity).sum()
    }

    pub fn supplier_name(&self) -> &str {
        self.supplier
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn courier_name(&self) -> &str {
        self.courier
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("Unknown")
    }

    /// Short label shown on a card.
    pub fn label(&self) -> &str {
        self.tracking_number
            .as_deref()
            .or(self.short_id.as_deref())
            .unwrap_or(self.id.as_str())
    }
}
