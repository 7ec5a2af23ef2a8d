//! Carrier-neutral delivery tracking model.
//!
//! Every carrier adapter translates its native payload into these types; no
//! carrier-specific field names exist past this boundary.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Canonical tracking event status shared by all carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackEventStatusCode {
    Unknown,
    InformationReceived,
    AtPickup,
    InTransit,
    OutForDelivery,
    AttemptFail,
    Delivered,
    AvailableForPickup,
    Exception,
}

impl TrackEventStatusCode {
    pub const ALL: [TrackEventStatusCode; 9] = [
        TrackEventStatusCode::Unknown,
        TrackEventStatusCode::InformationReceived,
        TrackEventStatusCode::AtPickup,
        TrackEventStatusCode::InTransit,
        TrackEventStatusCode::OutForDelivery,
        TrackEventStatusCode::AttemptFail,
        TrackEventStatusCode::Delivered,
        TrackEventStatusCode::AvailableForPickup,
        TrackEventStatusCode::Exception,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::InformationReceived => "INFORMATION_RECEIVED",
            Self::AtPickup => "AT_PICKUP",
            Self::InTransit => "IN_TRANSIT",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::AttemptFail => "ATTEMPT_FAIL",
            Self::Delivered => "DELIVERED",
            Self::AvailableForPickup => "AVAILABLE_FOR_PICKUP",
            Self::Exception => "EXCEPTION",
        }
    }

    /// Parse the wire form. Unrecognized tokens map to `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .unwrap_or(Self::Unknown)
    }
}

impl std::fmt::Display for TrackEventStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEventStatus {
    pub code: TrackEventStatusCode,
    /// Carrier's own label, kept for display.
    pub name: Option<String>,
}

impl TrackEventStatus {
    #[must_use]
    pub fn new(code: TrackEventStatusCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub status: TrackEventStatus,
    /// Carrier-local time, serialized as RFC 3339 with its offset.
    pub time: Option<DateTime<FixedOffset>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl Party {
    /// Returns `None` when neither field carries a value.
    #[must_use]
    pub fn from_parts(name: Option<String>, address: Option<String>) -> Option<Self> {
        let name = name.filter(|s| !s.trim().is_empty());
        let address = address.filter(|s| !s.trim().is_empty());
        if name.is_none() && address.is_none() {
            None
        } else {
            Some(Self { name, address })
        }
    }
}

/// Tracking snapshot for one `(carrier, tracking number)` pair.
///
/// `events` is chronological ascending; the last element is the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub success: bool,
    pub carrier: CarrierRef,
    pub tracking_number: String,
    pub sender: Option<Party>,
    pub recipient: Option<Party>,
    pub product_name: Option<String>,
    pub events: Vec<TrackEvent>,
    pub error: Option<String>,
}

impl TrackInfo {
    /// A carrier answered but has no record for the number.
    #[must_use]
    pub fn not_found(
        carrier: CarrierRef,
        tracking_number: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            carrier,
            tracking_number: tracking_number.into(),
            sender: None,
            recipient: None,
            product_name: None,
            events: Vec::new(),
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn latest_event(&self) -> Option<&TrackEvent> {
        self.events.last()
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.latest_event()
            .is_some_and(|e| e.status.code == TrackEventStatusCode::Delivered)
    }
}

/// Persisted delivery status, derived from the latest event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    InProgress,
    Delivered,
}

impl DeliveryStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Delivered => "DELIVERED",
        }
    }

    #[must_use]
    pub fn from_latest(code: Option<TrackEventStatusCode>) -> Self {
        if code == Some(TrackEventStatusCode::Delivered) {
            Self::Delivered
        } else {
            Self::InProgress
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DELIVERED" => Ok(Self::Delivered),
            other => Err(format!("unknown delivery status: {other}")),
        }
    }
}
