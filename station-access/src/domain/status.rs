//! Station accessibility status types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status string used whenever the real state cannot be determined.
pub const STATUS_UNKNOWN: &str = "Unknown";

/// Aggregate status when at least one device is out.
pub const STATUS_OUT_OF_SERVICE: &str = "Out of Service";

/// Aggregate status when devices are known and none is out.
pub const STATUS_OPERATIONAL: &str = "Operational";

/// Kind of equipment an alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EquipmentType {
    Elevator,
    Escalator,
    Other,
}

impl EquipmentType {
    /// Decode the API's equipment code.
    ///
    /// The feed uses `EL`/`ES`; spelled-out names are accepted too.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "EL" | "ELEVATOR" => EquipmentType::Elevator,
            "ES" | "ESCALATOR" => EquipmentType::Escalator,
            _ => EquipmentType::Other,
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquipmentType::Elevator => f.write_str("Elevator"),
            EquipmentType::Escalator => f.write_str("Escalator"),
            EquipmentType::Other => f.write_str("Other"),
        }
    }
}

/// An equipment outage alert, as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub equipment_id: String,
    pub equipment_type: EquipmentType,
    pub reason: String,
    pub outage_date: String,
    pub estimated_return: String,
    pub is_upcoming: bool,
    pub is_active: bool,
}

/// Last known elevator/escalator state for one station.
///
/// Replaced wholesale on every refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub elevator_status: String,
    pub escalator_status: String,
    pub alerts: Vec<Alert>,
    pub last_updated: DateTime<Utc>,
}

impl StatusSnapshot {
    /// The canonical "Unknown" snapshot, stamped with the current time.
    pub fn fallback() -> Self {
        Self::fallback_at(Utc::now())
    }

    /// The "Unknown" snapshot stamped with the given time.
    pub fn fallback_at(at: DateTime<Utc>) -> Self {
        Self {
            elevator_status: STATUS_UNKNOWN.to_string(),
            escalator_status: STATUS_UNKNOWN.to_string(),
            alerts: Vec::new(),
            last_updated: at,
        }
    }

    /// Whether both statuses are unknown and there are no alerts.
    pub fn is_unknown(&self) -> bool {
        self.elevator_status == STATUS_UNKNOWN
            && self.escalator_status == STATUS_UNKNOWN
            && self.alerts.is_empty()
    }

    /// Alerts currently in effect.
    pub fn active_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_active)
    }

    /// Alerts scheduled for the future.
    pub fn upcoming_alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| a.is_upcoming && !a.is_active)
    }
}

/// Display tone for a status string, used to colour badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Good,
    Bad,
    Neutral,
}

impl StatusTone {
    /// Classify a status string the way the badges do.
    pub fn of(status: &str) -> Self {
        let lower = status.to_lowercase();
        if lower.contains("operational") {
            StatusTone::Good
        } else if lower.contains("out") {
            StatusTone::Bad
        } else {
            StatusTone::Neutral
        }
    }

    /// CSS class suffix.
    pub fn css_class(self) -> &'static str {
        match self {
            StatusTone::Good => "good",
            StatusTone::Bad => "bad",
            StatusTone::Neutral => "neutral",
        }
    }
}
