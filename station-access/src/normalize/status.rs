//! Status record normalization.
//!
//! A raw `/status` body is decoded into one of the known [`StatusShape`]s
//! by trying each decoder in order. Adding a new shape means adding a
//! variant and a decoder to [`DECODERS`]. Bodies no decoder recognises
//! become the fallback snapshot.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::{
    Alert, EquipmentType, STATUS_OPERATIONAL, STATUS_OUT_OF_SERVICE, STATUS_UNKNOWN,
    StatusSnapshot,
};

use super::{first_present, scalar_text};

const ELEVATOR_STATUS_KEYS: [&str; 2] = ["elevator_status", "elevatorStatus"];
const ESCALATOR_STATUS_KEYS: [&str; 2] = ["escalator_status", "escalatorStatus"];
const LAST_UPDATED_KEYS: [&str; 2] = ["last_updated", "lastUpdated"];

/// Backend already computed the display statuses.
#[derive(Debug, Clone, PartialEq)]
pub struct UiReadyStatus {
    pub elevator_status: Option<String>,
    pub escalator_status: Option<String>,
    pub alerts: Vec<Alert>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Backend returned per-device status strings.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceListStatus {
    pub elevators: Vec<String>,
    pub escalators: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The status record shapes the API is known to serve.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusShape {
    UiReady(UiReadyStatus),
    DeviceList(DeviceListStatus),
}

type Decoder = fn(&Map<String, Value>) -> Option<StatusShape>;

/// Decoders in the order they are tried.
const DECODERS: &[Decoder] = &[decode_ui_ready, decode_device_list];

/// Decode a raw status body into a known shape, if any decoder accepts it.
pub fn decode_status(raw: &Value) -> Option<StatusShape> {
    let obj = raw.as_object()?;
    DECODERS.iter().find_map(|decode| decode(obj))
}

/// Normalize a raw status body into a snapshot.
///
/// Unrecognised bodies yield the fallback snapshot stamped with `now`.
pub fn normalize_status(raw: &Value, now: DateTime<Utc>) -> StatusSnapshot {
    match decode_status(raw) {
        Some(shape) => shape.into_snapshot(now),
        None => StatusSnapshot::fallback_at(now),
    }
}

impl StatusShape {
    /// Build the snapshot, substituting `now` for a missing timestamp.
    pub fn into_snapshot(self, now: DateTime<Utc>) -> StatusSnapshot {
        match self {
            StatusShape::UiReady(ui) => StatusSnapshot {
                elevator_status: ui
                    .elevator_status
                    .unwrap_or_else(|| STATUS_UNKNOWN.to_string()),
                escalator_status: ui
                    .escalator_status
                    .unwrap_or_else(|| STATUS_UNKNOWN.to_string()),
                alerts: ui.alerts,
                last_updated: ui.last_updated.unwrap_or(now),
            },
            StatusShape::DeviceList(devices) => StatusSnapshot {
                elevator_status: aggregate_device_status(&devices.elevators).to_string(),
                escalator_status: aggregate_device_status(&devices.escalators).to_string(),
                alerts: Vec::new(),
                last_updated: devices.updated_at.unwrap_or(now),
            },
        }
    }
}

/// Roll per-device statuses up into one display status.
fn aggregate_device_status(statuses: &[String]) -> &'static str {
    if statuses.iter().any(|s| s.to_uppercase().contains("OUT")) {
        STATUS_OUT_OF_SERVICE
    } else if !statuses.is_empty() {
        STATUS_OPERATIONAL
    } else {
        STATUS_UNKNOWN
    }
}

fn decode_ui_ready(obj: &Map<String, Value>) -> Option<StatusShape> {
    let elevator_status = status_text(obj, &ELEVATOR_STATUS_KEYS);
    let escalator_status = status_text(obj, &ESCALATOR_STATUS_KEYS);

    if elevator_status.is_none() && escalator_status.is_none() {
        return None;
    }

    let alerts = obj
        .get("alerts")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_alert).collect())
        .unwrap_or_default();

    Some(StatusShape::UiReady(UiReadyStatus {
        elevator_status,
        escalator_status,
        alerts,
        last_updated: timestamp(obj, &LAST_UPDATED_KEYS),
    }))
}

fn decode_device_list(obj: &Map<String, Value>) -> Option<StatusShape> {
    let elevators = obj.get("elevators").filter(|v| !v.is_null());
    let escalators = obj.get("escalators").filter(|v| !v.is_null());

    if elevators.is_none() && escalators.is_none() {
        return None;
    }

    Some(StatusShape::DeviceList(DeviceListStatus {
        elevators: device_statuses(elevators),
        escalators: device_statuses(escalators),
        updated_at: timestamp(obj, &["updatedAt", "updated_at"]),
    }))
}

/// A non-empty status string under any of `keys`.
fn status_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(obj, keys)
        .and_then(scalar_text)
        .filter(|s| !s.is_empty())
}

fn timestamp(obj: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    first_present(obj, keys)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Status strings of a device array. A non-array counts as no devices.
fn device_statuses(devices: Option<&Value>) -> Vec<String> {
    devices
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|device| {
                    device
                        .get("status")
                        .and_then(scalar_text)
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Convert one raw alert record. Non-objects are skipped.
pub fn normalize_alert(raw: &Value) -> Option<Alert> {
    let obj = raw.as_object()?;

    let text = |keys: &[&str]| {
        first_present(obj, keys)
            .and_then(scalar_text)
            .unwrap_or_default()
    };

    let flag = |keys: &[&str]| first_present(obj, keys).and_then(flag_value);

    let is_upcoming = flag(&["is_upcoming", "isUpcoming", "isupcomingoutage"]).unwrap_or(false);
    let is_active = flag(&["is_active", "isActive"]).unwrap_or(!is_upcoming);

    Some(Alert {
        equipment_id: text(&["equipment_id", "equipmentId", "equipment"]),
        equipment_type: EquipmentType::from_code(&text(&[
            "equipment_type",
            "equipmentType",
            "equipmenttype",
        ])),
        reason: text(&["reason"]),
        outage_date: text(&["outagedate", "outage_date", "outageDate"]),
        estimated_return: text(&[
            "estimatedreturntoservice",
            "estimated_return_to_service",
            "estimatedReturn",
        ]),
        is_upcoming,
        is_active,
    })
}

/// Booleans, or the feed's `"Y"`/`"N"` flags.
fn flag_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" | "TRUE" => Some(true),
            "N" | "NO" | "FALSE" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
