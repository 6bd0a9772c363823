//! Normalization of raw API records into domain types.
//!
//! The station API has served several spellings of the same data over
//! time. Everything here is total: unrecognised input degrades to empty
//! strings, empty lists or the fallback snapshot, never to an error.

mod station;
mod status;

use serde_json::{Map, Value};

pub use station::{ID_ALIASES, NAME_ALIASES, normalize_station, normalize_stations};
pub use status::{
    DeviceListStatus, StatusShape, UiReadyStatus, decode_status, normalize_alert,
    normalize_status,
};

/// The first alias present on `obj` with a non-null value.
fn first_present<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

/// Render a scalar JSON value as text. Arrays, objects and null yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
