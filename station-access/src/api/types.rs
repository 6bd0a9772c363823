//! Wire types for the station API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A station coordinate, as served by `/coords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lng: f64,
    /// Complex name from the coordinates dataset, if provided.
    #[serde(default)]
    pub name: Option<String>,
}

impl Coord {
    /// Decode one entry of the `coords` map. Entries without a finite
    /// latitude and longitude yield `None`.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let lat = coordinate(entry.get("lat")?)?;
        let lng = coordinate(entry.get("lng")?)?;
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { lat, lng, name })
    }
}

/// A number, or a string holding one.
fn coordinate(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Coordinates from the body of `GET /coords`.
///
/// A missing or null `coords` field, or a body that is not an object,
/// means no coordinates. Unusable entries are skipped one by one so they
/// cannot take the rest of the map down with them.
pub fn coords_from_body(body: &Value) -> HashMap<String, Coord> {
    let Some(entries) = body.get("coords").and_then(Value::as_object) else {
        return HashMap::new();
    };

    entries
        .iter()
        .filter_map(|(id, entry)| match Coord::from_entry(entry) {
            Some(coord) => Some((id.clone(), coord)),
            None => {
                debug!(station_id = %id, "skipping unusable coordinate");
                None
            }
        })
        .collect()
}
