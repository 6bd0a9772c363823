//! Station record normalization.

use serde_json::Value;

use crate::domain::Station;

use super::{first_present, scalar_text};

/// Field names tried for the station id, highest priority first.
pub const ID_ALIASES: [&str; 3] = ["station_id", "id", "stationId"];

/// Field names tried for the station name, highest priority first.
pub const NAME_ALIASES: [&str; 3] = ["station_name", "name", "stationName"];

/// Convert one raw station record into a [`Station`].
///
/// Never fails. A record that is not an object, or lacks every alias,
/// yields empty strings; `lines` is empty unless the record has a
/// `lines` array.
pub fn normalize_station(raw: &Value) -> Station {
    let Some(obj) = raw.as_object() else {
        return Station::new("", "", Vec::new());
    };

    let id = first_present(obj, &ID_ALIASES)
        .and_then(scalar_text)
        .unwrap_or_default();

    let name = first_present(obj, &NAME_ALIASES)
        .and_then(scalar_text)
        .unwrap_or_default();

    let lines = obj
        .get("lines")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_text).collect())
        .unwrap_or_default();

    Station { id, name, lines }
}

/// Normalize a whole `/stations` body. Anything but an array is treated
/// as an empty list.
pub fn normalize_stations(body: &Value) -> Vec<Station> {
    body.as_array()
        .map(|records| records.iter().map(normalize_station).collect())
        .unwrap_or_default()
}
