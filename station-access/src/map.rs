//! Map view model: stations placed at their coordinates.

use std::collections::HashMap;

use serde::Serialize;

use crate::api::Coord;
use crate::domain::Station;

/// Initial map centre (Manhattan).
pub const DEFAULT_CENTER: (f64, f64) = (40.7128, -74.006);

/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 12;

/// One pin on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub name: String,
    pub lines: Vec<String>,
    pub lat: f64,
    pub lng: f64,
}

/// Join stations with their coordinates by id.
///
/// Stations without coordinates are left off the map. Station order is
/// kept.
pub fn markers(stations: &[Station], coords: &HashMap<String, Coord>) -> Vec<MapMarker> {
    stations
        .iter()
        .filter_map(|station| {
            let coord = coords.get(&station.id)?;
            if !coord.lat.is_finite() || !coord.lng.is_finite() {
                return None;
            }
            Some(MapMarker {
                id: station.id.clone(),
                name: station.name.clone(),
                lines: station.lines.clone(),
                lat: coord.lat,
                lng: coord.lng,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coord {
        Coord {
            lat,
            lng,
            name: None,
        }
    }

    #[test]
    fn drops_stations_without_coords() {
        let stations = vec![
            Station::new("602", "14 St-Union Sq", vec!["L".into()]),
            Station::new("611", "Times Sq-42 St", vec![]),
            Station::new("120", "Bedford Av", vec!["L".into()]),
        ];
        let coords = HashMap::from([
            ("120".to_string(), coord(40.717, -73.956)),
            ("602".to_string(), coord(40.735, -73.990)),
            ("999".to_string(), coord(40.0, -74.0)),
        ]);

        let markers = markers(&stations, &coords);
        let ids: Vec<&str> = markers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["602", "120"]);
        assert_eq!(markers[0].lines, vec!["L"]);
        assert_eq!(markers[1].lat, 40.717);
    }

    #[test]
    fn mismatched_ids_give_no_markers() {
        let stations = vec![Station::new("A1", "Somewhere", vec![])];
        let coords = HashMap::from([("602".to_string(), coord(40.7, -73.9))]);
        assert!(markers(&stations, &coords).is_empty());
    }
}
