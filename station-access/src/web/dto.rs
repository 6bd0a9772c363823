//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::compare::Comparison;
use crate::domain::{Station, StatusSnapshot};
use crate::map::MapMarker;

/// Query parameters of the station list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Search text, matched against name and id
    #[serde(default)]
    pub q: String,

    /// Favorites-only toggle (`1`, `true`, `on`)
    pub favorites: Option<String>,

    /// Number of stations to show, rounded to whole pages
    pub show: Option<usize>,
}

impl ListParams {
    pub fn favorites_only(&self) -> bool {
        is_flag_set(self.favorites.as_deref())
    }
}

/// Query parameters of the status endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StatusParams {
    /// Force a refetch instead of serving the stored snapshot
    pub refresh: Option<String>,
}

impl StatusParams {
    pub fn wants_refresh(&self) -> bool {
        is_flag_set(self.refresh.as_deref())
    }
}

/// Query parameters of the favorite toggle.
#[derive(Debug, Default, Deserialize)]
pub struct ToggleParams {
    /// Local path to return to after a form post
    pub next: Option<String>,
}

/// Query parameters of the compare view.
#[derive(Debug, Default, Deserialize)]
pub struct CompareParams {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
}

/// Checkbox-style flag parsing.
pub fn is_flag_set(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "on" | "yes")
    )
}

/// A station in list results.
#[derive(Debug, Serialize)]
pub struct StationResult {
    /// Station id
    pub id: String,

    /// Display name
    pub name: String,

    /// Lines serving the station
    pub lines: Vec<String>,

    /// Whether the user has favorited it
    pub is_favorite: bool,
}

impl StationResult {
    pub fn from_station(station: &Station, is_favorite: bool) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            lines: station.lines.clone(),
            is_favorite,
        }
    }
}

/// Station list response.
#[derive(Debug, Serialize)]
pub struct StationListResponse {
    /// Visible stations, favorites first
    pub stations: Vec<StationResult>,

    /// Number of stations matching the filter
    pub total: usize,

    /// Favorite ids not present in the station list
    pub unknown_favorites: Vec<String>,
}

/// Station detail response.
#[derive(Debug, Serialize)]
pub struct StationDetailResponse {
    pub station: StationResult,
    pub status: StatusSnapshot,
}

/// Result of toggling a favorite.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub station_id: String,
    pub is_favorite: bool,
}

/// Favorites response.
#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    /// All favorite ids, oldest first
    pub favorites: Vec<String>,

    /// Favorite ids the station list does not know
    pub unknown: Vec<String>,
}

/// Map response.
#[derive(Debug, Serialize)]
pub struct MapResponse {
    /// `[lat, lng]`
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

/// Compare response.
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    /// `None` until both ends are filled in
    pub comparison: Option<Comparison>,
    pub from_status: Option<StatusSnapshot>,
    pub to_status: Option<StatusSnapshot>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing() {
        assert!(is_flag_set(Some("1")));
        assert!(is_flag_set(Some("on")));
        assert!(is_flag_set(Some(" TRUE ")));
        assert!(!is_flag_set(Some("0")));
        assert!(!is_flag_set(Some("")));
        assert!(!is_flag_set(None));
    }
}
