//! Askama templates for the web frontend.

use askama::Template;

use crate::api::ApiError;
use crate::compare::{Comparison, StationOption};
use crate::domain::{Alert, Station, StatusSnapshot, StatusTone};
use crate::map::MapMarker;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Station list with search, favorites filter and paging.
#[derive(Template)]
#[template(path = "index.html")]
pub struct StationListTemplate {
    pub query: String,
    pub favorites_only: bool,
    pub rows: Vec<StationRow>,
    /// Stations matching the filter
    pub total: usize,
    /// `show` value for the "Read more" button
    pub next_show: usize,
    pub can_show_more: bool,
    pub can_show_less: bool,
    pub favorites_count: usize,
    pub unknown_favorites: Vec<String>,
    pub panel: Option<ErrorPanel>,
}

/// Station detail page.
#[derive(Template)]
#[template(path = "station.html")]
pub struct StationTemplate {
    pub station: Station,
    pub status: StatusView,
    pub is_favorite: bool,
}

/// Map of stations with coordinates.
#[derive(Template)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub markers: Vec<MapMarker>,
    /// Markers as JSON, read by the map script from a data attribute
    pub markers_json: String,
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    pub station_count: usize,
    pub panel: Option<ErrorPanel>,
}

/// Route comparison page.
#[derive(Template)]
#[template(path = "compare.html")]
pub struct CompareTemplate {
    pub from: String,
    pub to: String,
    pub options: Vec<StationOption>,
    pub comparison: Option<ComparisonView>,
    pub panel: Option<ErrorPanel>,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
    pub details: Option<String>,
}

// ============================================================================
// Fragment Templates (AJAX responses, no base.html)
// ============================================================================

/// Status badges and alerts for one station.
#[derive(Template)]
#[template(path = "status_fragment.html")]
pub struct StatusFragmentTemplate {
    pub station_id: String,
    pub status: StatusView,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Panel shown in place of data that could not be loaded.
#[derive(Debug, Clone)]
pub struct ErrorPanel {
    pub title: &'static str,
    pub message: String,
    pub hint: &'static str,
    pub is_config: bool,
}

impl ErrorPanel {
    /// Panel for a failed station API call. `what` names the data, e.g.
    /// "stations".
    pub fn from_api_error(what: &str, error: &ApiError) -> Self {
        if error.is_config() {
            Self {
                title: "Configuration needed",
                message: error.to_string(),
                hint: "",
                is_config: true,
            }
        } else {
            Self {
                title: "Something went wrong",
                message: format!("Could not load {what}. {error}"),
                hint: "Check your connection and reload the page to try again.",
                is_config: false,
            }
        }
    }
}

/// One row of the station list.
#[derive(Debug, Clone)]
pub struct StationRow {
    pub id: String,
    pub name: String,
    pub lines: Vec<String>,
    pub is_favorite: bool,
    /// Whether this row gets a status preview at all
    pub has_preview: bool,
    /// The stored status, if it has arrived
    pub status: Option<StatusView>,
}

impl StationRow {
    pub fn new(station: &Station, is_favorite: bool) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            lines: station.lines.clone(),
            is_favorite,
            has_preview: false,
            status: None,
        }
    }

    /// Whether the preview is still waiting on a fetch.
    pub fn is_loading(&self) -> bool {
        self.has_preview && self.status.is_none()
    }
}

/// Status view model for templates.
#[derive(Debug, Clone)]
pub struct StatusView {
    pub elevator_status: String,
    pub escalator_status: String,
    pub elevator_tone: &'static str,
    pub escalator_tone: &'static str,
    pub last_updated: String,
    /// Nothing is known about the station, usually after a failed fetch
    pub is_unknown: bool,
    pub active_alerts: Vec<AlertView>,
    pub upcoming_alerts: Vec<AlertView>,
}

impl StatusView {
    /// Create from a status snapshot.
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        Self {
            elevator_status: snapshot.elevator_status.clone(),
            escalator_status: snapshot.escalator_status.clone(),
            elevator_tone: StatusTone::of(&snapshot.elevator_status).css_class(),
            escalator_tone: StatusTone::of(&snapshot.escalator_status).css_class(),
            last_updated: snapshot
                .last_updated
                .format("%Y-%m-%d %H:%M UTC")
                .to_string(),
            is_unknown: snapshot.is_unknown(),
            active_alerts: snapshot.active_alerts().map(AlertView::from_alert).collect(),
            upcoming_alerts: snapshot
                .upcoming_alerts()
                .map(AlertView::from_alert)
                .collect(),
        }
    }

    pub fn has_alerts(&self) -> bool {
        !self.active_alerts.is_empty() || !self.upcoming_alerts.is_empty()
    }
}

/// Alert view model.
#[derive(Debug, Clone)]
pub struct AlertView {
    pub equipment_id: String,
    pub equipment_kind: String,
    pub reason: String,
    pub outage_date: String,
    pub estimated_return: String,
}

impl AlertView {
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            equipment_id: alert.equipment_id.clone(),
            equipment_kind: alert.equipment_type.to_string(),
            reason: alert.reason.clone(),
            outage_date: alert.outage_date.clone(),
            estimated_return: alert.estimated_return.clone(),
        }
    }
}

/// A comparison with the status of both ends.
#[derive(Debug, Clone)]
pub struct ComparisonView {
    pub comparison: Comparison,
    pub from_status: Option<StatusView>,
    pub to_status: Option<StatusView>,
}

impl ComparisonView {
    /// Lines of the origin station, if it was resolved.
    pub fn from_lines(&self) -> Vec<String> {
        self.comparison
            .from
            .as_ref()
            .map(|s| s.lines.clone())
            .unwrap_or_default()
    }

    /// Lines of the destination station, if it was resolved.
    pub fn to_lines(&self) -> Vec<String> {
        self.comparison
            .to
            .as_ref()
            .map(|s| s.lines.clone())
            .unwrap_or_default()
    }
}
