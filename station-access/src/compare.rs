//! Route comparison between two stations.
//!
//! A deliberately simple helper: it looks for lines serving both the
//! origin and the destination and otherwise suggests a transfer. There is
//! no timetable or network search behind it.

use serde::Serialize;

use crate::domain::Station;

const ID_LABEL_OPEN: &str = "(id:";

/// One entry of a station picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationOption {
    pub id: String,
    pub name: String,
    /// `"{name} (ID: {id})"`, round-trips through [`extract_station_id`].
    pub label: String,
}

/// Picker entries for every station with both a name and an id, by name.
pub fn station_options(stations: &[Station]) -> Vec<StationOption> {
    let mut options: Vec<StationOption> = stations
        .iter()
        .filter(|s| !s.name.is_empty() && !s.id.is_empty())
        .map(|s| StationOption {
            id: s.id.clone(),
            name: s.name.clone(),
            label: s.picker_label(),
        })
        .collect();

    options.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    options
}

/// Byte span of the first `(ID: …)` label in `text`, and the trimmed id.
fn find_id_label(text: &str) -> Option<(usize, usize, &str)> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let mut from = 0;

    while let Some(rel) = lower[from..].find(ID_LABEL_OPEN) {
        let start = from + rel;
        let body_start = start + ID_LABEL_OPEN.len();
        let Some(close_rel) = text[body_start..].find(')') else {
            return None;
        };
        let body = &text[body_start..body_start + close_rel];
        let id = body.trim();
        if !id.is_empty() {
            return Some((start, body_start + close_rel + 1, id));
        }
        from = body_start;
    }

    None
}

/// Read the station id back out of a picker label.
///
/// `"Union Sq (ID: 602)"` gives `Some("602")`; free text gives `None`.
pub fn extract_station_id(text: &str) -> Option<String> {
    find_id_label(text).map(|(_, _, id)| id.to_string())
}

/// Remove the `(ID: …)` part of a picker label, leaving the name.
pub fn strip_id_label(text: &str) -> String {
    match find_id_label(text) {
        Some((start, end, _)) => {
            let before = text[..start].trim_end();
            let after = text[end..].trim_start();
            format!("{before}{after}").trim().to_string()
        }
        None => text.trim().to_string(),
    }
}

/// Lines of `to` that also serve `from`, in `to`'s order.
pub fn direct_lines(from: &Station, to: &Station) -> Vec<String> {
    to.lines.iter().filter(|l| from.serves(l)).cloned().collect()
}

/// A route summary card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCard {
    pub title: &'static str,
    pub badge: &'static str,
    pub trains: Vec<String>,
    pub note: &'static str,
}

/// One step of the route timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStop {
    pub title: String,
    pub badge: &'static str,
    pub note: String,
}

/// Result of comparing two picker entries.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub from_name: String,
    pub to_name: String,
    pub from: Option<Station>,
    pub to: Option<Station>,
    pub direct_lines: Vec<String>,
    pub routes: Vec<RouteCard>,
    pub timeline: Vec<TimelineStop>,
}

impl Comparison {
    /// Whether a single line serves both ends.
    pub fn is_direct(&self) -> bool {
        !self.direct_lines.is_empty()
    }

    /// Ids of the resolved stations, origin first.
    pub fn station_ids(&self) -> Vec<String> {
        self.from
            .iter()
            .chain(self.to.iter())
            .map(|s| s.id.clone())
            .collect()
    }
}

/// Compare two picker inputs against the station list.
///
/// Returns `None` until both inputs are non-blank. Inputs without an
/// `(ID: …)` label, or with an unknown id, still produce a comparison
/// with no station data on that side.
pub fn compare(stations: &[Station], from_text: &str, to_text: &str) -> Option<Comparison> {
    if from_text.trim().is_empty() || to_text.trim().is_empty() {
        return None;
    }

    let resolve = |text: &str| {
        extract_station_id(text).and_then(|id| stations.iter().find(|s| s.id == id).cloned())
    };
    let from = resolve(from_text);
    let to = resolve(to_text);

    let direct = match (&from, &to) {
        (Some(f), Some(t)) => direct_lines(f, t),
        _ => Vec::new(),
    };
    let is_direct = !direct.is_empty();

    let from_name = non_blank_or(strip_id_label(from_text), from_text);
    let to_name = non_blank_or(strip_id_label(to_text), to_text);

    let routes = vec![
        RouteCard {
            title: "Recommended",
            badge: if is_direct {
                "Direct trains available"
            } else {
                "Transfer required"
            },
            trains: direct.clone(),
            note: if is_direct {
                "These trains stop at both stations."
            } else {
                "No single line serves both stations. You will likely need a transfer."
            },
        },
        RouteCard {
            title: "Show From/To Lines",
            badge: "Station routes",
            trains: Vec::new(),
            note: "Shows all lines for the selected From and To stations.",
        },
    ];

    let timeline = vec![
        TimelineStop {
            title: from_name.clone(),
            badge: "Start",
            note: if is_direct {
                "Take a direct line if available.".to_string()
            } else {
                "Start at your From station.".to_string()
            },
        },
        TimelineStop {
            title: if is_direct {
                "Ride (Direct)".to_string()
            } else {
                "Transfer (if needed)".to_string()
            },
            badge: if is_direct { "Ride" } else { "Transfer" },
            note: if is_direct {
                format!("Take: {}", direct.join(", "))
            } else {
                "Pick a line from the From station and transfer to a line that reaches the To station."
                    .to_string()
            },
        },
        TimelineStop {
            title: to_name.clone(),
            badge: "Arrive",
            note: "Arrive at destination station.".to_string(),
        },
    ];

    Some(Comparison {
        from_name,
        to_name,
        from,
        to,
        direct_lines: direct,
        routes,
        timeline,
    })
}

fn non_blank_or(candidate: String, fallback: &str) -> String {
    if candidate.is_empty() {
        fallback.trim().to_string()
    } else {
        candidate
    }
}
