//! Station type.

use serde::Serialize;

/// A named transit station with the lines that serve it.
///
/// Built by the station normalizer from one raw API record and never
/// mutated afterwards; a full refresh of the list replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    /// Stable station identifier (the API's complex id).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Line designators, in API order.
    pub lines: Vec<String>,
}

impl Station {
    /// Create a station.
    pub fn new(id: impl Into<String>, name: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lines,
        }
    }

    /// Whether this station is served by the given line.
    pub fn serves(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }

    /// Label used by station pickers, e.g. `"Union Sq (ID: 602)"`.
    pub fn picker_label(&self) -> String {
        format!("{} (ID: {})", self.name, self.id)
    }
}
