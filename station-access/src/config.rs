//! Application configuration.
//!
//! Everything is read from the process environment once at startup.
//! A missing API base URL does not stop the server: every API call
//! reports it instead, so the views can show the configuration panel.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the remote station API base URL.
pub const API_BASE_VAR: &str = "STATION_API_BASE";

/// Environment variable for the listen address.
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";

/// Environment variable for the favorites storage file.
pub const FAVORITES_PATH_VAR: &str = "FAVORITES_PATH";

/// Environment variable for the static assets directory.
pub const STATIC_DIR_VAR: &str = "STATIC_DIR";

/// Environment variable for an optional outbound request timeout.
pub const API_TIMEOUT_VAR: &str = "STATION_API_TIMEOUT_SECS";

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_FAVORITES_PATH: &str = "favorites.json";
const DEFAULT_STATIC_DIR: &str = "static";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the station API, without trailing slash.
    pub api_base: Option<String>,
    /// Outbound request timeout. `None` means requests may hang.
    pub api_timeout: Option<Duration>,
    /// Address the web server listens on.
    pub bind_addr: SocketAddr,
    /// Durable key/value file backing the favorites store.
    pub favorites_path: PathBuf,
    /// Static assets directory.
    pub static_dir: PathBuf,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base = lookup(API_BASE_VAR).and_then(|v| normalize_base(&v));

        let api_timeout = lookup(API_TIMEOUT_VAR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        let bind_addr = lookup(BIND_ADDR_VAR)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR));

        let favorites_path = lookup(FAVORITES_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVORITES_PATH));

        let static_dir = lookup(STATIC_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        Self {
            api_base,
            api_timeout,
            bind_addr,
            favorites_path,
            static_dir,
        }
    }

    /// Set the API base URL (for testing).
    pub fn with_api_base(mut self, base: impl AsRef<str>) -> Self {
        self.api_base = normalize_base(base.as_ref());
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Trim whitespace and trailing slashes; blank means unset.
fn normalize_base(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
