//! Station API error types.

use crate::config::API_BASE_VAR;

/// Errors that can occur when calling the station API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The base URL is not configured
    #[error(
        "{} is missing. Set it to the station API base URL and restart the server.",
        API_BASE_VAR
    )]
    ConfigMissing,

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("{what} request failed ({status}). {body}")]
    Api {
        what: &'static str,
        status: u16,
        body: String,
    },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl ApiError {
    /// Whether this is a configuration problem rather than a fetch failure.
    pub fn is_config(&self) -> bool {
        matches!(self, ApiError::ConfigMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_names_variable() {
        let msg = ApiError::ConfigMissing.to_string();
        assert!(msg.contains("STATION_API_BASE"));
        assert!(msg.contains("restart"));
        assert!(ApiError::ConfigMissing.is_config());
    }

    #[test]
    fn api_error_includes_body() {
        let err = ApiError::Api {
            what: "stations",
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "stations request failed (502). Bad Gateway");
        assert!(!err.is_config());
    }
}
