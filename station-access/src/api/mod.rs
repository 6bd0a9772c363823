//! Station API client.
//!
//! The remote API serves three endpoints:
//! - `GET /stations` - station records, in one of several field spellings
//! - `GET /status?stationId=` - per-station status, UI-ready or device-list shaped
//! - `GET /coords` - station coordinates for the map view
//!
//! The base URL comes from the environment. When it is missing every call
//! fails with [`ApiError::ConfigMissing`].

mod client;
mod error;
mod types;

pub use client::{HttpStationApi, StationApi};
pub use error::ApiError;
pub use types::{Coord, coords_from_body};
