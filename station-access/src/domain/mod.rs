//! Domain types for station accessibility status.
//!
//! These are the canonical shapes every view works with. Raw API
//! records are turned into them by the `normalize` module.

mod station;
mod status;

pub use station::Station;
pub use status::{
    Alert, EquipmentType, STATUS_OPERATIONAL, STATUS_OUT_OF_SERVICE, STATUS_UNKNOWN,
    StatusSnapshot, StatusTone,
};
