//! Station accessibility status server.
//!
//! A web application that answers: "Are the elevators and escalators
//! working at the stations I care about?"

pub mod api;
pub mod coalesce;
pub mod compare;
pub mod config;
pub mod domain;
pub mod favorites;
pub mod map;
pub mod normalize;
pub mod stations;
pub mod status_cache;
pub mod web;
