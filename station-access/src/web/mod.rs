//! Web layer for station accessibility status.
//!
//! Renders the station list, detail, map and compare views as HTML, or
//! the same data as JSON when the client does not ask for HTML.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, SharedFavorites};
pub use templates::*;
