//! Station list views: filtering, favorites ordering and paging.

mod filter;

pub use filter::{
    PAGE_SIZE, PREVIEW_COUNT, StationFilter, filter_and_sort, unknown_favorites, visible_count,
};
