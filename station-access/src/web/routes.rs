//! HTTP route handlers.

use std::path::Path;
use std::sync::Arc;

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, StationApi};
use crate::compare::{self, station_options};
use crate::domain::{Station, StatusSnapshot};
use crate::map::{self, DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::normalize::normalize_stations;
use crate::stations::{
    PAGE_SIZE, PREVIEW_COUNT, StationFilter, filter_and_sort, unknown_favorites, visible_count,
};
use crate::status_cache::StatusCache;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router<A: StationApi>(state: AppState<A>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(station_list::<A>))
        .route("/health", get(health))
        .route("/station/:id", get(station_detail::<A>))
        .route("/status/:id", get(station_status::<A>))
        .route("/favorites", get(list_favorites::<A>))
        .route("/favorites/:id/toggle", post(toggle_favorite::<A>))
        .route("/map", get(map_page::<A>))
        .route("/compare", get(compare_page::<A>))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(fallback)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Unknown paths go back to the station list.
async fn fallback() -> Redirect {
    Redirect::to("/")
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn render<T: Template>(template: &T) -> Result<Response, AppError> {
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;
    Ok(Html(html).into_response())
}

/// Fetch and normalize the station list.
async fn load_stations<A: StationApi>(api: &A) -> Result<Vec<Station>, ApiError> {
    let raw = api.stations().await?;
    let stations = normalize_stations(&raw);
    debug!(count = stations.len(), "loaded stations");
    Ok(stations)
}

/// Station list with search, favorites filter and paging.
async fn station_list<A: StationApi>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let favorites_only = params.favorites_only();
    let favorite_ids = state.favorites.read().await.list().to_vec();

    let stations = match load_stations(state.api.as_ref()).await {
        Ok(stations) => stations,
        Err(e) => {
            warn!(error = %e, "station list unavailable");
            if !accepts_html(&headers) {
                return Err(e.into());
            }
            return render(&StationListTemplate {
                query: params.q,
                favorites_only,
                rows: Vec::new(),
                total: 0,
                next_show: PAGE_SIZE,
                can_show_more: false,
                can_show_less: false,
                favorites_count: favorite_ids.len(),
                unknown_favorites: Vec::new(),
                panel: Some(ErrorPanel::from_api_error("stations", &e)),
            });
        }
    };

    let filter = StationFilter {
        query: params.q.clone(),
        favorites_only,
    };
    let matching = filter_and_sort(&stations, &filter, &favorite_ids);
    let unknown = unknown_favorites(&stations, &favorite_ids);
    let visible = visible_count(params.show, matching.len());
    let shown = &matching[..visible];

    state.statuses.prefetch(
        shown
            .iter()
            .take(PREVIEW_COUNT)
            .map(|s| s.id.clone())
            .collect::<Vec<_>>(),
    );

    if !accepts_html(&headers) {
        let results = shown
            .iter()
            .map(|s| StationResult::from_station(s, favorite_ids.contains(&s.id)))
            .collect();
        return Ok(Json(StationListResponse {
            stations: results,
            total: matching.len(),
            unknown_favorites: unknown,
        })
        .into_response());
    }

    // Only the first rows are prefetched. Every row still gets a preview
    // slot, which the page script fills in after load.
    let mut rows = Vec::with_capacity(shown.len());
    for station in shown {
        let mut row = StationRow::new(station, favorite_ids.contains(&station.id));
        if !station.id.is_empty() {
            row.has_preview = true;
            row.status = state
                .statuses
                .peek(&station.id)
                .await
                .map(|snapshot| StatusView::from_snapshot(&snapshot));
        }
        rows.push(row);
    }
    debug!(
        rows = rows.len(),
        stored_statuses = state.statuses.entry_count(),
        "rendering station list"
    );

    render(&StationListTemplate {
        query: params.q,
        favorites_only,
        rows,
        total: matching.len(),
        next_show: visible + PAGE_SIZE,
        can_show_more: visible < matching.len(),
        can_show_less: visible > PAGE_SIZE,
        favorites_count: favorite_ids.len(),
        unknown_favorites: unknown,
        panel: None,
    })
}

/// Station detail. Always refetches the station's status.
async fn station_detail<A: StationApi>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    UrlPath(station_id): UrlPath<String>,
) -> Result<Response, AppError> {
    let stations = match load_stations(state.api.as_ref()).await {
        Ok(stations) => stations,
        Err(e) => {
            warn!(%station_id, error = %e, "station list unavailable");
            if !accepts_html(&headers) {
                return Err(e.into());
            }
            let panel = ErrorPanel::from_api_error("stations", &e);
            return render(&ErrorTemplate {
                title: panel.title.to_string(),
                message: panel.message,
                details: (!panel.hint.is_empty()).then(|| panel.hint.to_string()),
            });
        }
    };

    let Some(station) = stations.into_iter().find(|s| s.id == station_id) else {
        let message = format!("Unknown station: {station_id}");
        if accepts_html(&headers) {
            let html = ErrorTemplate {
                title: "Station not found".to_string(),
                message,
                details: None,
            }
            .render()
            .map_err(|e| AppError::Internal {
                message: format!("Template error: {}", e),
            })?;
            return Ok((StatusCode::NOT_FOUND, Html(html)).into_response());
        }
        return Err(AppError::NotFound { message });
    };

    let snapshot = state.statuses.refresh(&station.id).await;
    let is_favorite = state.favorites.read().await.is_favorite(&station.id);

    if accepts_html(&headers) {
        render(&StationTemplate {
            status: StatusView::from_snapshot(&snapshot),
            station,
            is_favorite,
        })
    } else {
        Ok(Json(StationDetailResponse {
            station: StationResult::from_station(&station, is_favorite),
            status: snapshot.as_ref().clone(),
        })
        .into_response())
    }
}

/// Status of one station, from the cache unless `refresh` is set.
async fn station_status<A: StationApi>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    UrlPath(station_id): UrlPath<String>,
    Query(params): Query<StatusParams>,
) -> Result<Response, AppError> {
    let snapshot = if params.wants_refresh() {
        state.statuses.refresh(&station_id).await
    } else {
        state.statuses.lookup_or_fetch(&station_id).await
    };

    if accepts_html(&headers) {
        render(&StatusFragmentTemplate {
            station_id,
            status: StatusView::from_snapshot(&snapshot),
        })
    } else {
        Ok(Json(snapshot.as_ref().clone()).into_response())
    }
}

/// Favorite ids, with those the station list does not know.
async fn list_favorites<A: StationApi>(State(state): State<AppState<A>>) -> Json<FavoritesResponse> {
    let favorites = state.favorites.read().await.list().to_vec();

    let unknown = match load_stations(state.api.as_ref()).await {
        Ok(stations) => unknown_favorites(&stations, &favorites),
        Err(e) => {
            debug!(error = %e, "cannot check favorites against station list");
            Vec::new()
        }
    };

    Json(FavoritesResponse { favorites, unknown })
}

/// Flip a favorite and persist it.
///
/// With a local `next` path (plain form posts) redirects there, otherwise
/// answers with the new membership.
async fn toggle_favorite<A: StationApi>(
    State(state): State<AppState<A>>,
    UrlPath(station_id): UrlPath<String>,
    Query(params): Query<ToggleParams>,
) -> Response {
    let is_favorite = state.favorites.write().await.toggle(&station_id);
    info!(%station_id, is_favorite, "toggled favorite");

    if let Some(next) = params.next.as_deref().filter(|n| is_local_path(n)) {
        return Redirect::to(next).into_response();
    }

    Json(ToggleResponse {
        station_id,
        is_favorite,
    })
    .into_response()
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Map of stations with known coordinates.
async fn map_page<A: StationApi>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (stations, coords) = tokio::join!(load_stations(state.api.as_ref()), state.api.coords());

    let (stations, coords) = match stations.and_then(|s| coords.map(|c| (s, c))) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(error = %e, "map data unavailable");
            if !accepts_html(&headers) {
                return Err(e.into());
            }
            return render(&MapTemplate {
                markers: Vec::new(),
                markers_json: "[]".to_string(),
                center_lat: DEFAULT_CENTER.0,
                center_lng: DEFAULT_CENTER.1,
                zoom: DEFAULT_ZOOM,
                station_count: 0,
                panel: Some(ErrorPanel::from_api_error("map data", &e)),
            });
        }
    };

    let markers = map::markers(&stations, &coords);
    debug!(
        stations = stations.len(),
        coords = coords.len(),
        markers = markers.len(),
        "built map markers"
    );

    if !accepts_html(&headers) {
        return Ok(Json(MapResponse {
            center: [DEFAULT_CENTER.0, DEFAULT_CENTER.1],
            zoom: DEFAULT_ZOOM,
            markers,
        })
        .into_response());
    }

    let markers_json = serde_json::to_string(&markers).map_err(|e| AppError::Internal {
        message: format!("Failed to encode markers: {}", e),
    })?;

    render(&MapTemplate {
        markers,
        markers_json,
        center_lat: DEFAULT_CENTER.0,
        center_lng: DEFAULT_CENTER.1,
        zoom: DEFAULT_ZOOM,
        station_count: stations.len(),
        panel: None,
    })
}

/// Route comparison between two picked stations.
///
/// Both ends' status is refetched whenever a comparison is shown.
async fn compare_page<A: StationApi>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    Query(params): Query<CompareParams>,
) -> Result<Response, AppError> {
    let stations = match load_stations(state.api.as_ref()).await {
        Ok(stations) => stations,
        Err(e) => {
            warn!(error = %e, "station list unavailable");
            if !accepts_html(&headers) {
                return Err(e.into());
            }
            return render(&CompareTemplate {
                from: params.from,
                to: params.to,
                options: Vec::new(),
                comparison: None,
                panel: Some(ErrorPanel::from_api_error("stations", &e)),
            });
        }
    };

    let comparison = compare::compare(&stations, &params.from, &params.to);

    let (from_status, to_status) = match &comparison {
        Some(c) => {
            debug!(stations = ?c.station_ids(), "refreshing compared stations");
            tokio::join!(
                refresh_status(&state.statuses, c.from.as_ref()),
                refresh_status(&state.statuses, c.to.as_ref()),
            )
        }
        None => (None, None),
    };

    if !accepts_html(&headers) {
        return Ok(Json(CompareResponse {
            comparison,
            from_status: from_status.map(|s| s.as_ref().clone()),
            to_status: to_status.map(|s| s.as_ref().clone()),
        })
        .into_response());
    }

    render(&CompareTemplate {
        from: params.from,
        to: params.to,
        options: station_options(&stations),
        comparison: comparison.map(|comparison| ComparisonView {
            comparison,
            from_status: from_status.map(|s| StatusView::from_snapshot(&s)),
            to_status: to_status.map(|s| StatusView::from_snapshot(&s)),
        }),
        panel: None,
    })
}

async fn refresh_status<A: StationApi>(
    statuses: &StatusCache<A>,
    station: Option<&Station>,
) -> Option<Arc<StatusSnapshot>> {
    match station {
        Some(station) => Some(statuses.refresh(&station.id).await),
        None => None,
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    /// The station API is not configured.
    Unavailable { message: String },
    /// The station API failed.
    Upstream { message: String },
    Internal { message: String },
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        if e.is_config() {
            AppError::Unavailable {
                message: e.to_string(),
            }
        } else {
            AppError::Upstream {
                message: e.to_string(),
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
