use std::error::Error;

use station_access::api::HttpStationApi;
use station_access::config::{API_BASE_VAR, AppConfig};
use station_access::favorites::FileStore;
use station_access::status_cache::StatusCacheConfig;
use station_access::web::{AppState, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    match config.api_base.as_deref() {
        Some(base) => info!(%base, "using station API"),
        None => warn!("{API_BASE_VAR} not set. Every view will show the configuration panel."),
    }

    let api = HttpStationApi::new(&config)?;

    let storage = FileStore::new(&config.favorites_path);
    info!(path = %storage.path().display(), "favorites storage");

    let state = AppState::new(api, &StatusCacheConfig::default(), Box::new(storage));
    info!(count = state.favorites.read().await.len(), "loaded favorites");

    let app = create_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Station Access listening on http://{}", config.bind_addr);
    info!("  GET  /                       - Station list");
    info!("  GET  /station/:id            - Station detail");
    info!("  GET  /status/:id             - Status fragment / JSON");
    info!("  POST /favorites/:id/toggle   - Toggle a favorite");
    info!("  GET  /map                    - Station map");
    info!("  GET  /compare                - Route comparison");

    axum::serve(listener, app).await?;
    Ok(())
}
