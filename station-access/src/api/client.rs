//! Station API HTTP client.

use std::collections::HashMap;
use std::future::Future;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;

use super::error::ApiError;
use super::types::{Coord, coords_from_body};

/// Access to the remote station API.
///
/// Returns raw JSON for stations and status so that the normalizer can
/// reconcile the different record shapes the API has served over time.
/// Implemented over HTTP by [`HttpStationApi`]; tests substitute fakes.
pub trait StationApi: Send + Sync + 'static {
    /// `GET /stations`: the raw station list.
    fn stations(&self) -> impl Future<Output = Result<Value, ApiError>> + Send;

    /// `GET /status?stationId={id}`: the raw status record for one station.
    fn status(&self, station_id: &str) -> impl Future<Output = Result<Value, ApiError>> + Send;

    /// `GET /coords`: station id to coordinate mapping.
    fn coords(&self) -> impl Future<Output = Result<HashMap<String, Coord>, ApiError>> + Send;
}

/// Client for the station API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStationApi {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl HttpStationApi {
    /// Create a new client from the application config.
    ///
    /// A missing base URL is not an error here; each call reports it.
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.api_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.api_base.clone(),
        })
    }

    /// The configured base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn url(&self, path: &str) -> Result<String, ApiError> {
        let base = self.base_url.as_deref().ok_or(ApiError::ConfigMissing)?;
        Ok(format!("{base}{path}"))
    }

    /// Send a GET and return the body as JSON, mapping non-2xx to `ApiError::Api`.
    async fn get_json(
        &self,
        what: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                what,
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Json {
            message: e.to_string(),
        })
    }
}

impl StationApi for HttpStationApi {
    async fn stations(&self) -> Result<Value, ApiError> {
        let url = self.url("/stations")?;
        debug!(%url, "fetching station list");
        self.get_json("stations", self.http.get(&url)).await
    }

    async fn status(&self, station_id: &str) -> Result<Value, ApiError> {
        let url = self.url("/status")?;
        debug!(%url, station_id, "fetching station status");
        let request = self.http.get(&url).query(&[("stationId", station_id)]);
        self.get_json("status", request).await
    }

    async fn coords(&self) -> Result<HashMap<String, Coord>, ApiError> {
        let url = self.url("/coords")?;
        debug!(%url, "fetching coordinates");
        let body = self.get_json("coords", self.http.get(&url)).await?;
        Ok(coords_from_body(&body))
    }
}
