//! Routing collaborator client.
//!
//! The [`RoutingClient`] trait abstracts over street routing services so the
//! gap filler can be tested without a network. [`OsrmClient`] talks to an
//! OSRM-compatible `/route/v1` endpoint using a blocking reqwest client.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::coord::Coordinate;

/// Default HTTP timeout for a single routing request.
pub const DEFAULT_ROUTING_TIMEOUT: Duration = Duration::from_secs(10);

/// Default OSRM routing profile.
const DEFAULT_PROFILE: &str = "driving";

/// Errors returned by routing collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    /// HTTP request failed (connect, timeout, non-2xx).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Service answered but found no route between the points.
    #[error("No route between {from} and {to}")]
    NoRoute { from: String, to: String },
}

/// Trait for street routing services.
pub trait RoutingClient: Send + Sync {
    /// Returns an ordered path from `from` to `to`.
    fn route(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, RoutingError>;
}

/// OSRM response envelope. Only the fields we read are declared.
#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

/// GeoJSON LineString; coordinates are `[lon, lat]`.
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Routing client for OSRM-compatible services.
#[derive(Clone)]
pub struct OsrmClient {
    client: reqwest::blocking::Client,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    /// Creates a client for `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fleetpath/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RoutingError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: DEFAULT_PROFILE.to_string(),
        })
    }

    /// Uses a different OSRM profile (e.g. "bus" on a custom deployment).
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Builds the request URL. OSRM expects `lon,lat` order.
    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url,
            self.profile,
            from.longitude(),
            from.latitude(),
            to.longitude(),
            to.latitude()
        )
    }
}

impl RoutingClient for OsrmClient {
    fn route(&self, from: Coordinate, to: Coordinate) -> Result<Vec<Coordinate>, RoutingError> {
        let url = self.route_url(from, to);
        trace!(url = %url, "Routing request starting");

        let response = self.client.get(&url).send().map_err(|e| {
            warn!(
                url = %url,
                error = %e,
                is_timeout = e.is_timeout(),
                is_connect = e.is_connect(),
                "Routing request failed"
            );
            RoutingError::HttpError(format!("Request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(RoutingError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| RoutingError::HttpError(format!("Failed to read response: {}", e)))?;

        let path = parse_osrm_response(&bytes, from, to)?;
        debug!(points = path.len(), "Routing response decoded");
        Ok(path)
    }
}

/// Decodes an OSRM JSON body into coordinates.
fn parse_osrm_response(
    body: &[u8],
    from: Coordinate,
    to: Coordinate,
) -> Result<Vec<Coordinate>, RoutingError> {
    let parsed: OsrmResponse = serde_json::from_slice(body)
        .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

    if parsed.code != "Ok" {
        return Err(RoutingError::NoRoute {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    let route = parsed.routes.into_iter().next().ok_or(RoutingError::NoRoute {
        from: from.to_string(),
        to: to.to_string(),
    })?;

    route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| {
            Coordinate::new(lat, lon).map_err(|e| RoutingError::InvalidResponse(e.to_string()))
        })
        .collect()
}
