//! Map-data collaborator client.
//!
//! [`MapDataClient`] abstracts the upstream source of raw route segments and
//! stop nodes. [`OverpassClient`] queries an Overpass API endpoint for OSM
//! route relations whose `ref` matches the line id.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::coord::{BoundingBox, Coordinate};
use crate::geometry::{RouteKey, Segment};

/// Default HTTP timeout for a single map-data request.
pub const DEFAULT_MAPDATA_TIMEOUT: Duration = Duration::from_secs(60);

/// Server-side query timeout passed to Overpass, in seconds.
const OVERPASS_QUERY_TIMEOUT_SECS: u64 = 25;

/// Errors returned by map-data collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapDataError {
    /// HTTP request failed (connect, timeout, non-2xx).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Upstream has no data for this route.
    #[error("No map data for route {0}")]
    NotFound(String),
}

impl MapDataError {
    /// Whether another attempt could succeed.
    ///
    /// Overpass answers an HTML error page when overloaded, so undecodable
    /// bodies are retried as well.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, MapDataError::NotFound(_))
    }
}

/// Trait for map-data sources.
pub trait MapDataClient: Send + Sync {
    /// Raw, unordered segments of `route` inside `bbox`.
    fn fetch_route_segments(
        &self,
        route: &RouteKey,
        bbox: &BoundingBox,
    ) -> Result<Vec<Segment>, MapDataError>;

    /// Stops of `route` in line order. May be empty.
    fn fetch_stops(&self, route: &RouteKey) -> Result<Vec<Coordinate>, MapDataError>;
}

/// Overpass `[out:json]` envelope.
#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    geometry: Vec<OverpassPoint>,
    #[serde(default)]
    members: Vec<OverpassMember>,
}

#[derive(Debug, Deserialize)]
struct OverpassMember {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OverpassPoint {
    lat: f64,
    lon: f64,
}

/// Map-data client for Overpass API endpoints.
#[derive(Clone)]
pub struct OverpassClient {
    client: reqwest::blocking::Client,
    url: String,
    stop_area: Option<BoundingBox>,
}

impl OverpassClient {
    /// Creates a client posting queries to `url`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, MapDataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fleetpath/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MapDataError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            stop_area: None,
        })
    }

    /// Restricts stop lookups to `area`.
    pub fn with_stop_area(mut self, area: BoundingBox) -> Self {
        self.stop_area = Some(area);
        self
    }

    fn post(&self, query: &str) -> Result<Vec<u8>, MapDataError> {
        trace!(url = %self.url, query, "Overpass query starting");

        let response = self
            .client
            .post(&self.url)
            .form(&[("data", query)])
            .send()
            .map_err(|e| {
                warn!(url = %self.url, error = %e, is_timeout = e.is_timeout(), "Overpass request failed");
                MapDataError::HttpError(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(MapDataError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| MapDataError::HttpError(format!("Failed to read response: {}", e)))
    }
}

impl MapDataClient for OverpassClient {
    fn fetch_route_segments(
        &self,
        route: &RouteKey,
        bbox: &BoundingBox,
    ) -> Result<Vec<Segment>, MapDataError> {
        let query = segments_query(route.line_id(), bbox);
        let body = self.post(&query)?;
        let segments = parse_segments(&body)?;
        if segments.is_empty() {
            return Err(MapDataError::NotFound(route.to_string()));
        }
        debug!(route = %route, segments = segments.len(), "Fetched route segments");
        Ok(segments)
    }

    fn fetch_stops(&self, route: &RouteKey) -> Result<Vec<Coordinate>, MapDataError> {
        let query = stops_query(route.line_id(), self.stop_area.as_ref());
        let body = self.post(&query)?;
        let stops = parse_stops(&body)?;
        debug!(route = %route, stops = stops.len(), "Fetched route stops");
        Ok(stops)
    }
}

/// Quotes a value for use inside an Overpass tag filter.
fn escape_ref(line_id: &str) -> String {
    line_id.replace('\\', "\\\\").replace('"', "\\\"")
}

fn segments_query(line_id: &str, bbox: &BoundingBox) -> String {
    format!(
        "[out:json][timeout:{}];relation[\"type\"=\"route\"][\"ref\"=\"{}\"]({});way(r);out geom;",
        OVERPASS_QUERY_TIMEOUT_SECS,
        escape_ref(line_id),
        bbox
    )
}

fn stops_query(line_id: &str, area: Option<&BoundingBox>) -> String {
    let filter = area.map(|b| format!("({})", b)).unwrap_or_default();
    format!(
        "[out:json][timeout:{}];relation[\"type\"=\"route\"][\"ref\"=\"{}\"]{};out geom;",
        OVERPASS_QUERY_TIMEOUT_SECS,
        escape_ref(line_id),
        filter
    )
}

/// Decodes `way` elements into segments. Invalid points are dropped, which
/// may leave a segment unusable; the stitcher skips those.
fn parse_segments(body: &[u8]) -> Result<Vec<Segment>, MapDataError> {
    let parsed: OverpassResponse = serde_json::from_slice(body)
        .map_err(|e| MapDataError::InvalidResponse(e.to_string()))?;

    Ok(parsed
        .elements
        .into_iter()
        .filter(|e| e.kind == "way")
        .map(|way| {
            let points = way
                .geometry
                .iter()
                .filter_map(|p| Coordinate::new(p.lat, p.lon).ok())
                .collect();
            Segment::new(way.id, points)
        })
        .collect())
}

/// Decodes stop members of the first route relation, in member order.
fn parse_stops(body: &[u8]) -> Result<Vec<Coordinate>, MapDataError> {
    let parsed: OverpassResponse = serde_json::from_slice(body)
        .map_err(|e| MapDataError::InvalidResponse(e.to_string()))?;

    let Some(relation) = parsed
        .elements
        .into_iter()
        .filter(|e| e.kind == "relation")
        .min_by_key(|e| e.id)
    else {
        return Ok(Vec::new());
    };

    Ok(relation
        .members
        .iter()
        .filter(|m| m.kind == "node" && m.role.starts_with("stop"))
        .filter_map(|m| match (m.lat, m.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon).ok(),
            _ => None,
        })
        .collect())
}
