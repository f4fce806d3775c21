//! Cache error type and the immutable route snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use crate::geometry::{RouteKey, RoutePolyline};

/// Cache-related errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// No polyline is cached for this route (unknown, or published without geometry).
    #[error("Route not found in geometry cache: {0}")]
    RouteNotFound(RouteKey),

    /// Fallback loop configuration cannot produce valid loops.
    #[error("Invalid fallback configuration: {0}")]
    InvalidFallback(String),
}

/// One complete, immutable generation of the geometry cache.
///
/// Built off to the side during import and swapped in whole, so readers
/// always see a consistent map.
#[derive(Debug, Clone, Default)]
pub struct RouteSnapshot {
    polylines: HashMap<RouteKey, Arc<RoutePolyline>>,
    without_geometry: HashSet<RouteKey>,
}

impl RouteSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a polyline for `route`, clearing any without-geometry mark.
    pub fn insert(&mut self, route: RouteKey, polyline: Arc<RoutePolyline>) {
        self.without_geometry.remove(&route);
        self.polylines.insert(route, polyline);
    }

    /// Records that `route` exists but has no usable geometry.
    pub fn mark_without_geometry(&mut self, route: RouteKey) {
        self.polylines.remove(&route);
        self.without_geometry.insert(route);
    }

    pub fn get(&self, route: &RouteKey) -> Option<&Arc<RoutePolyline>> {
        self.polylines.get(route)
    }

    /// Number of routes with geometry.
    pub fn len(&self) -> usize {
        self.polylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Routes with geometry, sorted.
    pub fn route_keys(&self) -> Vec<RouteKey> {
        let mut keys: Vec<RouteKey> = self.polylines.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Routes published without geometry, sorted.
    pub fn routes_without_geometry(&self) -> Vec<RouteKey> {
        let mut keys: Vec<RouteKey> = self.without_geometry.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// True if the route is known, with or without geometry.
    pub fn has_route(&self, route: &RouteKey) -> bool {
        self.polylines.contains_key(route) || self.without_geometry.contains(route)
    }

    /// Iterates over routes with geometry in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &Arc<RoutePolyline>)> {
        self.polylines.iter()
    }
}
