//! Read-mostly route geometry cache.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::stats::{CacheCounters, CacheStats};
use super::types::{CacheError, RouteSnapshot};
use crate::geometry::{RouteKey, RoutePolyline};

/// Thread-safe `RouteKey → Arc<RoutePolyline>` map.
///
/// Readers clone the current `Arc<RouteSnapshot>` under a short read lock and
/// then work lock-free. Writers build a new snapshot and swap it in, so a
/// reader never observes a half-built map.
#[derive(Debug, Default)]
pub struct RouteGeometryCache {
    snapshot: RwLock<Arc<RouteSnapshot>>,
    counters: CacheCounters,
}

impl RouteGeometryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding `snapshot`.
    pub fn with_snapshot(snapshot: RouteSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            counters: CacheCounters::default(),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RouteSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Polyline for `route`.
    pub fn get(&self, route: &RouteKey) -> Result<Arc<RoutePolyline>, CacheError> {
        let snapshot = self.snapshot();
        match snapshot.get(route) {
            Some(polyline) => {
                self.counters.record_hit();
                Ok(Arc::clone(polyline))
            }
            None => {
                self.counters.record_miss();
                Err(CacheError::RouteNotFound(route.clone()))
            }
        }
    }

    /// Inserts or replaces one route.
    pub fn put(&self, route: RouteKey, polyline: Arc<RoutePolyline>) {
        let mut guard = self.snapshot.write();
        let mut next = RouteSnapshot::clone(&guard);
        debug!(route = %route, points = polyline.len(), "Caching route geometry");
        next.insert(route, polyline);
        *guard = Arc::new(next);
    }

    /// Records a route that exists but has no usable geometry.
    pub fn mark_without_geometry(&self, route: RouteKey) {
        let mut guard = self.snapshot.write();
        let mut next = RouteSnapshot::clone(&guard);
        debug!(route = %route, "Route has no geometry");
        next.mark_without_geometry(route);
        *guard = Arc::new(next);
    }

    /// Replaces the whole cache with `snapshot` in one swap.
    pub fn reload(&self, snapshot: RouteSnapshot) {
        let routes = snapshot.len();
        let without = snapshot.routes_without_geometry().len();
        *self.snapshot.write() = Arc::new(snapshot);
        self.counters.record_reload();
        info!(routes, without_geometry = without, "Route geometry cache reloaded");
    }

    /// Number of routes with geometry.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Routes with geometry, sorted.
    pub fn route_keys(&self) -> Vec<RouteKey> {
        self.snapshot().route_keys()
    }

    /// True if the route is known, with or without geometry.
    pub fn has_route(&self, route: &RouteKey) -> bool {
        self.snapshot().has_route(route)
    }

    pub fn stats(&self) -> CacheStats {
        let snapshot = self.snapshot();
        self.counters
            .snapshot(snapshot.len(), snapshot.routes_without_geometry().len())
    }
}
