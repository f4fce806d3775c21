//! Process-wide store of fetched map data.

use std::sync::Arc;

use dashmap::DashMap;

use crate::coord::Coordinate;
use crate::geometry::{RouteKey, Segment};

/// Raw segments and stops per route, as fetched from map data.
///
/// Written once per route during import, then read-only. Entries are shared
/// as `Arc` so readers never copy point lists.
#[derive(Debug, Default)]
pub struct SegmentStore {
    segments: DashMap<RouteKey, Arc<Vec<Segment>>>,
    stops: DashMap<RouteKey, Arc<Vec<Coordinate>>>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the segments of `route`, replacing any previous set.
    pub fn insert_segments(&self, route: RouteKey, segments: Vec<Segment>) -> Arc<Vec<Segment>> {
        let segments = Arc::new(segments);
        self.segments.insert(route, Arc::clone(&segments));
        segments
    }

    /// Stores the stops of `route`, replacing any previous list.
    pub fn insert_stops(&self, route: RouteKey, stops: Vec<Coordinate>) -> Arc<Vec<Coordinate>> {
        let stops = Arc::new(stops);
        self.stops.insert(route, Arc::clone(&stops));
        stops
    }

    pub fn segments(&self, route: &RouteKey) -> Option<Arc<Vec<Segment>>> {
        self.segments.get(route).map(|entry| Arc::clone(entry.value()))
    }

    pub fn stops(&self, route: &RouteKey) -> Option<Arc<Vec<Coordinate>>> {
        self.stops.get(route).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of routes with stored segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Drops everything stored for `route`.
    pub fn remove(&self, route: &RouteKey) {
        self.segments.remove(route);
        self.stops.remove(route);
    }

    pub fn clear(&self) {
        self.segments.clear();
        self.stops.clear();
    }
}
