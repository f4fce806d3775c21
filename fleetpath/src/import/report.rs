//! Per-route import results.

use std::fmt;
use std::time::Duration;

use crate::geometry::RouteKey;

/// Where a route's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Geometry stored with the route record
    StoredBlob,
    /// Segments fetched from map data and stitched
    MapData,
}

impl fmt::Display for GeometrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometrySource::StoredBlob => write!(f, "stored"),
            GeometrySource::MapData => write!(f, "map-data"),
        }
    }
}

/// What happened to one route.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Polyline built and cached.
    Imported {
        source: GeometrySource,
        points: usize,
        gaps_filled: usize,
        /// Gaps left open; the polyline may be partial
        discontinuities: usize,
    },
    /// Route is published without geometry; vehicles use fallback loops.
    WithoutGeometry { reason: String },
    /// Map data stayed unreachable after every retry.
    FetchFailed { attempts: u32, reason: String },
}

/// Result for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteImportResult {
    pub route: RouteKey,
    pub outcome: RouteOutcome,
}

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Per-route results, sorted by route key
    pub routes: Vec<RouteImportResult>,
    pub elapsed: Duration,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.count(|o| matches!(o, RouteOutcome::Imported { .. }))
    }

    pub fn without_geometry(&self) -> usize {
        self.count(|o| matches!(o, RouteOutcome::WithoutGeometry { .. }))
    }

    pub fn fetch_failed(&self) -> usize {
        self.count(|o| matches!(o, RouteOutcome::FetchFailed { .. }))
    }

    /// Imported routes whose polyline has open gaps.
    pub fn discontinuous(&self) -> usize {
        self.count(|o| {
            matches!(o, RouteOutcome::Imported { discontinuities, .. } if *discontinuities > 0)
        })
    }

    pub fn outcome(&self, route: &RouteKey) -> Option<&RouteOutcome> {
        self.routes
            .iter()
            .find(|r| &r.route == route)
            .map(|r| &r.outcome)
    }

    fn count(&self, predicate: impl Fn(&RouteOutcome) -> bool) -> usize {
        self.routes.iter().filter(|r| predicate(&r.outcome)).count()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} routes: {} imported ({} discontinuous), {} without geometry, {} fetch failures in {:?}",
            self.routes.len(),
            self.imported(),
            self.discontinuous(),
            self.without_geometry(),
            self.fetch_failed(),
            self.elapsed
        )
    }
}
