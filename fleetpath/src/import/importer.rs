//! Route import: stored blobs or map data, stitched into the cache.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::error::ImportError;
use super::report::{GeometrySource, ImportReport, RouteImportResult, RouteOutcome};
use crate::cache::{RouteGeometryCache, RouteSnapshot};
use crate::coord::{BoundingBox, Coordinate};
use crate::fleet::{FleetRepository, RouteRecord};
use crate::gap::GapFiller;
use crate::geometry::{
    orient_by_stops, GeometryBlob, GeometryStitcher, RouteDirection, RouteKey,
    RoutePolyline, StitchConfig,
};
use crate::mapdata::{MapDataClient, MapDataError, SegmentStore};
use crate::retry::RetryPolicy;

/// Default number of routes imported in parallel.
pub const DEFAULT_IMPORT_CONCURRENCY: usize = 4;

/// Import settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// Map-data queries are limited to this area
    pub service_area: BoundingBox,
    pub retry: RetryPolicy,
    /// Routes imported in parallel
    pub concurrency: usize,
    pub stitch: StitchConfig,
}

impl ImportConfig {
    pub fn new(service_area: BoundingBox) -> Self {
        Self {
            service_area,
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_IMPORT_CONCURRENCY,
            stitch: StitchConfig::default(),
        }
    }
}

/// Builds route polylines and loads them into the geometry cache.
///
/// Network calls (map data and gap filling) are blocking; each route runs on
/// the blocking pool so a slow route never holds up another.
pub struct RouteImporter<M, G> {
    map_data: Arc<M>,
    gap_filler: Arc<G>,
    store: Arc<SegmentStore>,
    stitcher: GeometryStitcher,
    config: ImportConfig,
}

impl<M, G> Clone for RouteImporter<M, G> {
    fn clone(&self) -> Self {
        Self {
            map_data: Arc::clone(&self.map_data),
            gap_filler: Arc::clone(&self.gap_filler),
            store: Arc::clone(&self.store),
            stitcher: self.stitcher.clone(),
            config: self.config.clone(),
        }
    }
}

impl<M, G> RouteImporter<M, G>
where
    M: MapDataClient + 'static,
    G: GapFiller + 'static,
{
    pub fn new(
        map_data: Arc<M>,
        gap_filler: Arc<G>,
        store: Arc<SegmentStore>,
        config: ImportConfig,
    ) -> Self {
        Self {
            map_data,
            gap_filler,
            store,
            stitcher: GeometryStitcher::new(config.stitch),
            config,
        }
    }

    pub fn store(&self) -> &Arc<SegmentStore> {
        &self.store
    }

    /// Imports every route from `fleet` and swaps the result into `cache`.
    ///
    /// Per-route failures are reported, not returned. The run fails with
    /// [`ImportError::UpstreamFetchFailed`] only when map data was unreachable
    /// and not a single route ended up with geometry.
    pub async fn import_all<F: FleetRepository>(
        &self,
        fleet: Arc<F>,
        cache: &RouteGeometryCache,
    ) -> Result<ImportReport, ImportError> {
        let started = Instant::now();
        let records = tokio::task::spawn_blocking(move || fleet.list_routes())
            .await
            .map_err(|e| ImportError::Task(e.to_string()))??;

        let mut seen = HashSet::new();
        let records: Vec<RouteRecord> = records
            .into_iter()
            .filter(|r| seen.insert(r.route.clone()))
            .collect();

        info!(
            routes = records.len(),
            concurrency = self.config.concurrency,
            "Route import starting"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for record in records {
            let importer = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let route = record.route.clone();
                let _permit = semaphore.acquire_owned().await;
                match tokio::task::spawn_blocking(move || importer.import_route(record)).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(route = %route, error = %e, "Route import task failed");
                        (
                            RouteImportResult {
                                route,
                                outcome: RouteOutcome::WithoutGeometry {
                                    reason: format!("import task failed: {}", e),
                                },
                            },
                            None,
                        )
                    }
                }
            });
        }

        let mut snapshot = RouteSnapshot::new();
        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (result, polyline) = joined.map_err(|e| ImportError::Task(e.to_string()))?;
            match polyline {
                Some(polyline) => snapshot.insert(result.route.clone(), polyline),
                None => snapshot.mark_without_geometry(result.route.clone()),
            }
            results.push(result);
        }
        results.sort_by(|a, b| a.route.cmp(&b.route));

        if snapshot.is_empty() {
            if let Some(failed) = results.iter().find_map(|r| match &r.outcome {
                RouteOutcome::FetchFailed { attempts, reason } => Some((r, *attempts, reason)),
                _ => None,
            }) {
                let (result, attempts, reason) = failed;
                warn!(route = %result.route, "No route has geometry and map data is unreachable");
                return Err(ImportError::UpstreamFetchFailed {
                    route: result.route.clone(),
                    attempts,
                    reason: reason.clone(),
                });
            }
        }

        cache.reload(snapshot);
        let report = ImportReport {
            routes: results,
            elapsed: started.elapsed(),
        };
        info!(
            imported = report.imported(),
            without_geometry = report.without_geometry(),
            fetch_failed = report.fetch_failed(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Route import complete"
        );
        Ok(report)
    }

    /// Builds the polyline for one route. Blocking.
    pub fn import_route(
        &self,
        record: RouteRecord,
    ) -> (RouteImportResult, Option<Arc<RoutePolyline>>) {
        let route = record.route.clone();

        if let Some(value) = &record.geometry {
            match GeometryBlob::from_value(value)
                .and_then(|blob| blob.stitch(&self.stitcher, self.gap_filler.as_ref()))
            {
                Ok(stitched) => {
                    debug!(
                        route = %route,
                        points = stitched.polyline.len(),
                        discontinuities = stitched.discontinuities,
                        "Using stored geometry"
                    );
                    if stitched.discontinuities > 0 {
                        warn!(
                            route = %route,
                            discontinuities = stitched.discontinuities,
                            unreached = stitched.unreached,
                            "Stored geometry is discontinuous"
                        );
                    }
                    let outcome = RouteOutcome::Imported {
                        source: GeometrySource::StoredBlob,
                        points: stitched.polyline.len(),
                        gaps_filled: stitched.gaps_filled,
                        discontinuities: stitched.discontinuities,
                    };
                    return (
                        RouteImportResult { route, outcome },
                        Some(Arc::new(stitched.polyline)),
                    );
                }
                Err(e) => {
                    warn!(route = %route, error = %e, "Stored geometry unusable, falling back to map data");
                }
            }
        }

        let (outcome, polyline) = self.import_from_map_data(&route);
        (RouteImportResult { route, outcome }, polyline.map(Arc::new))
    }

    fn import_from_map_data(&self, route: &RouteKey) -> (RouteOutcome, Option<RoutePolyline>) {
        let area = self.config.service_area;
        let segments = match self.fetch_with_retry(route, "segments", || {
            self.map_data.fetch_route_segments(route, &area)
        }) {
            Ok(segments) => segments,
            Err((MapDataError::NotFound(_), _)) => {
                return (
                    RouteOutcome::WithoutGeometry {
                        reason: "no map data for route".to_string(),
                    },
                    None,
                );
            }
            Err((e, attempts)) => {
                warn!(route = %route, attempts, error = %e, "Map data unreachable");
                return (
                    RouteOutcome::FetchFailed {
                        attempts,
                        reason: e.to_string(),
                    },
                    None,
                );
            }
        };
        let segments = self.store.insert_segments(route.clone(), segments);

        let stops = match self.fetch_with_retry(route, "stops", || self.map_data.fetch_stops(route)) {
            Ok(stops) => stops,
            Err((e, _)) => {
                warn!(route = %route, error = %e, "Stops unavailable, keeping stitched orientation");
                Vec::new()
            }
        };
        let stops = self.store.insert_stops(route.clone(), stops);

        match self.stitcher.stitch(&segments, self.gap_filler.as_ref()) {
            Ok(outcome) => {
                if !outcome.is_continuous() {
                    warn!(
                        route = %route,
                        discontinuities = outcome.discontinuities,
                        unreached = outcome.unreached,
                        "Route geometry may be discontinuous"
                    );
                }
                let polyline = orient(outcome.polyline, &stops, route.direction());
                (
                    RouteOutcome::Imported {
                        source: GeometrySource::MapData,
                        points: polyline.len(),
                        gaps_filled: outcome.gaps_filled,
                        discontinuities: outcome.discontinuities,
                    },
                    Some(polyline),
                )
            }
            Err(e) => {
                warn!(route = %route, error = %e, "Route published without geometry");
                (
                    RouteOutcome::WithoutGeometry {
                        reason: e.to_string(),
                    },
                    None,
                )
            }
        }
    }

    /// Runs `op` until it succeeds, fails permanently or the policy gives up.
    ///
    /// Returns the last error and the number of attempts made.
    fn fetch_with_retry<T>(
        &self,
        route: &RouteKey,
        what: &str,
        mut op: impl FnMut() -> Result<T, MapDataError>,
    ) -> Result<T, (MapDataError, u32)> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err((e, attempt + 1)),
                Err(e) => match self.config.retry.delay_after(attempt) {
                    Some(delay) => {
                        warn!(
                            route = %route,
                            what,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Map data fetch failed, retrying"
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                    }
                    None => return Err((e, attempt + 1)),
                },
            }
        }
    }
}

/// Orients a stitched polyline along the stops, then flips it for the inbound direction.
fn orient(polyline: RoutePolyline, stops: &[Coordinate], direction: RouteDirection) -> RoutePolyline {
    let outbound = orient_by_stops(polyline, stops);
    match direction {
        RouteDirection::Outbound => outbound,
        RouteDirection::Inbound => outbound.reversed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::InMemoryFleet;
    use crate::gap::NoGapFiller;
    use crate::geometry::Segment;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    /// Map data keyed by line id; unknown lines answer with `default_error`.
    struct MockMapData {
        segments: HashMap<String, Vec<Segment>>,
        stops: HashMap<String, Vec<Coordinate>>,
        default_error: MapDataError,
        failures_before_success: AtomicU32,
        calls: Mutex<Vec<String>>,
    }

    impl MockMapData {
        fn new() -> Self {
            Self {
                segments: HashMap::new(),
                stops: HashMap::new(),
                default_error: MapDataError::NotFound("unknown".into()),
                failures_before_success: AtomicU32::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_line(mut self, line: &str, segments: Vec<Segment>, stops: Vec<Coordinate>) -> Self {
            self.segments.insert(line.to_string(), segments);
            self.stops.insert(line.to_string(), stops);
            self
        }

        fn unreachable() -> Self {
            Self {
                default_error: MapDataError::HttpError("HTTP 504".into()),
                ..Self::new()
            }
        }
    }

    impl MapDataClient for MockMapData {
        fn fetch_route_segments(
            &self,
            route: &RouteKey,
            _bbox: &BoundingBox,
        ) -> Result<Vec<Segment>, MapDataError> {
            self.calls.lock().push(route.line_id().to_string());
            let pending = self.failures_before_success.load(Ordering::SeqCst);
            if pending > 0 {
                self.failures_before_success.store(pending - 1, Ordering::SeqCst);
                return Err(MapDataError::HttpError("HTTP 429".into()));
            }
            self.segments
                .get(route.line_id())
                .cloned()
                .ok_or_else(|| self.default_error.clone())
        }

        fn fetch_stops(&self, route: &RouteKey) -> Result<Vec<Coordinate>, MapDataError> {
            Ok(self.stops.get(route.line_id()).cloned().unwrap_or_default())
        }
    }

    fn config() -> ImportConfig {
        ImportConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            },
            ..ImportConfig::new(BoundingBox::new(-10.0, -10.0, 10.0, 10.0).unwrap())
        }
    }

    fn importer(map_data: MockMapData) -> RouteImporter<MockMapData, NoGapFiller> {
        RouteImporter::new(
            Arc::new(map_data),
            Arc::new(NoGapFiller),
            Arc::new(SegmentStore::new()),
            config(),
        )
    }

    fn chain() -> Vec<Segment> {
        vec![
            Segment::new(2, vec![c(0.0, 2.0), c(0.0, 1.0)]),
            Segment::new(1, vec![c(0.0, 0.0), c(0.0, 1.0)]),
        ]
    }

    #[test]
    fn test_stored_pieces_report_open_gaps() {
        let importer = importer(MockMapData::new());
        let record = RouteRecord::new(RouteKey::outbound("S2")).with_geometry(json!([
            [[0.0, 0.0], [0.0, 0.01]],
            [[0.0, 0.03], [0.0, 0.04]]
        ]));

        let (result, polyline) = importer.import_route(record);
        assert_eq!(
            result.outcome,
            RouteOutcome::Imported {
                source: GeometrySource::StoredBlob,
                points: 2,
                gaps_filled: 0,
                discontinuities: 1,
            }
        );
        assert_eq!(polyline.unwrap().len(), 2);
    }

    #[test]
    fn test_stored_geometry_is_used_without_fetch() {
        let importer = importer(MockMapData::new());
        let record = RouteRecord::new(RouteKey::outbound("S1"))
            .with_geometry(json!([[0.0, 0.0], [0.0, 1.0]]));

        let (result, polyline) = importer.import_route(record);
        assert!(matches!(
            result.outcome,
            RouteOutcome::Imported {
                source: GeometrySource::StoredBlob,
                points: 2,
                ..
            }
        ));
        assert!(polyline.is_some());
        assert!(importer.map_data.calls.lock().is_empty());
    }

    #[test]
    fn test_malformed_blob_falls_back_to_map_data() {
        let importer = importer(MockMapData::new().with_line("M1", chain(), vec![]));
        let record = RouteRecord::new(RouteKey::outbound("M1")).with_geometry(json!({"bad": 1}));

        let (result, polyline) = importer.import_route(record);
        assert!(matches!(
            result.outcome,
            RouteOutcome::Imported {
                source: GeometrySource::MapData,
                points: 3,
                ..
            }
        ));
        assert_eq!(
            polyline.unwrap().points(),
            &[c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)]
        );
        assert!(importer.store().segments(&RouteKey::outbound("M1")).is_some());
    }

    #[test]
    fn test_stops_orient_and_inbound_reverses() {
        let stops = vec![c(0.0, 2.0), c(0.0, 0.0)];
        let importer = importer(MockMapData::new().with_line("L5", chain(), stops));

        let (_, outbound) = importer.import_route(RouteRecord::new(RouteKey::outbound("L5")));
        assert_eq!(outbound.unwrap().first(), c(0.0, 2.0));

        let inbound_key = RouteKey::new("L5", RouteDirection::Inbound);
        let (_, inbound) = importer.import_route(RouteRecord::new(inbound_key));
        assert_eq!(inbound.unwrap().first(), c(0.0, 0.0));
    }

    #[test]
    fn test_retry_then_success() {
        let map_data = MockMapData::new().with_line("R1", chain(), vec![]);
        map_data.failures_before_success.store(2, Ordering::SeqCst);
        let importer = importer(map_data);

        let (result, polyline) = importer.import_route(RouteRecord::new(RouteKey::outbound("R1")));
        assert!(polyline.is_some());
        assert!(matches!(result.outcome, RouteOutcome::Imported { .. }));
        assert_eq!(importer.map_data.calls.lock().len(), 3);
    }

    #[test]
    fn test_retry_exhaustion_is_fetch_failed() {
        let importer = importer(MockMapData::unreachable());
        let (result, polyline) = importer.import_route(RouteRecord::new(RouteKey::outbound("X")));
        assert!(polyline.is_none());
        assert_eq!(
            result.outcome,
            RouteOutcome::FetchFailed {
                attempts: 3,
                reason: "HTTP error: HTTP 504".to_string()
            }
        );
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let importer = importer(MockMapData::new());
        let (result, _) = importer.import_route(RouteRecord::new(RouteKey::outbound("Z")));
        assert!(matches!(result.outcome, RouteOutcome::WithoutGeometry { .. }));
        assert_eq!(importer.map_data.calls.lock().len(), 1);
    }

    #[test]
    fn test_degenerate_segments_mean_no_geometry() {
        let importer = importer(MockMapData::new().with_line(
            "D1",
            vec![Segment::new(1, vec![c(1.0, 1.0)])],
            vec![],
        ));
        let (result, polyline) = importer.import_route(RouteRecord::new(RouteKey::outbound("D1")));
        assert!(polyline.is_none());
        assert!(matches!(result.outcome, RouteOutcome::WithoutGeometry { .. }));
    }

    #[tokio::test]
    async fn test_import_all_loads_cache() {
        let fleet = Arc::new(InMemoryFleet::new());
        fleet.add_route(RouteRecord::new(RouteKey::outbound("L1")));
        fleet.add_route(RouteRecord::new(RouteKey::outbound("EMPTY")));
        let importer = importer(MockMapData::new().with_line("L1", chain(), vec![]));
        let cache = RouteGeometryCache::new();

        let report = importer.import_all(fleet, &cache).await.unwrap();
        assert_eq!(report.imported(), 1);
        assert_eq!(report.without_geometry(), 1);
        assert!(cache.get(&RouteKey::outbound("L1")).is_ok());
        assert!(cache.has_route(&RouteKey::outbound("EMPTY")));
        assert!(cache.get(&RouteKey::outbound("EMPTY")).is_err());
    }

    #[tokio::test]
    async fn test_import_all_fails_when_nothing_reachable() {
        let fleet = Arc::new(InMemoryFleet::new());
        fleet.add_route(RouteRecord::new(RouteKey::outbound("A")));
        fleet.add_route(RouteRecord::new(RouteKey::outbound("B")));
        let importer = importer(MockMapData::unreachable());
        let cache = RouteGeometryCache::new();

        let err = importer.import_all(fleet, &cache).await.unwrap_err();
        assert!(matches!(err, ImportError::UpstreamFetchFailed { attempts: 3, .. }));
        assert_eq!(cache.stats().reloads, 0);
    }

    #[tokio::test]
    async fn test_partial_upstream_failure_still_imports() {
        let fleet = Arc::new(InMemoryFleet::new());
        fleet.add_route(
            RouteRecord::new(RouteKey::outbound("STORED"))
                .with_geometry(json!([[1.0, 1.0], [1.0, 2.0]])),
        );
        fleet.add_route(RouteRecord::new(RouteKey::outbound("DOWN")));
        let importer = importer(MockMapData::unreachable());
        let cache = RouteGeometryCache::new();

        let report = importer.import_all(fleet, &cache).await.unwrap();
        assert_eq!(report.imported(), 1);
        assert_eq!(report.fetch_failed(), 1);
        assert_eq!(cache.len(), 1);
    }
}
