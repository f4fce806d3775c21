//! Position simulator.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::progress::{ProgressStore, VehicleProgress, WalkDirection};
use super::speed::SpeedModel;
use crate::cache::{vehicle_hash, FallbackLoops, RouteGeometryCache};
use crate::coord::Coordinate;
use crate::geometry::RouteKey;

/// One simulated position report; the only thing handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub vehicle_id: String,
    pub route: RouteKey,
    pub coordinate: Coordinate,
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
    /// True when the route had no geometry and the vehicle sits on a fallback loop
    #[serde(default)]
    pub fallback: bool,
}

/// Starting index for a vehicle on a polyline of `len` points.
pub fn start_cursor(vehicle_id: &str, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (vehicle_hash(vehicle_id) % len as u64) as usize
}

/// Advances vehicles along their route polylines.
///
/// Owns the only write path into the [`ProgressStore`].
pub struct PositionSimulator {
    cache: Arc<RouteGeometryCache>,
    progress: Arc<ProgressStore>,
    fallback: Arc<FallbackLoops>,
    speed: SpeedModel,
}

impl PositionSimulator {
    pub fn new(
        cache: Arc<RouteGeometryCache>,
        progress: Arc<ProgressStore>,
        fallback: Arc<FallbackLoops>,
    ) -> Self {
        Self {
            cache,
            progress,
            fallback,
            speed: SpeedModel::default(),
        }
    }

    pub fn with_speed_model(mut self, speed: SpeedModel) -> Self {
        self.speed = speed;
        self
    }

    pub fn cache(&self) -> &Arc<RouteGeometryCache> {
        &self.cache
    }

    pub fn progress(&self) -> &Arc<ProgressStore> {
        &self.progress
    }

    /// Moves `vehicle_id` one step along `route` and returns its new position.
    ///
    /// Vehicles seen for the first time, reassigned to another route, or
    /// whose cursor no longer fits the cached polyline start again at a
    /// hash-derived index. A route without cached geometry yields a
    /// stationary fallback sample and leaves progress untouched.
    pub fn advance(&self, vehicle_id: &str, route: &RouteKey) -> PositionSample {
        let polyline = match self.cache.get(route) {
            Ok(polyline) => polyline,
            Err(e) => {
                trace!(vehicle_id, error = %e, "Using fallback loop");
                return PositionSample {
                    vehicle_id: vehicle_id.to_string(),
                    route: route.clone(),
                    coordinate: self.fallback.position(vehicle_id),
                    speed_kmh: 0.0,
                    timestamp: Utc::now(),
                    fallback: true,
                };
            }
        };

        let len = polyline.len();
        let current = match self.progress.get(vehicle_id) {
            Some(p) if p.route == *route && p.cursor < len => p,
            previous => {
                if let Some(p) = previous {
                    debug!(
                        vehicle_id,
                        from = %p.route,
                        to = %route,
                        cursor = p.cursor,
                        len,
                        "Reinitialising vehicle progress"
                    );
                }
                VehicleProgress {
                    vehicle_id: vehicle_id.to_string(),
                    route: route.clone(),
                    cursor: start_cursor(vehicle_id, len),
                    direction: WalkDirection::Forward,
                }
            }
        };

        let next = current.stepped(len);
        let sample = PositionSample {
            vehicle_id: vehicle_id.to_string(),
            route: route.clone(),
            coordinate: polyline.points()[next.cursor],
            speed_kmh: self.speed.sample(),
            timestamp: Utc::now(),
            fallback: false,
        };
        trace!(vehicle_id, route = %route, cursor = next.cursor, "Vehicle advanced");

        self.progress.commit(next);
        sample
    }

    /// Drops progress for one vehicle.
    pub fn forget(&self, vehicle_id: &str) -> bool {
        self.progress.remove(vehicle_id).is_some()
    }

    /// Drops progress for every vehicle not in `active`.
    pub fn retain(&self, active: &HashSet<String>) -> usize {
        self.progress.retain_active(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RoutePolyline;

    fn line(n: usize) -> Arc<RoutePolyline> {
        Arc::new(
            RoutePolyline::new(
                (0..n)
                    .map(|i| Coordinate::new(0.0, i as f64 * 0.001).unwrap())
                    .collect(),
            )
            .unwrap(),
        )
    }

    fn simulator_with(routes: &[(&str, usize)]) -> PositionSimulator {
        let cache = Arc::new(RouteGeometryCache::new());
        for (id, n) in routes {
            cache.put(RouteKey::outbound(*id), line(*n));
        }
        PositionSimulator::new(
            cache,
            Arc::new(ProgressStore::new()),
            Arc::new(FallbackLoops::default()),
        )
    }

    #[test]
    fn test_first_call_steps_from_hashed_start() {
        let sim = simulator_with(&[("L1", 10)]);
        let route = RouteKey::outbound("L1");
        let start = start_cursor("bus-1", 10);

        let sample = sim.advance("bus-1", &route);
        let expected = if start < 9 { start + 1 } else { 8 };
        assert_eq!(sim.progress().get("bus-1").unwrap().cursor, expected);
        assert_eq!(sample.coordinate, line(10).points()[expected]);
        assert!(!sample.fallback);
        assert!((25.0..=45.0).contains(&sample.speed_kmh));
    }

    #[test]
    fn test_round_trip_returns_to_start() {
        let sim = simulator_with(&[("L1", 7)]);
        let route = RouteKey::outbound("L1");
        let start = start_cursor("tram-9", 7);

        for _ in 0..2 * (7 - 1) {
            sim.advance("tram-9", &route);
        }
        assert_eq!(sim.progress().get("tram-9").unwrap().cursor, start);
    }

    #[test]
    fn test_consecutive_samples_are_adjacent_points() {
        let sim = simulator_with(&[("L1", 5)]);
        let route = RouteKey::outbound("L1");
        let mut previous = sim.advance("bus-2", &route).coordinate;
        for _ in 0..20 {
            let next = sim.advance("bus-2", &route).coordinate;
            assert!((next.distance_deg(&previous) - 0.001).abs() < 1e-9);
            previous = next;
        }
    }

    #[test]
    fn test_cache_miss_uses_stationary_fallback() {
        let sim = simulator_with(&[]);
        let route: RouteKey = "L99".parse().unwrap();

        let first = sim.advance("bus-1", &route);
        let second = sim.advance("bus-1", &route);
        assert!(first.fallback);
        assert_eq!(first.speed_kmh, 0.0);
        assert_eq!(first.coordinate, second.coordinate);
        assert!(sim.progress().is_empty());
    }

    #[test]
    fn test_route_change_reinitialises() {
        let sim = simulator_with(&[("A", 50), ("B", 3)]);
        for _ in 0..5 {
            sim.advance("bus-1", &RouteKey::outbound("A"));
        }
        sim.advance("bus-1", &RouteKey::outbound("B"));
        let p = sim.progress().get("bus-1").unwrap();
        assert_eq!(p.route, RouteKey::outbound("B"));
        assert!(p.cursor < 3);
    }

    #[test]
    fn test_shrunk_polyline_reinitialises() {
        let sim = simulator_with(&[("L1", 40)]);
        let route = RouteKey::outbound("L1");
        sim.progress().commit(VehicleProgress {
            vehicle_id: "bus-3".to_string(),
            route: route.clone(),
            cursor: 39,
            direction: WalkDirection::Forward,
        });

        sim.cache().put(route.clone(), line(4));
        sim.advance("bus-3", &route);
        assert!(sim.progress().get("bus-3").unwrap().cursor < 4);
    }

    #[test]
    fn test_forget_and_retain() {
        let sim = simulator_with(&[("L1", 5)]);
        let route = RouteKey::outbound("L1");
        for id in ["a", "b", "c"] {
            sim.advance(id, &route);
        }
        assert!(sim.forget("a"));
        assert!(!sim.forget("a"));

        let active: HashSet<String> = ["c".to_string()].into_iter().collect();
        assert_eq!(sim.retain(&active), 1);
        assert_eq!(sim.progress().len(), 1);
    }

    #[test]
    fn test_start_cursor_distribution() {
        let starts: HashSet<usize> = (0..200)
            .map(|i| start_cursor(&format!("veh-{}", i), 20))
            .collect();
        assert!(starts.len() > 10);
        assert_eq!(start_cursor("veh-1", 20), start_cursor("veh-1", 20));
    }

    #[test]
    fn test_sample_serializes_route_as_text() {
        let sim = simulator_with(&[("L1", 3)]);
        let sample = sim.advance("bus-1", &RouteKey::outbound("L1"));
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["route"], "L1:outbound");
        assert_eq!(value["vehicle_id"], "bus-1");
        assert!(value["coordinate"].is_array());
    }
}
