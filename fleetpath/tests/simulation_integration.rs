//! Integration tests for the position simulator.
//!
//! These tests verify:
//! - vehicles walk their route back and forth with period 2(L-1)
//! - start positions are deterministic per vehicle and spread across ids
//! - routes without geometry produce a stable fallback position
//! - reloading the cache with a shorter route re-seats vehicles

use std::collections::HashSet;
use std::sync::Arc;

use fleetpath::cache::{FallbackLoops, RouteGeometryCache, RouteSnapshot};
use fleetpath::coord::Coordinate;
use fleetpath::geometry::{RouteKey, RoutePolyline};
use fleetpath::simulation::{start_cursor, PositionSimulator, ProgressStore, SpeedModel};

// =============================================================================
// Test Helpers
// =============================================================================

fn line(n: usize) -> Arc<RoutePolyline> {
    Arc::new(
        RoutePolyline::new(
            (0..n)
                .map(|i| Coordinate::new(38.70, -9.20 + i as f64 * 0.001).unwrap())
                .collect(),
        )
        .unwrap(),
    )
}

fn simulator_with(route: &RouteKey, polyline: Arc<RoutePolyline>) -> PositionSimulator {
    let cache = Arc::new(RouteGeometryCache::new());
    cache.put(route.clone(), polyline);
    PositionSimulator::new(
        cache,
        Arc::new(ProgressStore::new()),
        Arc::new(FallbackLoops::default()),
    )
}

// =============================================================================
// Walk
// =============================================================================

#[test]
fn test_round_trip_returns_to_start() {
    let route = RouteKey::outbound("28");
    for len in [2usize, 3, 7, 20] {
        let polyline = line(len);
        let sim = simulator_with(&route, Arc::clone(&polyline));
        let vehicle = format!("tram-{}", len);

        let period = 2 * (len - 1);
        let samples: Vec<_> = (0..period).map(|_| sim.advance(&vehicle, &route)).collect();

        let start = polyline.points()[start_cursor(&vehicle, len)];
        assert_eq!(samples[period - 1].coordinate, start, "len = {}", len);
        for sample in &samples {
            assert!(polyline.points().contains(&sample.coordinate));
            assert!(!sample.fallback);
        }
    }
}

#[test]
fn test_consecutive_samples_are_neighbours() {
    let route = RouteKey::outbound("28");
    let polyline = line(6);
    let sim = simulator_with(&route, Arc::clone(&polyline));

    let index_of = |c: Coordinate| polyline.points().iter().position(|p| *p == c).unwrap();
    let mut previous = index_of(sim.advance("tram-9", &route).coordinate);
    for _ in 0..30 {
        let next = index_of(sim.advance("tram-9", &route).coordinate);
        assert_eq!(previous.abs_diff(next), 1);
        previous = next;
    }
}

#[test]
fn test_start_cursor_is_deterministic_and_spread() {
    let len = 50;
    let cursors: HashSet<usize> = (0..200)
        .map(|i| start_cursor(&format!("bus-{}", i), len))
        .collect();

    assert_eq!(start_cursor("bus-1", len), start_cursor("bus-1", len));
    assert!(cursors.iter().all(|&c| c < len));
    assert!(cursors.len() > 20, "only {} distinct cursors", cursors.len());
}

#[test]
fn test_speed_stays_within_model() {
    let route = RouteKey::outbound("28");
    let sim = simulator_with(&route, line(4)).with_speed_model(SpeedModel::new(30.0, 5.0));

    for _ in 0..50 {
        let speed = sim.advance("tram-1", &route).speed_kmh;
        assert!((25.0..=35.0).contains(&speed), "speed {}", speed);
    }
}

#[test]
fn test_extreme_jitter_still_produces_samples() {
    let route = RouteKey::outbound("28");
    let polyline = line(4);
    let sim = simulator_with(&route, Arc::clone(&polyline))
        .with_speed_model(SpeedModel::new(35.0, 1e308));

    for _ in 0..20 {
        let sample = sim.advance("tram-1", &route);
        assert!(sample.speed_kmh.is_finite() && sample.speed_kmh >= 0.0);
        assert!(polyline.points().contains(&sample.coordinate));
    }
}

// =============================================================================
// Fallback
// =============================================================================

#[test]
fn test_missing_route_uses_stable_fallback() {
    let sim = simulator_with(&RouteKey::outbound("28"), line(5));
    let missing = RouteKey::outbound("L99");

    let first = sim.advance("bus-1", &missing);
    let second = sim.advance("bus-1", &missing);

    assert!(first.fallback);
    assert_eq!(first.coordinate, second.coordinate);
    assert_eq!(first.speed_kmh, 0.0);
    assert!(sim.progress().get("bus-1").is_none());
    assert_eq!(first.coordinate, FallbackLoops::default().position("bus-1"));
}

#[test]
fn test_vehicle_leaves_fallback_once_geometry_arrives() {
    let route = RouteKey::outbound("L99");
    let cache = Arc::new(RouteGeometryCache::new());
    let sim = PositionSimulator::new(
        Arc::clone(&cache),
        Arc::new(ProgressStore::new()),
        Arc::new(FallbackLoops::default()),
    );

    assert!(sim.advance("bus-1", &route).fallback);

    let mut snapshot = RouteSnapshot::new();
    snapshot.insert(route.clone(), line(5));
    cache.reload(snapshot);

    let sample = sim.advance("bus-1", &route);
    assert!(!sample.fallback);
    assert!(sim.progress().get("bus-1").is_some());
}

// =============================================================================
// Reload
// =============================================================================

#[test]
fn test_shorter_route_after_reload_keeps_cursor_in_range() {
    let route = RouteKey::outbound("28");
    let cache = Arc::new(RouteGeometryCache::new());
    cache.put(route.clone(), line(40));
    let sim = PositionSimulator::new(
        Arc::clone(&cache),
        Arc::new(ProgressStore::new()),
        Arc::new(FallbackLoops::default()),
    );

    for i in 0..30 {
        sim.advance(&format!("tram-{}", i), &route);
    }

    let short = line(3);
    cache.put(route.clone(), Arc::clone(&short));

    for i in 0..30 {
        let vehicle = format!("tram-{}", i);
        let sample = sim.advance(&vehicle, &route);
        assert!(short.points().contains(&sample.coordinate));
        assert!(sim.progress().get(&vehicle).unwrap().cursor < 3);
    }
}

#[test]
fn test_retain_drops_inactive_vehicles() {
    let route = RouteKey::outbound("28");
    let sim = simulator_with(&route, line(5));
    sim.advance("tram-1", &route);
    sim.advance("tram-2", &route);

    let active: HashSet<String> = ["tram-1".to_string()].into_iter().collect();
    assert_eq!(sim.retain(&active), 1);
    assert!(sim.progress().get("tram-2").is_none());
}
