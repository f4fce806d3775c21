//! Deterministic fallback loops for vehicles whose route has no geometry.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::TAU;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::types::CacheError;
use crate::coord::Coordinate;
use crate::geometry::RoutePolyline;

/// Default loop anchors (central Lisbon).
pub const DEFAULT_FALLBACK_ANCHORS: &[(f64, f64)] = &[
    (38.7223, -9.1393),
    (38.7369, -9.1427),
    (38.7139, -9.1334),
    (38.7436, -9.1602),
];

/// Default loop radius in degrees (~200 m).
pub const DEFAULT_FALLBACK_RADIUS_DEG: f64 = 0.002;

/// Points around each loop before it closes.
const LOOP_POINTS: usize = 8;

/// Stable hash of a vehicle id.
///
/// Used for every per-vehicle deterministic choice: start cursor and
/// fallback loop selection.
pub fn vehicle_hash(vehicle_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    vehicle_id.hash(&mut hasher);
    hasher.finish()
}

/// Fixed set of short closed loops inside the service area.
#[derive(Debug, Clone)]
pub struct FallbackLoops {
    loops: Vec<Arc<RoutePolyline>>,
}

impl FallbackLoops {
    /// Builds one loop of `radius_deg` around each anchor.
    pub fn from_anchors(anchors: &[Coordinate], radius_deg: f64) -> Result<Self, CacheError> {
        if anchors.is_empty() {
            return Err(CacheError::InvalidFallback(
                "at least one anchor is required".to_string(),
            ));
        }
        if !(radius_deg > 0.0 && radius_deg.is_finite()) {
            return Err(CacheError::InvalidFallback(format!(
                "radius must be positive, got {}",
                radius_deg
            )));
        }

        let loops = anchors
            .iter()
            .map(|anchor| build_loop(anchor, radius_deg).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { loops })
    }

    /// Number of loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Loop assigned to `vehicle_id` and the point index on it.
    pub fn select(&self, vehicle_id: &str) -> (Arc<RoutePolyline>, usize) {
        let hash = vehicle_hash(vehicle_id);
        let polyline = &self.loops[(hash % self.loops.len() as u64) as usize];
        let index = (hash % polyline.len() as u64) as usize;
        (Arc::clone(polyline), index)
    }

    /// Fallback position of `vehicle_id`; identical on every call.
    pub fn position(&self, vehicle_id: &str) -> Coordinate {
        let (polyline, index) = self.select(vehicle_id);
        polyline.points()[index]
    }
}

impl Default for FallbackLoops {
    fn default() -> Self {
        let anchors: Vec<Coordinate> = DEFAULT_FALLBACK_ANCHORS
            .iter()
            .filter_map(|&(lat, lon)| Coordinate::new(lat, lon).ok())
            .collect();
        Self::from_anchors(&anchors, DEFAULT_FALLBACK_RADIUS_DEG)
            .expect("default fallback anchors are valid")
    }
}

/// Closed octagon around `anchor`; the last point repeats the first.
fn build_loop(anchor: &Coordinate, radius_deg: f64) -> Result<RoutePolyline, CacheError> {
    let mut points = Vec::with_capacity(LOOP_POINTS + 1);
    for i in 0..=LOOP_POINTS {
        let angle = TAU * (i % LOOP_POINTS) as f64 / LOOP_POINTS as f64;
        let point = Coordinate::new(
            anchor.latitude() + radius_deg * angle.sin(),
            anchor.longitude() + radius_deg * angle.cos(),
        )
        .map_err(|e| CacheError::InvalidFallback(format!("loop around {}: {}", anchor, e)))?;
        points.push(point);
    }
    RoutePolyline::new(points).map_err(|e| CacheError::InvalidFallback(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_loops_are_closed() {
        let loops = FallbackLoops::default();
        assert_eq!(loops.len(), DEFAULT_FALLBACK_ANCHORS.len());
        for polyline in &loops.loops {
            assert_eq!(polyline.len(), LOOP_POINTS + 1);
            assert_eq!(polyline.first(), polyline.last());
        }
    }

    #[test]
    fn test_position_is_stable() {
        let loops = FallbackLoops::default();
        let first = loops.position("bus-1");
        for _ in 0..10 {
            assert_eq!(loops.position("bus-1"), first);
        }
    }

    #[test]
    fn test_vehicles_spread_over_loops() {
        let loops = FallbackLoops::default();
        let mut positions = HashSet::new();
        for i in 0..100 {
            let p = loops.position(&format!("bus-{}", i));
            positions.insert((p.latitude().to_bits(), p.longitude().to_bits()));
        }
        assert!(positions.len() > 4);
    }

    #[test]
    fn test_positions_stay_near_anchor() {
        let anchor = Coordinate::new(10.0, 20.0).unwrap();
        let loops = FallbackLoops::from_anchors(&[anchor], 0.01).unwrap();
        let p = loops.position("tram-3");
        assert!((p.distance_deg(&anchor) - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(FallbackLoops::from_anchors(&[], 0.01).is_err());
        let anchor = Coordinate::new(0.0, 0.0).unwrap();
        assert!(FallbackLoops::from_anchors(&[anchor], 0.0).is_err());
        assert!(FallbackLoops::from_anchors(&[anchor], f64::NAN).is_err());

        let polar = Coordinate::new(89.999, 0.0).unwrap();
        assert!(matches!(
            FallbackLoops::from_anchors(&[polar], 0.01),
            Err(CacheError::InvalidFallback(_))
        ));
    }

    #[test]
    fn test_vehicle_hash_is_deterministic() {
        assert_eq!(vehicle_hash("bus-1"), vehicle_hash("bus-1"));
        assert_ne!(vehicle_hash("bus-1"), vehicle_hash("bus-2"));
    }
}
