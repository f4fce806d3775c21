//! Segment, polyline and route key types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::GeometryError;
use crate::coord::{Coordinate, COORD_EPSILON};

/// One raw, unordered piece of a route's geometry as supplied by map data.
///
/// Points are in whatever direction the upstream source recorded them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Upstream identifier (OSM way id, or blob index for stored geometry)
    pub source_id: u64,
    /// Ordered points of this segment
    pub points: Vec<Coordinate>,
}

impl Segment {
    /// Create a new segment.
    pub fn new(source_id: u64, points: Vec<Coordinate>) -> Self {
        Self { source_id, points }
    }

    /// A segment needs at least two points to contribute a path.
    pub fn is_usable(&self) -> bool {
        self.points.len() >= 2
    }

    /// First point, if any.
    pub fn first(&self) -> Option<Coordinate> {
        self.points.first().copied()
    }

    /// Last point, if any.
    pub fn last(&self) -> Option<Coordinate> {
        self.points.last().copied()
    }

    /// Same segment walked in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            source_id: self.source_id,
            points,
        }
    }
}

/// Ordered, deduplicated path for one direction of one route.
///
/// Invariants: at least two points, and no two consecutive points within
/// the dedup epsilon of each other. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoutePolyline {
    points: Vec<Coordinate>,
}

impl RoutePolyline {
    /// Build a polyline with the default epsilon (1e-7 degrees).
    pub fn new(points: Vec<Coordinate>) -> Result<Self, GeometryError> {
        Self::with_epsilon(points, COORD_EPSILON)
    }

    /// Build a polyline, collapsing consecutive points closer than `epsilon`.
    pub fn with_epsilon(mut points: Vec<Coordinate>, epsilon: f64) -> Result<Self, GeometryError> {
        collapse_duplicates(&mut points, epsilon);
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        Ok(Self { points })
    }

    /// All points in travel order.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Number of points (always >= 2).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, if in range.
    pub fn point(&self, index: usize) -> Option<Coordinate> {
        self.points.get(index).copied()
    }

    /// Start of the path.
    pub fn first(&self) -> Coordinate {
        self.points[0]
    }

    /// End of the path.
    pub fn last(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    /// Same path walked end to start.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Sum of consecutive point distances in degrees.
    pub fn length_deg(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_deg(&pair[1]))
            .sum()
    }

    /// Consume the polyline, returning its points.
    pub fn into_points(self) -> Vec<Coordinate> {
        self.points
    }
}

/// Collapses consecutive points closer than `epsilon`, keeping the first of
/// each run. Exactly equal neighbours are always collapsed, even when
/// `epsilon` is zero. Returns the number of points removed.
pub fn collapse_duplicates(points: &mut Vec<Coordinate>, epsilon: f64) -> usize {
    let before = points.len();
    points.dedup_by(|current, kept| current == kept || current.approx_eq(kept, epsilon));
    before - points.len()
}

/// Which way along a line a route runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RouteDirection {
    #[default]
    Outbound,
    Inbound,
}

impl fmt::Display for RouteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound => write!(f, "outbound"),
            Self::Inbound => write!(f, "inbound"),
        }
    }
}

/// Stable identifier of one direction of one line.
///
/// Text form is `LINE` (outbound) or `LINE:outbound` / `LINE:inbound`;
/// `:0` and `:1` are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteKey {
    line_id: String,
    direction: RouteDirection,
}

impl RouteKey {
    /// Create a key for the given line and direction.
    pub fn new(line_id: impl Into<String>, direction: RouteDirection) -> Self {
        Self {
            line_id: line_id.into(),
            direction,
        }
    }

    /// Outbound key for a line.
    pub fn outbound(line_id: impl Into<String>) -> Self {
        Self::new(line_id, RouteDirection::Outbound)
    }

    /// Line identifier; also the transport partition key.
    pub fn line_id(&self) -> &str {
        &self.line_id
    }

    /// Direction along the line.
    pub fn direction(&self) -> RouteDirection {
        self.direction
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_id, self.direction)
    }
}

impl FromStr for RouteKey {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (line, direction) = match s.rsplit_once(':') {
            Some((line, dir)) => {
                let direction = match dir.to_lowercase().as_str() {
                    "outbound" | "0" => RouteDirection::Outbound,
                    "inbound" | "1" => RouteDirection::Inbound,
                    _ => return Err(GeometryError::InvalidRouteKey(s.to_string())),
                };
                (line, direction)
            }
            None => (s, RouteDirection::Outbound),
        };
        if line.is_empty() {
            return Err(GeometryError::InvalidRouteKey(s.to_string()));
        }
        Ok(Self::new(line, direction))
    }
}

impl TryFrom<String> for RouteKey {
    type Error = GeometryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RouteKey> for String {
    fn from(key: RouteKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_polyline_collapses_consecutive_duplicates() {
        let pl = RoutePolyline::new(vec![
            c(0.0, 0.0),
            c(0.0, 0.0),
            c(0.0, 1.0),
            c(0.0, 1.0 + 1e-9),
            c(0.0, 2.0),
        ])
        .unwrap();
        assert_eq!(pl.points(), &[c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)]);
    }

    #[test]
    fn test_polyline_keeps_non_consecutive_repeats() {
        // A closed loop returns to its start; that is not a consecutive duplicate.
        let pl = RoutePolyline::new(vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 0.0)]).unwrap();
        assert_eq!(pl.len(), 3);
    }

    #[test]
    fn test_polyline_requires_two_points() {
        let result = RoutePolyline::new(vec![c(1.0, 1.0), c(1.0, 1.0)]);
        assert!(matches!(result, Err(GeometryError::TooFewPoints(1))));

        let result = RoutePolyline::new(vec![]);
        assert!(matches!(result, Err(GeometryError::TooFewPoints(0))));
    }

    #[test]
    fn test_polyline_reversed() {
        let pl = RoutePolyline::new(vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)]).unwrap();
        let rev = pl.reversed();
        assert_eq!(rev.first(), pl.last());
        assert_eq!(rev.last(), pl.first());
        assert_eq!(rev.reversed(), pl);
    }

    #[test]
    fn test_polyline_length() {
        let pl = RoutePolyline::new(vec![c(0.0, 0.0), c(0.0, 3.0), c(4.0, 3.0)]).unwrap();
        assert!((pl.length_deg() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_collapse_duplicates_count() {
        let mut pts = vec![c(0.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(1.0, 0.0)];
        assert_eq!(collapse_duplicates(&mut pts, COORD_EPSILON), 2);
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn test_collapse_exact_duplicates_with_zero_epsilon() {
        let mut pts = vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 1.0), c(0.0, 2.0)];
        assert_eq!(collapse_duplicates(&mut pts, 0.0), 1);
        assert_eq!(pts, vec![c(0.0, 0.0), c(0.0, 1.0), c(0.0, 2.0)]);
    }

    #[test]
    fn test_segment_usability() {
        assert!(!Segment::new(1, vec![]).is_usable());
        assert!(!Segment::new(1, vec![c(0.0, 0.0)]).is_usable());
        assert!(Segment::new(1, vec![c(0.0, 0.0), c(0.0, 1.0)]).is_usable());
    }

    #[test]
    fn test_route_key_parsing() {
        let key: RouteKey = "L99".parse().unwrap();
        assert_eq!(key.line_id(), "L99");
        assert_eq!(key.direction(), RouteDirection::Outbound);

        let key: RouteKey = "L7:inbound".parse().unwrap();
        assert_eq!(key.direction(), RouteDirection::Inbound);

        let key: RouteKey = "L7:1".parse().unwrap();
        assert_eq!(key.direction(), RouteDirection::Inbound);

        assert!("".parse::<RouteKey>().is_err());
        assert!(":inbound".parse::<RouteKey>().is_err());
        assert!("L7:sideways".parse::<RouteKey>().is_err());
    }

    #[test]
    fn test_route_key_display_roundtrips() {
        let key = RouteKey::new("12A", RouteDirection::Inbound);
        assert_eq!(key.to_string(), "12A:inbound");
        assert_eq!(key.to_string().parse::<RouteKey>().unwrap(), key);
    }

    #[test]
    fn test_route_key_serde_as_string() {
        let key = RouteKey::outbound("L1");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"L1:outbound\"");
        let back: RouteKey = serde_json::from_str("\"L1\"").unwrap();
        assert_eq!(back, key);
    }
}
