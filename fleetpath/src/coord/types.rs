//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Tolerance below which two coordinates are treated as the same point (degrees).
pub const COORD_EPSILON: f64 = 1e-7;

/// Geographic position in decimal degrees.
///
/// Immutable value type. Serialized as a `[latitude, longitude]` pair, which is
/// also the geometry exchange format used by the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Euclidean distance in degrees.
    ///
    /// Not geodesic; adequate for the sub-kilometre distances used when
    /// deciding whether two segment endpoints connect.
    #[inline]
    pub fn distance_deg(&self, other: &Coordinate) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }

    /// Returns true if both coordinates are within `epsilon` degrees.
    #[inline]
    pub fn approx_eq(&self, other: &Coordinate, epsilon: f64) -> bool {
        self.distance_deg(other) < epsilon
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = CoordError;

    fn try_from(pair: [f64; 2]) -> Result<Self, Self::Error> {
        Coordinate::new(pair[0], pair[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.latitude, coord.longitude]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.latitude, self.longitude)
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge (minimum latitude)
    pub south: f64,
    /// Western edge (minimum longitude)
    pub west: f64,
    /// Northern edge (maximum latitude)
    pub north: f64,
    /// Eastern edge (maximum longitude)
    pub east: f64,
}

impl BoundingBox {
    /// Creates a validated bounding box.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, CoordError> {
        Coordinate::new(south, west)?;
        Coordinate::new(north, east)?;
        if south > north || west > east {
            return Err(CoordError::InvalidBounds {
                south,
                west,
                north,
                east,
            });
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Smallest box containing every coordinate, or `None` for an empty slice.
    pub fn from_coordinates(coords: &[Coordinate]) -> Option<Self> {
        let first = coords.first()?;
        let mut bbox = Self {
            south: first.latitude(),
            west: first.longitude(),
            north: first.latitude(),
            east: first.longitude(),
        };
        for c in &coords[1..] {
            bbox.south = bbox.south.min(c.latitude());
            bbox.north = bbox.north.max(c.latitude());
            bbox.west = bbox.west.min(c.longitude());
            bbox.east = bbox.east.max(c.longitude());
        }
        Some(bbox)
    }

    /// Returns true if the coordinate lies inside the box (edges inclusive).
    pub fn contains(&self, coord: &Coordinate) -> bool {
        (self.south..=self.north).contains(&coord.latitude())
            && (self.west..=self.east).contains(&coord.longitude())
    }

    /// Centre of the box.
    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: (self.south + self.north) / 2.0,
            longitude: (self.west + self.east) / 2.0,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Errors that can occur when constructing coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-90.0 to 90.0) or NaN
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0) or NaN
    InvalidLongitude(f64),
    /// Bounding box edges are inverted
    InvalidBounds {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidBounds {
                south,
                west,
                north,
                east,
            } => {
                write!(
                    f,
                    "Invalid bounding box: south={} west={} north={} east={}",
                    south, west, north, east
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
