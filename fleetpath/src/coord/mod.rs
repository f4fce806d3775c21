//! Geographic coordinate types.
//!
//! Provides the validated [`Coordinate`] value type used by every other module,
//! plus [`BoundingBox`] for map-data queries and the service area.

mod types;

pub use types::{
    BoundingBox, CoordError, Coordinate, COORD_EPSILON, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};

/// Parses a `"lat,lon"` pair.
pub fn parse_lat_lon(text: &str) -> Result<Coordinate, CoordError> {
    let mut parts = text.split(',').map(str::trim);
    let lat = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN);
    let lon = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN);
    if parts.next().is_some() {
        return Err(CoordError::InvalidLongitude(f64::NAN));
    }
    Coordinate::new(lat, lon)
}

/// Parses a `"south,west,north,east"` bounding box.
pub fn parse_bbox(text: &str) -> Result<BoundingBox, CoordError> {
    let values: Vec<f64> = text
        .split(',')
        .map(|s| s.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect();
    if values.len() != 4 {
        return Err(CoordError::InvalidBounds {
            south: f64::NAN,
            west: f64::NAN,
            north: f64::NAN,
            east: f64::NAN,
        });
    }
    BoundingBox::new(values[0], values[1], values[2], values[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let c = Coordinate::new(38.7223, -9.1393).unwrap();
        assert_eq!(c.latitude(), 38.7223);
        assert_eq!(c.longitude(), -9.1393);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = Coordinate::new(90.5, 0.0);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = Coordinate::new(0.0, -180.1);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_distance_deg_is_euclidean() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(3.0, 4.0).unwrap();
        assert!((a.distance_deg(&b) - 5.0).abs() < 1e-12);
        assert!((b.distance_deg(&a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_approx_eq_uses_epsilon() {
        let a = Coordinate::new(10.0, 10.0).unwrap();
        let b = Coordinate::new(10.0 + 5e-8, 10.0).unwrap();
        let c = Coordinate::new(10.0 + 5e-7, 10.0).unwrap();
        assert!(a.approx_eq(&b, COORD_EPSILON));
        assert!(!a.approx_eq(&c, COORD_EPSILON));
    }

    #[test]
    fn test_serde_as_lat_lon_pair() {
        let c = Coordinate::new(1.5, -2.25).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "[1.5,-2.25]");

        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let result: Result<Coordinate, _> = serde_json::from_str("[91.0, 0.0]");
        assert!(result.is_err());
    }

    #[test]
    fn test_bbox_from_coordinates() {
        let coords = vec![
            Coordinate::new(1.0, 5.0).unwrap(),
            Coordinate::new(-2.0, 7.0).unwrap(),
            Coordinate::new(0.5, 4.0).unwrap(),
        ];
        let bbox = BoundingBox::from_coordinates(&coords).unwrap();
        assert_eq!(bbox.south, -2.0);
        assert_eq!(bbox.north, 1.0);
        assert_eq!(bbox.west, 4.0);
        assert_eq!(bbox.east, 7.0);
        assert!(coords.iter().all(|c| bbox.contains(c)));
        assert!(BoundingBox::from_coordinates(&[]).is_none());
    }

    #[test]
    fn test_bbox_rejects_inverted_edges() {
        let result = BoundingBox::new(10.0, 0.0, 5.0, 1.0);
        assert!(matches!(result, Err(CoordError::InvalidBounds { .. })));
    }

    #[test]
    fn test_parse_lat_lon() {
        let c = parse_lat_lon(" 38.72, -9.14 ").unwrap();
        assert_eq!(c.latitude(), 38.72);
        assert_eq!(c.longitude(), -9.14);
        assert!(parse_lat_lon("38.72").is_err());
        assert!(parse_lat_lon("a,b").is_err());
        assert!(parse_lat_lon("1,2,3").is_err());
    }

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("38.6,-9.3,38.8,-9.0").unwrap();
        assert_eq!(bbox.south, 38.6);
        assert_eq!(bbox.east, -9.0);
        assert!(parse_bbox("1,2,3").is_err());
    }
}
