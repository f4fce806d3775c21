//! Route geometry reconstruction.
//!
//! Map data describes a route as an unordered bag of line segments, each in
//! whatever direction it was mapped. This module turns that bag into one
//! ordered, deduplicated [`RoutePolyline`] per [`RouteKey`].
//!
//! # Components
//!
//! - [`Segment`] - raw upstream piece of a route
//! - [`GeometryStitcher`] - greedy nearest-endpoint assembly with gap filling
//! - [`RoutePolyline`] - validated result, shared as `Arc<RoutePolyline>`
//! - [`GeometryBlob`] - stored geometry exchange format
//!
//! # Example
//!
//! ```
//! use fleetpath::coord::Coordinate;
//! use fleetpath::gap::NoGapFiller;
//! use fleetpath::geometry::{GeometryStitcher, Segment};
//!
//! let p = |lat, lon| Coordinate::new(lat, lon).unwrap();
//! let segments = vec![
//!     Segment::new(1, vec![p(0.0, 0.0), p(0.0, 1.0)]),
//!     Segment::new(2, vec![p(0.0, 2.0), p(0.0, 1.0)]),
//! ];
//!
//! let outcome = GeometryStitcher::default().stitch(&segments, &NoGapFiller).unwrap();
//! assert_eq!(outcome.polyline.len(), 3);
//! ```

mod blob;
mod error;
mod stitcher;
mod types;

pub use blob::GeometryBlob;
pub use error::GeometryError;
pub use stitcher::{
    orient_by_stops, GeometryStitcher, StitchConfig, StitchOutcome,
    DEFAULT_CONNECT_THRESHOLD_DEG,
};
pub use types::{collapse_duplicates, RouteDirection, RouteKey, RoutePolyline, Segment};
