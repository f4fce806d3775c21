//! Error types for the geometry module.

use thiserror::Error;

/// Errors that can occur while building route geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// No segment had enough valid coordinates to draw a path.
    #[error("No usable geometry: every segment is empty or degenerate")]
    NoUsableGeometry,

    /// A polyline needs at least two distinct points.
    #[error("Polyline needs at least 2 distinct points, got {0}")]
    TooFewPoints(usize),

    /// Route key text could not be parsed.
    #[error("Invalid route key '{0}' (expected LINE or LINE:inbound|outbound)")]
    InvalidRouteKey(String),

    /// Stored geometry blob is not a coordinate array or array of arrays.
    #[error("Malformed geometry blob: {0}")]
    MalformedBlob(String),
}
