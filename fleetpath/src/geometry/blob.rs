//! Stored geometry exchange format.
//!
//! Persisted route geometry is either a JSON array of `[latitude, longitude]`
//! pairs or an array of such arrays when the route was saved as several
//! disconnected pieces.

use serde::{Deserialize, Serialize};

use super::error::GeometryError;
use super::stitcher::{GeometryStitcher, StitchOutcome};
use super::types::{RoutePolyline, Segment};
use crate::coord::Coordinate;
use crate::gap::GapFiller;

/// Geometry as stored alongside a route record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeometryBlob {
    /// One continuous path.
    Single(Vec<Coordinate>),
    /// Several pieces; gaps between them are preserved as-is.
    MultiSegment(Vec<Vec<Coordinate>>),
}

impl GeometryBlob {
    /// Decodes a raw JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, GeometryError> {
        Self::deserialize(value).map_err(|e| GeometryError::MalformedBlob(e.to_string()))
    }

    /// Blob for an already-built polyline.
    pub fn from_polyline(polyline: &RoutePolyline) -> Self {
        GeometryBlob::Single(polyline.points().to_vec())
    }

    /// Total number of points across all pieces.
    pub fn point_count(&self) -> usize {
        match self {
            GeometryBlob::Single(points) => points.len(),
            GeometryBlob::MultiSegment(pieces) => pieces.iter().map(Vec::len).sum(),
        }
    }

    /// Splits the blob into segments; piece index becomes the source id.
    pub fn into_segments(self) -> Vec<Segment> {
        match self {
            GeometryBlob::Single(points) => vec![Segment::new(0, points)],
            GeometryBlob::MultiSegment(pieces) => pieces
                .into_iter()
                .enumerate()
                .map(|(i, points)| Segment::new(i as u64, points))
                .collect(),
        }
    }

    /// Stitches the blob, reporting gaps filled and left open.
    ///
    /// A single path goes through the stitcher as one segment, which only
    /// deduplicates it. Multi-segment blobs are joined like map data.
    pub fn stitch(
        &self,
        stitcher: &GeometryStitcher,
        gap_filler: &dyn GapFiller,
    ) -> Result<StitchOutcome, GeometryError> {
        stitcher.stitch(&self.clone().into_segments(), gap_filler)
    }

    /// Builds a polyline from the blob.
    pub fn to_polyline(
        &self,
        stitcher: &GeometryStitcher,
        gap_filler: &dyn GapFiller,
    ) -> Result<RoutePolyline, GeometryError> {
        self.stitch(stitcher, gap_filler).map(|outcome| outcome.polyline)
    }
}
