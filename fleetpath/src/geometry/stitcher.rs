//! Greedy nearest-endpoint stitching of unordered segments.
//!
//! The stitcher grows a single path from the lowest-id segment. Each pass it
//! looks at every remaining segment, measures the distance from both path ends
//! to both segment endpoints, and attaches the nearest one (reversing it when
//! needed). Segments further than the connectivity threshold are bridged with
//! the [`GapFiller`]; when that fails the path built so far is returned.
//!
//! This is a greedy approximation. Two distinct routes crossing within the
//! threshold can be mis-stitched; that is a known limitation.

use std::cmp::Ordering;
use std::collections::VecDeque;

use tracing::{debug, warn};

use super::error::GeometryError;
use super::types::{collapse_duplicates, RoutePolyline, Segment};
use crate::coord::{Coordinate, COORD_EPSILON};
use crate::gap::{GapFill, GapFiller};

/// Default connectivity threshold (~100 m at mid latitudes).
pub const DEFAULT_CONNECT_THRESHOLD_DEG: f64 = 0.001;

/// Stitching parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StitchConfig {
    /// Maximum endpoint distance for two segments to count as connected.
    pub connect_threshold: f64,
    /// Consecutive points closer than this are collapsed.
    pub dedup_epsilon: f64,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            connect_threshold: DEFAULT_CONNECT_THRESHOLD_DEG,
            dedup_epsilon: COORD_EPSILON,
        }
    }
}

/// Result of a stitching run.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchOutcome {
    /// The assembled path.
    pub polyline: RoutePolyline,
    /// Number of segments joined into the path (including the start segment).
    pub segments_used: usize,
    /// Gaps bridged by the gap filler.
    pub gaps_filled: usize,
    /// Gaps that could not be bridged (stitching stopped at the first one).
    pub discontinuities: usize,
    /// Usable segments left out of the path.
    pub unreached: usize,
    /// Consecutive duplicate points collapsed after assembly.
    pub collapsed: usize,
}

impl StitchOutcome {
    /// True when every usable segment made it into one connected path.
    pub fn is_continuous(&self) -> bool {
        self.discontinuities == 0 && self.unreached == 0
    }
}

/// Which end of the growing path a candidate attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PathEnd {
    Tail,
    Head,
}

/// Best way to attach one remaining segment.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Index into the remaining list
    index: usize,
    source_id: u64,
    end: PathEnd,
    /// Whether the segment must be reversed before attaching
    reverse: bool,
    distance: f64,
}

impl Candidate {
    /// Nearest first, then lowest source id, then tail before head.
    fn cmp_priority(&self, other: &Candidate) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.source_id.cmp(&other.source_id))
            .then(self.end.cmp(&other.end))
    }
}

/// Connects unordered segments into one ordered polyline.
#[derive(Debug, Clone, Default)]
pub struct GeometryStitcher {
    config: StitchConfig,
}

impl GeometryStitcher {
    /// Create a stitcher with the given parameters.
    pub fn new(config: StitchConfig) -> Self {
        Self { config }
    }

    /// Stitching parameters in use.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Stitch `segments` into a single polyline.
    ///
    /// Returns [`GeometryError::NoUsableGeometry`] when no segment has at least
    /// two points, or when everything collapses into a single point.
    pub fn stitch(
        &self,
        segments: &[Segment],
        gap_filler: &dyn GapFiller,
    ) -> Result<StitchOutcome, GeometryError> {
        let mut remaining: Vec<&Segment> = segments.iter().filter(|s| s.is_usable()).collect();
        let skipped = segments.len() - remaining.len();
        if skipped > 0 {
            debug!(skipped, "Skipping segments with fewer than two points");
        }
        if remaining.is_empty() {
            return Err(GeometryError::NoUsableGeometry);
        }

        remaining.sort_by_key(|s| s.source_id);
        let max_iterations = 2 * remaining.len();
        let start = remaining.remove(0);

        let mut path: VecDeque<Coordinate> = start.points.iter().copied().collect();
        let mut segments_used = 1;
        let mut gaps_filled = 0;
        let mut discontinuities = 0;
        let mut iterations = 0;

        while !remaining.is_empty() {
            if iterations >= max_iterations {
                warn!(
                    iterations,
                    remaining = remaining.len(),
                    "Stitching iteration bound reached"
                );
                break;
            }
            iterations += 1;

            let Some(best) = self.nearest_candidate(&path, &remaining) else {
                break;
            };
            let segment = remaining.remove(best.index);

            if best.distance > self.config.connect_threshold {
                let (from, to) = gap_endpoints(&path, segment, &best);
                match gap_filler.fill(from, to) {
                    GapFill::Filled(bridge) => {
                        debug!(
                            source_id = segment.source_id,
                            gap_deg = best.distance,
                            bridge_points = bridge.len(),
                            "Bridged gap"
                        );
                        attach(&mut path, &bridge, best.end, false);
                        gaps_filled += 1;
                    }
                    GapFill::Unavailable => {
                        warn!(
                            source_id = segment.source_id,
                            gap_deg = best.distance,
                            %from,
                            %to,
                            "Gap could not be filled, returning partial geometry"
                        );
                        discontinuities += 1;
                        remaining.push(segment);
                        break;
                    }
                }
            }

            attach(&mut path, &segment.points, best.end, best.reverse);
            segments_used += 1;
        }

        let mut points: Vec<Coordinate> = path.into_iter().collect();
        let collapsed = collapse_duplicates(&mut points, self.config.dedup_epsilon);
        let polyline = RoutePolyline::with_epsilon(points, self.config.dedup_epsilon)
            .map_err(|_| GeometryError::NoUsableGeometry)?;

        Ok(StitchOutcome {
            polyline,
            segments_used,
            gaps_filled,
            discontinuities,
            unreached: remaining.len(),
            collapsed,
        })
    }

    /// Finds the best attachment over all remaining segments and both path ends.
    fn nearest_candidate(
        &self,
        path: &VecDeque<Coordinate>,
        remaining: &[&Segment],
    ) -> Option<Candidate> {
        let tail = *path.back()?;
        let head = *path.front()?;

        remaining
            .iter()
            .enumerate()
            .flat_map(|(index, segment)| {
                let first = segment.points[0];
                let last = segment.points[segment.points.len() - 1];

                // Tail: the segment's entry point must touch the tail.
                let to_first = tail.distance_deg(&first);
                let to_last = tail.distance_deg(&last);
                let tail_candidate = Candidate {
                    index,
                    source_id: segment.source_id,
                    end: PathEnd::Tail,
                    reverse: to_last < to_first,
                    distance: to_first.min(to_last),
                };

                // Head: the segment's exit point must touch the head.
                let from_last = head.distance_deg(&last);
                let from_first = head.distance_deg(&first);
                let head_candidate = Candidate {
                    index,
                    source_id: segment.source_id,
                    end: PathEnd::Head,
                    reverse: from_first < from_last,
                    distance: from_first.min(from_last),
                };

                [tail_candidate, head_candidate]
            })
            .min_by(|a, b| a.cmp_priority(b))
    }
}

/// Endpoints of the gap between the path and a candidate, in travel order.
fn gap_endpoints(
    path: &VecDeque<Coordinate>,
    segment: &Segment,
    candidate: &Candidate,
) -> (Coordinate, Coordinate) {
    let oriented_first = if candidate.reverse {
        segment.points[segment.points.len() - 1]
    } else {
        segment.points[0]
    };
    let oriented_last = if candidate.reverse {
        segment.points[0]
    } else {
        segment.points[segment.points.len() - 1]
    };

    match candidate.end {
        PathEnd::Tail => (path[path.len() - 1], oriented_first),
        PathEnd::Head => (oriented_last, path[0]),
    }
}

/// Attaches `points` (in travel order once `reverse` is applied) to one end.
fn attach(path: &mut VecDeque<Coordinate>, points: &[Coordinate], end: PathEnd, reverse: bool) {
    let oriented: Vec<Coordinate> = if reverse {
        points.iter().rev().copied().collect()
    } else {
        points.to_vec()
    };

    match end {
        PathEnd::Tail => path.extend(oriented),
        PathEnd::Head => {
            for point in oriented.into_iter().rev() {
                path.push_front(point);
            }
        }
    }
}

/// Reverses `polyline` when the stop sequence runs the other way.
///
/// The polyline is flipped if the first stop lies closer to its last point
/// than to its first point. With no stops it is returned unchanged.
pub fn orient_by_stops(polyline: RoutePolyline, stops: &[Coordinate]) -> RoutePolyline {
    let Some(first_stop) = stops.first() else {
        return polyline;
    };

    let to_start = first_stop.distance_deg(&polyline.first());
    let to_end = first_stop.distance_deg(&polyline.last());

    if to_end < to_start {
        debug!(stops = stops.len(), "Reversing polyline to follow stop order");
        polyline.reversed()
    } else {
        polyline
    }
}
