//! Gap filling between disconnected segments.

use tracing::{debug, warn};

use super::client::RoutingClient;
use crate::coord::Coordinate;

/// Result of asking for a connecting path.
#[derive(Debug, Clone, PartialEq)]
pub enum GapFill {
    /// Ordered connecting points from `from` towards `to`.
    Filled(Vec<Coordinate>),
    /// No path could be obtained; the gap stays open.
    Unavailable,
}

impl GapFill {
    /// Returns true if a path was produced.
    pub fn is_filled(&self) -> bool {
        matches!(self, GapFill::Filled(_))
    }
}

/// Produces a path across a gap between two coordinates.
///
/// Implementations never fail: every error is folded into
/// [`GapFill::Unavailable`]. Calls are idempotent and may be retried or skipped.
pub trait GapFiller: Send + Sync {
    /// Asks for a path connecting `from` to `to`.
    fn fill(&self, from: Coordinate, to: Coordinate) -> GapFill;
}

/// Gap filler that never fills; used offline or when routing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGapFiller;

impl GapFiller for NoGapFiller {
    fn fill(&self, _from: Coordinate, _to: Coordinate) -> GapFill {
        GapFill::Unavailable
    }
}

/// Gap filler backed by a routing collaborator.
pub struct RoutingGapFiller<C: RoutingClient> {
    client: C,
}

impl<C: RoutingClient> RoutingGapFiller<C> {
    /// Wrap a routing client.
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: RoutingClient> GapFiller for RoutingGapFiller<C> {
    fn fill(&self, from: Coordinate, to: Coordinate) -> GapFill {
        match self.client.route(from, to) {
            Ok(path) if path.len() >= 2 => {
                debug!(%from, %to, points = path.len(), "Gap filled by routing service");
                GapFill::Filled(path)
            }
            Ok(path) => {
                warn!(%from, %to, points = path.len(), "Routing service returned a degenerate path");
                GapFill::Unavailable
            }
            Err(e) => {
                warn!(%from, %to, error = %e, "Gap fill unavailable");
                GapFill::Unavailable
            }
        }
    }
}
