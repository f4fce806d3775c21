//! Gap filling through an external routing service.
//!
//! When two consecutive route segments are further apart than the connectivity
//! threshold, the stitcher asks a [`GapFiller`] for a connecting path. The
//! filler contains every routing failure: callers only ever see
//! [`GapFill::Unavailable`].
//!
//! ```text
//! GeometryStitcher ──fill(from, to)──▶ RoutingGapFiller ──route()──▶ OsrmClient (HTTP)
//!                  ◀── Filled | Unavailable ──
//! ```

mod client;
mod filler;

pub use client::{OsrmClient, RoutingClient, RoutingError, DEFAULT_ROUTING_TIMEOUT};
pub use filler::{GapFill, GapFiller, NoGapFiller, RoutingGapFiller};

#[cfg(test)]
pub(crate) use filler::tests::MockRoutingClient;
