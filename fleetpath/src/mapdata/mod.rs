//! Map-data collaborator and segment storage.
//!
//! Route relations are fetched once during import. Their raw segments and
//! stops are kept in a [`SegmentStore`] so the stitcher can be re-run
//! without another upstream round trip.

mod client;
mod store;

pub use client::{MapDataClient, MapDataError, OverpassClient, DEFAULT_MAPDATA_TIMEOUT};
pub use store::SegmentStore;
