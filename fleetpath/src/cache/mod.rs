//! Route geometry cache.
//!
//! Holds the stitched polyline of every route for the simulator. The cache
//! is read on every tick and written only by import runs, so it is built as
//! immutable snapshots swapped behind a `parking_lot::RwLock`.
//!
//! Vehicles whose route is missing (unknown, or imported without geometry)
//! are placed on one of the [`FallbackLoops`], chosen by a stable hash of
//! the vehicle id.

mod fallback;
mod routes;
mod stats;
mod types;

pub use fallback::{
    vehicle_hash, FallbackLoops, DEFAULT_FALLBACK_ANCHORS, DEFAULT_FALLBACK_RADIUS_DEG,
};
pub use routes::RouteGeometryCache;
pub use stats::CacheStats;
pub use types::{CacheError, RouteSnapshot};
