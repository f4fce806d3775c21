//! Route import runs.
//!
//! An import reads every route from the fleet repository and builds its
//! polyline, preferring geometry stored with the route and falling back to
//! map data (fetched with retry, stitched with gap filling, oriented by
//! stops). The finished set replaces the geometry cache in one swap.

mod error;
mod importer;
mod report;

pub use error::ImportError;
pub use importer::{ImportConfig, RouteImporter, DEFAULT_IMPORT_CONCURRENCY};
pub use report::{GeometrySource, ImportReport, RouteImportResult, RouteOutcome};
