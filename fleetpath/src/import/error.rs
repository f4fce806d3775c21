//! Import error types.

use thiserror::Error;

use crate::fleet::FleetError;
use crate::geometry::RouteKey;

/// Errors that fail a whole import run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// Map data could not be fetched after all retries and no route ended
    /// up with geometry.
    #[error("Upstream fetch failed for {route} after {attempts} attempt(s): {reason}")]
    UpstreamFetchFailed {
        route: RouteKey,
        attempts: u32,
        reason: String,
    },

    /// The route list could not be read.
    #[error("Failed to list routes: {0}")]
    Fleet(#[from] FleetError),

    /// A background task died.
    #[error("Import task failed: {0}")]
    Task(String),
}
