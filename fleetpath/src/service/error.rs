//! Service error types.

use crate::cache::CacheError;
use crate::gap::RoutingError;
use crate::import::ImportError;
use crate::mapdata::MapDataError;
use std::fmt;
use std::io;

/// Errors that can occur while building or running the service.
#[derive(Debug)]
pub enum ServiceError {
    /// Invalid configuration
    ConfigError(String),
    /// Failed to create the map-data client
    MapDataClientError(MapDataError),
    /// Failed to create the routing client
    RoutingClientError(RoutingError),
    /// Fallback loops could not be built
    FallbackError(CacheError),
    /// Bulk import failed
    ImportError(ImportError),
    /// I/O error
    IoError(io::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::MapDataClientError(e) => write!(f, "Map-data client error: {}", e),
            Self::RoutingClientError(e) => write!(f, "Routing client error: {}", e),
            Self::FallbackError(e) => write!(f, "Fallback setup error: {}", e),
            Self::ImportError(e) => write!(f, "Import failed: {}", e),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MapDataClientError(e) => Some(e),
            Self::RoutingClientError(e) => Some(e),
            Self::FallbackError(e) => Some(e),
            Self::ImportError(e) => Some(e),
            Self::IoError(e) => Some(e),
            Self::ConfigError(_) => None,
        }
    }
}

impl From<ImportError> for ServiceError {
    fn from(e: ImportError) -> Self {
        Self::ImportError(e)
    }
}

impl From<CacheError> for ServiceError {
    fn from(e: CacheError) -> Self {
        Self::FallbackError(e)
    }
}

impl From<io::Error> for ServiceError {
    fn from(e: io::Error) -> Self {
        Self::IoError(e)
    }
}
