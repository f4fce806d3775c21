//! Persistence collaborator (read-only).
//!
//! The engine never writes business entities. It reads the active roster on
//! every tick and the route list once per import.

mod file;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::RouteKey;

pub use file::JsonFleetFile;
pub use memory::InMemoryFleet;

/// Errors returned by fleet repositories.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FleetError {
    /// The backing store could not be read.
    #[error("Fleet store I/O error: {0}")]
    Io(String),

    /// The backing store content is malformed.
    #[error("Fleet store parse error: {0}")]
    Parse(String),

    /// The store is temporarily unavailable.
    #[error("Fleet store unavailable: {0}")]
    Unavailable(String),
}

/// A vehicle currently assigned to a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleAssignment {
    pub vehicle_id: String,
    pub route: RouteKey,
}

impl VehicleAssignment {
    pub fn new(vehicle_id: impl Into<String>, route: RouteKey) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            route,
        }
    }
}

/// A route and its stored geometry, if any.
///
/// Geometry is kept as raw JSON; it is decoded per route during import so a
/// malformed blob only affects that route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub route: RouteKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
}

impl RouteRecord {
    pub fn new(route: RouteKey) -> Self {
        Self {
            route,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: serde_json::Value) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// Read-only access to vehicles and routes.
pub trait FleetRepository: Send + Sync + 'static {
    /// Vehicles that currently have a route assignment.
    fn list_active_vehicles(&self) -> Result<Vec<VehicleAssignment>, FleetError>;

    /// Every known route.
    fn list_routes(&self) -> Result<Vec<RouteRecord>, FleetError>;
}
