//! Mutable in-memory fleet.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{FleetError, FleetRepository, RouteRecord, VehicleAssignment};
use crate::geometry::RouteKey;

#[derive(Debug, Default)]
struct FleetState {
    vehicles: BTreeMap<String, RouteKey>,
    routes: BTreeMap<RouteKey, RouteRecord>,
}

/// Fleet held in memory; assignments can change while the scheduler runs.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    state: RwLock<FleetState>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns (or reassigns) a vehicle to a route.
    pub fn assign(&self, vehicle_id: impl Into<String>, route: RouteKey) {
        self.state.write().vehicles.insert(vehicle_id.into(), route);
    }

    /// Removes a vehicle's assignment. Returns false if it had none.
    pub fn unassign(&self, vehicle_id: &str) -> bool {
        self.state.write().vehicles.remove(vehicle_id).is_some()
    }

    pub fn add_route(&self, record: RouteRecord) {
        self.state.write().routes.insert(record.route.clone(), record);
    }

    pub fn vehicle_count(&self) -> usize {
        self.state.read().vehicles.len()
    }
}

impl FleetRepository for InMemoryFleet {
    fn list_active_vehicles(&self) -> Result<Vec<VehicleAssignment>, FleetError> {
        Ok(self
            .state
            .read()
            .vehicles
            .iter()
            .map(|(id, route)| VehicleAssignment::new(id.clone(), route.clone()))
            .collect())
    }

    fn list_routes(&self) -> Result<Vec<RouteRecord>, FleetError> {
        Ok(self.state.read().routes.values().cloned().collect())
    }
}
