//! Per-vehicle walk state.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::geometry::RouteKey;

/// Direction of travel along the polyline's point indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkDirection {
    #[default]
    Forward,
    Backward,
}

impl WalkDirection {
    pub fn flipped(self) -> Self {
        match self {
            WalkDirection::Forward => WalkDirection::Backward,
            WalkDirection::Backward => WalkDirection::Forward,
        }
    }
}

/// Where a vehicle is on its route and which way it is heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleProgress {
    pub vehicle_id: String,
    pub route: RouteKey,
    /// Index into the route polyline
    pub cursor: usize,
    pub direction: WalkDirection,
}

impl VehicleProgress {
    /// The state after one step on a polyline of `len` points.
    ///
    /// At either end the direction flips and the cursor reflects, so the
    /// walk is a round trip with period `2 * (len - 1)`.
    pub fn stepped(&self, len: usize) -> VehicleProgress {
        let (cursor, direction) = step(self.cursor, self.direction, len);
        VehicleProgress {
            vehicle_id: self.vehicle_id.clone(),
            route: self.route.clone(),
            cursor,
            direction,
        }
    }
}

/// One reflecting step on `0..len`.
pub(crate) fn step(cursor: usize, direction: WalkDirection, len: usize) -> (usize, WalkDirection) {
    if len < 2 {
        return (0, direction);
    }
    let last = len - 1;
    match direction {
        WalkDirection::Forward if cursor < last => (cursor + 1, direction),
        WalkDirection::Forward => (last - 1, direction.flipped()),
        WalkDirection::Backward if cursor > 0 => (cursor - 1, direction),
        WalkDirection::Backward => (1, direction.flipped()),
    }
}

/// Concurrent map of vehicle id to progress.
///
/// Injected into the simulator rather than held globally. Each line is
/// advanced by a single task per tick, so entries never see concurrent
/// writers for the same vehicle.
#[derive(Debug, Default)]
pub struct ProgressStore {
    entries: DashMap<String, VehicleProgress>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<VehicleProgress> {
        self.entries.get(vehicle_id).map(|entry| entry.value().clone())
    }

    /// Stores `progress`, replacing the vehicle's previous state.
    pub fn commit(&self, progress: VehicleProgress) {
        self.entries.insert(progress.vehicle_id.clone(), progress);
    }

    pub fn remove(&self, vehicle_id: &str) -> Option<VehicleProgress> {
        self.entries.remove(vehicle_id).map(|(_, progress)| progress)
    }

    /// Drops every vehicle not in `active`. Returns how many were removed.
    pub fn retain_active(&self, active: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|vehicle_id, _| active.contains(vehicle_id));
        before.saturating_sub(self.entries.len())
    }

    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.entries.contains_key(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
