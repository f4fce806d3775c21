//! Roster preparation for a tick.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::fleet::VehicleAssignment;

/// Active vehicles grouped by line id.
#[derive(Debug, Default)]
pub(crate) struct PartitionedRoster {
    /// Ids of every distinct vehicle in the roster
    pub active: HashSet<String>,
    /// Line id → vehicles on that line, in roster order
    pub lines: BTreeMap<String, Vec<VehicleAssignment>>,
}

/// Deduplicates the roster by vehicle id (first entry wins) and groups it by line.
pub(crate) fn partition_roster(roster: Vec<VehicleAssignment>) -> PartitionedRoster {
    let mut partitioned = PartitionedRoster::default();
    let mut duplicates = 0usize;

    for assignment in roster {
        if !partitioned.active.insert(assignment.vehicle_id.clone()) {
            duplicates += 1;
            continue;
        }
        partitioned
            .lines
            .entry(assignment.route.line_id().to_string())
            .or_default()
            .push(assignment);
    }

    if duplicates > 0 {
        debug!(duplicates, "Dropped duplicate roster entries");
    }
    partitioned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{RouteDirection, RouteKey};

    #[test]
    fn test_partition_by_line() {
        let roster = vec![
            VehicleAssignment::new("a", RouteKey::outbound("L1")),
            VehicleAssignment::new("b", RouteKey::new("L1", RouteDirection::Inbound)),
            VehicleAssignment::new("c", RouteKey::outbound("L2")),
        ];
        let partitioned = partition_roster(roster);
        assert_eq!(partitioned.lines.len(), 2);
        assert_eq!(partitioned.lines["L1"].len(), 2);
        assert_eq!(partitioned.lines["L2"][0].vehicle_id, "c");
        assert_eq!(partitioned.active.len(), 3);
    }

    #[test]
    fn test_duplicate_vehicle_is_dropped() {
        let roster = vec![
            VehicleAssignment::new("a", RouteKey::outbound("L1")),
            VehicleAssignment::new("a", RouteKey::outbound("L2")),
        ];
        let partitioned = partition_roster(roster);
        assert_eq!(partitioned.lines.len(), 1);
        assert!(partitioned.lines.contains_key("L1"));
    }

    #[test]
    fn test_empty_roster() {
        let partitioned = partition_roster(Vec::new());
        assert!(partitioned.lines.is_empty());
        assert!(partitioned.active.is_empty());
    }
}
