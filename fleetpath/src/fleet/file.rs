//! Fleet backed by a JSON file.
//!
//! ```json
//! {
//!   "routes":   [{"route": "728", "geometry": [[38.70, -9.13], [38.71, -9.14]]}],
//!   "vehicles": [{"vehicle_id": "bus-1", "route": "728"},
//!                {"vehicle_id": "bus-2", "route": null}]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{FleetError, FleetRepository, RouteRecord, VehicleAssignment};
use crate::geometry::RouteKey;

#[derive(Debug, Default, Deserialize)]
struct FleetDocument {
    #[serde(default)]
    routes: Vec<RouteRecord>,
    #[serde(default)]
    vehicles: Vec<VehicleEntry>,
}

#[derive(Debug, Deserialize)]
struct VehicleEntry {
    vehicle_id: String,
    #[serde(default)]
    route: Option<RouteKey>,
}

/// Re-reads the file on every call, so edits show up on the next tick.
#[derive(Debug, Clone)]
pub struct JsonFleetFile {
    path: PathBuf,
}

impl JsonFleetFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<FleetDocument, FleetError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| FleetError::Io(format!("{}: {}", self.path.display(), e)))?;
        let document: FleetDocument = serde_json::from_str(&text)
            .map_err(|e| FleetError::Parse(format!("{}: {}", self.path.display(), e)))?;
        debug!(
            path = %self.path.display(),
            routes = document.routes.len(),
            vehicles = document.vehicles.len(),
            "Fleet file read"
        );
        Ok(document)
    }
}

impl FleetRepository for JsonFleetFile {
    fn list_active_vehicles(&self) -> Result<Vec<VehicleAssignment>, FleetError> {
        Ok(self
            .read()?
            .vehicles
            .into_iter()
            .filter_map(|v| {
                v.route
                    .map(|route| VehicleAssignment::new(v.vehicle_id, route))
            })
            .collect())
    }

    fn list_routes(&self) -> Result<Vec<RouteRecord>, FleetError> {
        Ok(self.read()?.routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fleet_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_vehicles_and_routes() {
        let file = fleet_file(
            r#"{
                "routes": [
                    {"route": "728", "geometry": [[38.70, -9.13], [38.71, -9.14]]},
                    {"route": "15E:inbound"}
                ],
                "vehicles": [
                    {"vehicle_id": "bus-1", "route": "728"},
                    {"vehicle_id": "bus-2", "route": null},
                    {"vehicle_id": "bus-3"}
                ]
            }"#,
        );
        let fleet = JsonFleetFile::new(file.path());

        let vehicles = fleet.list_active_vehicles().unwrap();
        assert_eq!(vehicles, vec![VehicleAssignment::new("bus-1", RouteKey::outbound("728"))]);

        let routes = fleet.list_routes().unwrap();
        assert_eq!(routes.len(), 2);
        assert!(routes[0].geometry.is_some());
        assert_eq!(routes[1].route.to_string(), "15E:inbound");
        assert!(routes[1].geometry.is_none());
    }

    #[test]
    fn test_picks_up_edits() {
        let mut file = fleet_file(r#"{"vehicles": []}"#);
        let fleet = JsonFleetFile::new(file.path());
        assert!(fleet.list_active_vehicles().unwrap().is_empty());

        file.as_file_mut().set_len(0).unwrap();
        std::fs::write(file.path(), r#"{"vehicles": [{"vehicle_id": "t1", "route": "E28"}]}"#)
            .unwrap();
        assert_eq!(fleet.list_active_vehicles().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let fleet = JsonFleetFile::new("/nonexistent/fleet.json");
        assert!(matches!(fleet.list_routes(), Err(FleetError::Io(_))));
    }

    #[test]
    fn test_malformed_file() {
        let file = fleet_file("{ not json");
        let fleet = JsonFleetFile::new(file.path());
        assert!(matches!(fleet.list_active_vehicles(), Err(FleetError::Parse(_))));
    }
}
