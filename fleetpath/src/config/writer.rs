//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;
use crate::coord::Coordinate;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let fleet_file = config
        .fleet
        .file
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();
    let routing_enabled = if config.routing.enabled {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[simulation]
; Milliseconds between simulation ticks
tick_interval_ms = {}
; Upper bound on a single tick; lines still running are abandoned
tick_timeout_ms = {}
; Lines advanced concurrently (0 = one per CPU core)
workers = {}
; Synthetic speed: base +/- jitter, in km/h
base_speed_kmh = {}
speed_jitter_kmh = {}

[geometry]
; Segment endpoints closer than this (degrees) are joined without routing
connect_threshold_deg = {}
; Consecutive points closer than this (degrees) are collapsed
dedup_epsilon_deg = {}

[routing]
; Fill gaps between segments with a routed path
enabled = {}
; OSRM-compatible routing service
url = {}
timeout_secs = {}

[mapdata]
; Overpass API interpreter used to fetch route segments and stops
url = {}
timeout_secs = {}
; Attempts per fetch including the first, with exponential backoff
max_attempts = {}
retry_base_delay_ms = {}
retry_max_delay_ms = {}
; Routes imported in parallel
import_concurrency = {}
; Query area as south,west,north,east
service_area = {}

[fallback]
; Loop centres for vehicles on routes without geometry (lat,lon | lat,lon)
anchors = {}
radius_deg = {}

[fleet]
; JSON file with routes and vehicle assignments
file = {}

[logging]
file = {}
"#,
        config.simulation.tick_interval_ms,
        config.simulation.tick_timeout_ms,
        config.simulation.workers,
        config.simulation.base_speed_kmh,
        config.simulation.speed_jitter_kmh,
        config.geometry.connect_threshold_deg,
        config.geometry.dedup_epsilon_deg,
        routing_enabled,
        config.routing.url,
        config.routing.timeout_secs,
        config.mapdata.url,
        config.mapdata.timeout_secs,
        config.mapdata.max_attempts,
        config.mapdata.retry_base_delay_ms,
        config.mapdata.retry_max_delay_ms,
        config.mapdata.import_concurrency,
        config.mapdata.service_area,
        anchors_to_string(&config.fallback.anchors),
        config.fallback.radius_deg,
        fleet_file,
        path_to_string(&config.logging.file),
    )
}

fn anchors_to_string(anchors: &[Coordinate]) -> String {
    anchors
        .iter()
        .map(|c| format!("{},{}", c.latitude(), c.longitude()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
