//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants, CPU-aware helper functions,
//! and the `ConfigFile::default()` implementation.

use super::file::config_directory;
use super::settings::*;
use crate::cache::{DEFAULT_FALLBACK_ANCHORS, DEFAULT_FALLBACK_RADIUS_DEG};
use crate::coord::{BoundingBox, Coordinate, COORD_EPSILON};
use crate::geometry::DEFAULT_CONNECT_THRESHOLD_DEG;
use crate::simulation::{DEFAULT_BASE_SPEED_KMH, DEFAULT_SPEED_JITTER_KMH};

// =============================================================================
// CPU helpers
// =============================================================================

/// Get the number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Resolves a configured worker count; 0 means one per CPU.
pub fn resolve_workers(configured: usize) -> usize {
    if configured == 0 {
        num_cpus()
    } else {
        configured
    }
}

// =============================================================================
// [simulation]
// =============================================================================

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_TICK_TIMEOUT_MS: u64 = 5_000;
/// 0 = available parallelism
pub const DEFAULT_WORKERS: usize = 0;

// =============================================================================
// [geometry]
// =============================================================================

pub const DEFAULT_DEDUP_EPSILON_DEG: f64 = COORD_EPSILON;

// =============================================================================
// [routing]
// =============================================================================

pub const DEFAULT_ROUTING_ENABLED: bool = true;
pub const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_ROUTING_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// [mapdata]
// =============================================================================

pub const DEFAULT_MAPDATA_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_MAPDATA_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAPDATA_MAX_ATTEMPTS: u32 = 4;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_IMPORT_CONCURRENCY: usize = 4;
/// Greater Lisbon (south, west, north, east)
pub const DEFAULT_SERVICE_AREA: (f64, f64, f64, f64) = (38.65, -9.30, 38.85, -9.05);

// =============================================================================
// Default impl
// =============================================================================

impl Default for ConfigFile {
    fn default() -> Self {
        let (south, west, north, east) = DEFAULT_SERVICE_AREA;
        Self {
            simulation: SimulationSettings {
                tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
                tick_timeout_ms: DEFAULT_TICK_TIMEOUT_MS,
                workers: DEFAULT_WORKERS,
                base_speed_kmh: DEFAULT_BASE_SPEED_KMH,
                speed_jitter_kmh: DEFAULT_SPEED_JITTER_KMH,
            },
            geometry: GeometrySettings {
                connect_threshold_deg: DEFAULT_CONNECT_THRESHOLD_DEG,
                dedup_epsilon_deg: DEFAULT_DEDUP_EPSILON_DEG,
            },
            routing: RoutingSettings {
                enabled: DEFAULT_ROUTING_ENABLED,
                url: DEFAULT_ROUTING_URL.to_string(),
                timeout_secs: DEFAULT_ROUTING_TIMEOUT_SECS,
            },
            mapdata: MapDataSettings {
                url: DEFAULT_MAPDATA_URL.to_string(),
                timeout_secs: DEFAULT_MAPDATA_TIMEOUT_SECS,
                max_attempts: DEFAULT_MAPDATA_MAX_ATTEMPTS,
                retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
                retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
                import_concurrency: DEFAULT_IMPORT_CONCURRENCY,
                service_area: BoundingBox {
                    south,
                    west,
                    north,
                    east,
                },
            },
            fallback: FallbackSettings {
                anchors: DEFAULT_FALLBACK_ANCHORS
                    .iter()
                    .filter_map(|&(lat, lon)| Coordinate::new(lat, lon).ok())
                    .collect(),
                radius_deg: DEFAULT_FALLBACK_RADIUS_DEG,
            },
            fleet: FleetSettings::default(),
            logging: LoggingSettings {
                file: config_directory().join("fleetpath.log"),
            },
        }
    }
}
