//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::coord::{BoundingBox, Coordinate};

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub simulation: SimulationSettings,
    pub geometry: GeometrySettings,
    pub routing: RoutingSettings,
    pub mapdata: MapDataSettings,
    pub fallback: FallbackSettings,
    pub fleet: FleetSettings,
    pub logging: LoggingSettings,
}

/// Tick timing, fan-out and speed synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,
    /// Upper bound on one tick in milliseconds
    pub tick_timeout_ms: u64,
    /// Concurrent line tasks; 0 means available parallelism
    pub workers: usize,
    pub base_speed_kmh: f64,
    pub speed_jitter_kmh: f64,
}

/// Stitching parameters, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySettings {
    pub connect_threshold_deg: f64,
    pub dedup_epsilon_deg: f64,
}

/// Routing collaborator used for gap filling.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSettings {
    /// When false, gaps are never filled
    pub enabled: bool,
    /// OSRM-compatible base URL
    pub url: String,
    pub timeout_secs: u64,
}

/// Map-data collaborator and import behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDataSettings {
    /// Overpass API interpreter URL
    pub url: String,
    pub timeout_secs: u64,
    /// Attempts per fetch, including the first
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Routes imported in parallel
    pub import_concurrency: usize,
    /// Map-data queries are limited to this area
    pub service_area: BoundingBox,
}

/// Fallback loops for routes without geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackSettings {
    pub anchors: Vec<Coordinate>,
    pub radius_deg: f64,
}

/// Fleet roster source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FleetSettings {
    /// JSON fleet file; required by `run` and `import` unless given on the command line
    pub file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
