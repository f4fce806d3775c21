//! User configuration loaded from `~/.fleetpath/config.ini`.
//!
//! Split by concern:
//!
//! - [`settings`]: one plain struct per INI section
//! - `defaults`: `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser`: INI → [`ConfigFile`] with validation
//! - `writer`: [`ConfigFile`] → commented INI
//! - `file`: load/save and path helpers
//!
//! # Example
//!
//! ```
//! use fleetpath::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.simulation.tick_interval_ms, 1_000);
//! ```

mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, FallbackSettings, FleetSettings, GeometrySettings, LoggingSettings,
    MapDataSettings, RoutingSettings, SimulationSettings,
};
