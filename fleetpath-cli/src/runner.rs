//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, runtime and service
//! creation to reduce duplication across command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fleetpath::config::{config_file_path, ConfigFile};
use fleetpath::fleet::JsonFleetFile;
use fleetpath::logging::{init_logging, LoggingGuard};
use fleetpath::service::{FleetService, ServiceConfig};
use fleetpath::transport::PositionPublisher;
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Alternate config file
    pub config: Option<PathBuf>,
    /// Debug-level logging
    pub verbose: bool,
}

impl GlobalOptions {
    /// Config file in effect: `--config` or ~/.fleetpath/config.ini.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config file (defaults when missing) and start logging.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = ConfigFile::load_from(&options.config_path())?;

        let logging_guard = init_logging(&config.logging.file, options.verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("fleetpath v{}", fleetpath::VERSION);
        info!("fleetpath CLI: {} command", command);
    }

    /// Service settings resolved from the config file.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::from_config_file(&self.config)
    }

    /// Fleet file from the command line, falling back to `[fleet] file`.
    pub fn fleet_file(&self, from_args: Option<&Path>) -> Result<PathBuf, CliError> {
        resolve_fleet_file(from_args, self.config.fleet.file.as_deref())
    }

    /// Multi-threaded runtime for the async parts of a command.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("fleetpath-worker")
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))
    }

    /// Create a service over a JSON fleet file.
    ///
    /// Must be called outside the runtime: the map-data and routing clients
    /// are blocking HTTP clients.
    pub fn create_service<P: PositionPublisher>(
        &self,
        config: ServiceConfig,
        fleet_file: &Path,
        publisher: Arc<P>,
    ) -> Result<FleetService<JsonFleetFile, P>, CliError> {
        info!(
            fleet = %fleet_file.display(),
            mapdata = %config.mapdata().url,
            routing = config.routing().map(|r| r.url.as_str()).unwrap_or("disabled"),
            "Creating fleet service"
        );

        FleetService::new(config, Arc::new(JsonFleetFile::new(fleet_file)), publisher)
            .map_err(CliError::ServiceCreation)
            .inspect(|_| info!("Service created successfully"))
    }
}

fn resolve_fleet_file(
    from_args: Option<&Path>,
    from_config: Option<&Path>,
) -> Result<PathBuf, CliError> {
    from_args
        .or(from_config)
        .map(Path::to_path_buf)
        .ok_or(CliError::MissingFleetFile)
}
