//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use fleetpath::config::ConfigFileError;
use fleetpath::import::ImportError;
use fleetpath::service::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Invalid argument or setting
    Config(String),
    /// Config file could not be read or written
    ConfigFile(ConfigFileError),
    /// Failed to create service
    ServiceCreation(ServiceError),
    /// Route import failed
    Import(ServiceError),
    /// Failed to build the async runtime or install the signal handler
    Runtime(String),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Failed to write output file
    FileWrite { path: PathBuf, error: std::io::Error },
    /// Offline stitching failed
    Stitch(String),
    /// Neither `--fleet` nor `[fleet] file` was given
    MissingFleetFile,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Import(ServiceError::ImportError(ImportError::UpstreamFetchFailed {
                ..
            })) => {
                eprintln!();
                eprintln!("Map data could not be fetched. Check that:");
                eprintln!("  1. The [mapdata] url in the config file is reachable");
                eprintln!("  2. The service area is not too large for the server");
                eprintln!("  3. You are not being rate limited (raise retry_max_delay_ms)");
            }
            CliError::MissingFleetFile => {
                eprintln!();
                eprintln!("Pass --fleet <FILE> or set it in the config file:");
                eprintln!("  [fleet]");
                eprintln!("  file = ~/fleet.json");
            }
            CliError::ConfigFile(_) => {
                eprintln!();
                eprintln!("Run 'fleetpath config show' to see the effective settings,");
                eprintln!("or 'fleetpath config init --force' to reset to defaults.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::ServiceCreation(e) => write!(f, "Failed to create service: {}", e),
            CliError::Import(e) => write!(f, "Route import failed: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path.display(), error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path.display(), error)
            }
            CliError::Stitch(msg) => write!(f, "Stitching failed: {}", msg),
            CliError::MissingFleetFile => write!(f, "No fleet file configured"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Import(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::ServiceCreation(e)
    }
}
