//! Configuration management CLI commands.
//!
//! Provides `config init`, `config path` and `config show`.

use clap::Subcommand;
use fleetpath::config::ConfigFile;

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,

    /// Print the effective configuration
    ///
    /// Missing settings are shown with their default values.
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, options: &GlobalOptions) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(options, force),
        ConfigCommands::Path => run_path(options),
        ConfigCommands::Show => run_show(options),
    }
}

fn run_init(options: &GlobalOptions, force: bool) -> Result<(), CliError> {
    let path = options.config_path();

    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn run_path(options: &GlobalOptions) -> Result<(), CliError> {
    let path = options.config_path();
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; defaults are in effect)");
    }
    Ok(())
}

fn run_show(options: &GlobalOptions) -> Result<(), CliError> {
    let config = ConfigFile::load_from(&options.config_path())?;
    print!("{}", config.to_ini_string());
    Ok(())
}
