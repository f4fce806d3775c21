//! fleetpath CLI - Command-line interface
//!
//! This binary provides a command-line interface to the fleetpath library:
//! import route geometry, run the fleet simulation, stitch geometry files
//! offline, and manage the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::import::ImportArgs;
use commands::run::RunArgs;
use commands::stitch::StitchArgs;
use runner::GlobalOptions;

#[derive(Debug, Parser)]
#[command(name = "fleetpath")]
#[command(version = fleetpath::VERSION)]
#[command(about = "Reconstruct transit route geometry and simulate fleet positions")]
struct Cli {
    /// Config file (default: ~/.fleetpath/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import routes, then publish vehicle positions every tick
    ///
    /// Samples are written to stdout as JSON lines. Stops on Ctrl+C or after
    /// --ticks ticks.
    Run(RunArgs),

    /// Build route geometry once and write it as JSON
    Import(ImportArgs),

    /// Stitch a stored geometry file into one polyline
    Stitch(StitchArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, &options),
        Commands::Import(args) => commands::import::run(args, &options),
        Commands::Stitch(args) => commands::stitch::run(args, &options),
        Commands::Config(command) => commands::config::run(command, &options),
    };

    if let Err(e) = result {
        e.exit();
    }
}
