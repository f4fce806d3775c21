//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, path, show)
//! - [`import`] - One-shot route import, geometry written as JSON
//! - [`run`] - Main command (import, then simulate until stopped)
//! - [`stitch`] - Offline stitching of a stored geometry file

pub mod config;
pub mod import;
pub mod run;
pub mod stitch;
