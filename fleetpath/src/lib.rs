//! fleetpath - route geometry reconstruction and fleet position simulation
//!
//! This library turns fragmentary map data (unordered, arbitrarily oriented
//! way segments) into one continuous polyline per route, caches those
//! polylines, and periodically advances every active vehicle along its route,
//! publishing a position sample per vehicle per tick.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use fleetpath::config::ConfigFile;
//! use fleetpath::fleet::JsonFleetFile;
//! use fleetpath::service::{FleetService, ServiceConfig};
//! use fleetpath::transport::JsonLinesPublisher;
//!
//! let config = ServiceConfig::from_config_file(&ConfigFile::load()?);
//! let service = FleetService::new(
//!     config,
//!     Arc::new(JsonFleetFile::new("fleet.json")),
//!     Arc::new(JsonLinesPublisher::stdout()),
//! )?;
//!
//! service.import().await?;
//! service.run(shutdown).await;
//! ```
//!
//! The building blocks are usable on their own: [`geometry::GeometryStitcher`]
//! for offline stitching, [`simulation::PositionSimulator`] for stepping
//! vehicles, [`scheduler::SimulationScheduler`] for the tick loop.

pub mod cache;
pub mod config;
pub mod coord;
pub mod fleet;
pub mod gap;
pub mod geometry;
pub mod import;
pub mod logging;
pub mod mapdata;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod simulation;
pub mod transport;

/// Version of the fleetpath library and CLI.
///
/// Defined in the workspace `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
