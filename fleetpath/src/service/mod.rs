//! High-level service facade.
//!
//! [`FleetService`] hides the wiring between configuration, collaborators,
//! the geometry cache, the simulator and the scheduler. Front ends (the CLI,
//! an embedding application) build a [`ServiceConfig`] from the user's config
//! file, hand over a fleet repository and a publisher, then call
//! [`FleetService::import`] followed by [`FleetService::run`].

mod config;
mod error;
mod facade;

pub use config::{Endpoint, ServiceConfig};
pub use error::ServiceError;
pub use facade::{FleetService, ServiceGapFiller};
