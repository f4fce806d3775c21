//! Vehicle position simulation.
//!
//! Each active vehicle walks its route polyline one point per tick, turning
//! around at either end. Walk state lives in an injected [`ProgressStore`];
//! the [`PositionSimulator`] is its only writer.

mod progress;
mod simulator;
mod speed;

pub use progress::{ProgressStore, VehicleProgress, WalkDirection};
pub use simulator::{start_cursor, PositionSample, PositionSimulator};
pub use speed::{SpeedModel, DEFAULT_BASE_SPEED_KMH, DEFAULT_SPEED_JITTER_KMH};
