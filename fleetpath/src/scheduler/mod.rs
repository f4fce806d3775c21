//! Tick scheduling and per-line fan-out.
//!
//! # Architecture
//!
//! ```text
//!            interval (missed ticks skipped)
//!                     │
//!                     ▼
//!   Idle ──▶ TickRunning: read roster ─▶ dedupe ─▶ prune progress ─▶ group by line
//!    ▲                                                                  │
//!    │              JoinSet + Semaphore(workers), one task per line ◀───┘
//!    │                     │ advance() → publish(line, sample)
//!    └──── TickReport ◀────┘ (deadline: abort unfinished lines)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let scheduler = SimulationScheduler::new(fleet, simulator, publisher)
//!     .with_config(SchedulerConfig::default());
//!
//! tokio::spawn(scheduler.run(shutdown_token));
//! ```

mod daemon;
mod report;
mod roster;

pub use daemon::{
    default_workers, SchedulerConfig, SchedulerState, SimulationScheduler, DEFAULT_TICK_INTERVAL,
    DEFAULT_TICK_TIMEOUT,
};
pub use report::{TickOutcome, TickReport};
