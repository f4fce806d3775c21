//! Tick results.

use std::fmt;
use std::time::Duration;

/// How a tick ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every line task finished before the deadline.
    Completed,
    /// The deadline passed; unfinished line tasks were abandoned.
    TimedOut,
    /// The roster could not be read; nothing was simulated.
    Skipped(String),
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Distinct lines in the roster
    pub lines: usize,
    pub lines_completed: usize,
    /// Line tasks that panicked
    pub lines_failed: usize,
    /// Line tasks still running at the deadline
    pub lines_abandoned: usize,
    /// Distinct active vehicles
    pub vehicles: usize,
    pub samples_published: usize,
    pub publish_failures: usize,
    /// Vehicles whose progress was dropped because they left the roster
    pub pruned: usize,
    pub timed_out: bool,
    /// Why the tick was skipped, if it was
    pub skipped: Option<String>,
    pub elapsed: Duration,
}

impl TickReport {
    pub(crate) fn skipped(reason: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            skipped: Some(reason.into()),
            elapsed,
            ..Default::default()
        }
    }

    pub fn outcome(&self) -> TickOutcome {
        if let Some(reason) = &self.skipped {
            TickOutcome::Skipped(reason.clone())
        } else if self.timed_out {
            TickOutcome::TimedOut
        } else {
            TickOutcome::Completed
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = &self.skipped {
            return write!(f, "tick skipped: {}", reason);
        }
        write!(
            f,
            "{} lines ({} done, {} failed, {} abandoned), {} samples, {} publish failures in {:?}",
            self.lines,
            self.lines_completed,
            self.lines_failed,
            self.lines_abandoned,
            self.samples_published,
            self.publish_failures,
            self.elapsed
        )
    }
}
