//! Simulation tick daemon.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::report::TickReport;
use super::roster::partition_roster;
use crate::fleet::{FleetError, FleetRepository, VehicleAssignment};
use crate::simulation::PositionSimulator;
use crate::transport::PositionPublisher;

/// Default interval between ticks (1 second).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on a single tick (5 seconds).
pub const DEFAULT_TICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Scheduler timing and fan-out settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub tick_timeout: Duration,
    /// Concurrent line tasks per tick
    pub workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            tick_timeout: DEFAULT_TICK_TIMEOUT,
            workers: default_workers(),
        }
    }
}

/// Available parallelism, or 4 if it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    TickRunning,
}

/// Roster read running on the blocking pool.
type RosterRead = JoinHandle<Result<Vec<VehicleAssignment>, FleetError>>;

/// Counts reported by one line task.
#[derive(Debug, Default)]
struct LineResult {
    published: usize,
    failures: usize,
}

/// Periodically advances every active vehicle and publishes its position.
///
/// One tick reads the roster, groups vehicles by line and runs one task per
/// line, at most `workers` at a time. Lines that have not finished when the
/// tick timeout expires are aborted; their vehicles miss this sample. A
/// panicking line only loses its own samples.
pub struct SimulationScheduler<F, P> {
    fleet: Arc<F>,
    simulator: Arc<PositionSimulator>,
    publisher: Arc<P>,
    config: SchedulerConfig,
    state: Arc<Mutex<SchedulerState>>,
    ticks: Arc<AtomicU64>,
    reports: Option<mpsc::UnboundedSender<TickReport>>,
    /// Read that outlived its tick; the next tick waits on it instead of
    /// starting another one.
    pending_roster: Arc<Mutex<Option<RosterRead>>>,
}

impl<F, P> SimulationScheduler<F, P>
where
    F: FleetRepository,
    P: PositionPublisher,
{
    pub fn new(fleet: Arc<F>, simulator: Arc<PositionSimulator>, publisher: Arc<P>) -> Self {
        Self {
            fleet,
            simulator,
            publisher,
            config: SchedulerConfig::default(),
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
            ticks: Arc::new(AtomicU64::new(0)),
            reports: None,
            pending_roster: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sends every tick report to `tx` as well as logging it.
    pub fn with_report_channel(mut self, tx: mpsc::UnboundedSender<TickReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Runs a single tick.
    pub async fn tick(&self) -> TickReport {
        *self.state.lock() = SchedulerState::TickRunning;
        let report = self.run_tick().await;
        *self.state.lock() = SchedulerState::Idle;
        self.ticks.fetch_add(1, Ordering::Relaxed);
        report
    }

    async fn run_tick(&self) -> TickReport {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.tick_timeout;

        let roster = match self.read_roster(deadline).await {
            Ok(roster) => roster,
            Err(reason) => {
                warn!(reason = %reason, "Skipping tick, roster unavailable");
                return TickReport::skipped(reason, started.elapsed());
            }
        };

        let partitioned = partition_roster(roster);
        let pruned = self.simulator.retain(&partitioned.active);
        if pruned > 0 {
            debug!(pruned, "Dropped progress for inactive vehicles");
        }

        let mut report = TickReport {
            lines: partitioned.lines.len(),
            vehicles: partitioned.active.len(),
            pruned,
            ..Default::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();
        for (line, vehicles) in partitioned.lines {
            tasks.spawn(run_line(
                line,
                vehicles,
                Arc::clone(&semaphore),
                Arc::clone(&self.simulator),
                Arc::clone(&self.publisher),
            ));
        }

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(line))) => {
                    report.lines_completed += 1;
                    report.samples_published += line.published;
                    report.publish_failures += line.failures;
                }
                Ok(Some(Err(e))) => {
                    report.lines_failed += 1;
                    if e.is_panic() {
                        warn!(error = %e, "Line task panicked");
                    } else {
                        warn!(error = %e, "Line task cancelled");
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    report.timed_out = true;
                    report.lines_abandoned = tasks.len();
                    tasks.abort_all();
                    warn!(
                        abandoned = report.lines_abandoned,
                        timeout_ms = self.config.tick_timeout.as_millis() as u64,
                        "Tick timed out"
                    );
                    break;
                }
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    /// Reads the roster on the blocking pool, bounded by the tick deadline.
    ///
    /// A read still running from an earlier tick is awaited again rather
    /// than joined by a second one, so a hanging repository holds at most
    /// one blocking thread.
    async fn read_roster(
        &self,
        deadline: tokio::time::Instant,
    ) -> Result<Vec<VehicleAssignment>, String> {
        let pending = self.pending_roster.lock().take();
        let mut read = match pending {
            Some(read) if !read.is_finished() => {
                debug!("Previous roster read still running, waiting on it");
                read
            }
            _ => {
                let fleet = Arc::clone(&self.fleet);
                tokio::task::spawn_blocking(move || fleet.list_active_vehicles())
            }
        };

        match tokio::time::timeout_at(deadline, &mut read).await {
            Ok(Ok(Ok(roster))) => Ok(roster),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(e)) => Err(format!("roster read task failed: {}", e)),
            Err(_) => {
                *self.pending_roster.lock() = Some(read);
                Err("roster read timed out".to_string())
            }
        }
    }

    /// Runs ticks until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            tick_interval_ms = self.config.tick_interval.as_millis() as u64,
            tick_timeout_ms = self.config.tick_timeout.as_millis() as u64,
            workers = self.config.workers,
            "Simulation scheduler starting"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!(ticks = self.ticks(), "Simulation scheduler shutting down");
                    break;
                }

                _ = interval.tick() => {
                    let report = self.tick().await;
                    if report.skipped.is_none() && !report.timed_out {
                        debug!(
                            lines = report.lines,
                            vehicles = report.vehicles,
                            samples = report.samples_published,
                            elapsed_ms = report.elapsed.as_millis() as u64,
                            "Tick complete"
                        );
                    }
                    if let Some(tx) = &self.reports {
                        // Receiver gone just means nobody is listening.
                        let _ = tx.send(report);
                    }
                }
            }
        }
    }
}

/// Advances and publishes every vehicle on one line.
async fn run_line<P: PositionPublisher>(
    line: String,
    vehicles: Vec<VehicleAssignment>,
    semaphore: Arc<Semaphore>,
    simulator: Arc<PositionSimulator>,
    publisher: Arc<P>,
) -> LineResult {
    let mut result = LineResult::default();
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return result;
    };

    for vehicle in &vehicles {
        let sample = simulator.advance(&vehicle.vehicle_id, &vehicle.route);
        match publisher.publish(&line, &sample).await {
            Ok(()) => result.published += 1,
            Err(e) => {
                result.failures += 1;
                warn!(line = %line, vehicle_id = %vehicle.vehicle_id, error = %e, "Publish failed");
            }
        }
    }
    result
}
