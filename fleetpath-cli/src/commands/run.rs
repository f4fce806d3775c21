//! Run command - import routes, then simulate the fleet until stopped.
//!
//! Position samples are written to stdout as JSON lines; logs go to stderr
//! and the log file. Ctrl+C (or `--ticks`) stops the scheduler after the
//! current tick.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use fleetpath::fleet::JsonFleetFile;
use fleetpath::scheduler::TickOutcome;
use fleetpath::service::{FleetService, ServiceConfig};
use fleetpath::transport::{JsonLinesPublisher, PositionPublisher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for `fleetpath run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Fleet file with routes and vehicle assignments (overrides [fleet] file)
    #[arg(long)]
    pub fleet: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Tick interval in milliseconds
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Tick deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Concurrent line tasks per tick (0 = CPU count)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Leave gaps between segments unfilled
    #[arg(long)]
    pub no_routing: bool,
}

/// Run the simulation.
pub fn run(args: RunArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("run");

    let fleet_file = runner.fleet_file(args.fleet.as_deref())?;
    let config = apply_overrides(runner.service_config(), &args)?;
    let service = runner.create_service(
        config,
        &fleet_file,
        Arc::new(JsonLinesPublisher::stdout()),
    )?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    ctrlc::set_handler(move || signal_token.cancel())
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let runtime = runner.runtime()?;
    runtime.block_on(simulate(&service, shutdown, args.ticks))
}

/// Apply command-line overrides to the scheduler settings.
fn apply_overrides(config: ServiceConfig, args: &RunArgs) -> Result<ServiceConfig, CliError> {
    let mut scheduler = config.scheduler().clone();

    if let Some(ms) = args.tick_ms {
        if ms == 0 {
            return Err(CliError::Config("--tick-ms must be positive".to_string()));
        }
        scheduler.tick_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = args.timeout_ms {
        if ms == 0 {
            return Err(CliError::Config("--timeout-ms must be positive".to_string()));
        }
        scheduler.tick_timeout = Duration::from_millis(ms);
    }
    if let Some(workers) = args.workers {
        scheduler.workers = fleetpath::config::resolve_workers(workers);
    }
    if args.ticks == Some(0) {
        return Err(CliError::Config("--ticks must be positive".to_string()));
    }

    let config = config.with_scheduler(scheduler);
    Ok(if args.no_routing {
        config.without_routing()
    } else {
        config
    })
}

async fn simulate<P: PositionPublisher>(
    service: &FleetService<JsonFleetFile, P>,
    shutdown: CancellationToken,
    max_ticks: Option<u64>,
) -> Result<(), CliError> {
    let report = service.import().await.map_err(CliError::Import)?;
    eprintln!("{}", report);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = service.scheduler().with_report_channel(tx);
    let handle = tokio::spawn(scheduler.run(shutdown.clone()));

    let mut ticks = 0u64;
    let mut timed_out = 0u64;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            report = rx.recv() => {
                let Some(report) = report else { break };
                ticks += 1;
                match report.outcome() {
                    TickOutcome::Completed => {}
                    TickOutcome::TimedOut => timed_out += 1,
                    TickOutcome::Skipped(reason) => warn!(tick = ticks, %reason, "Tick skipped"),
                }
                if max_ticks.is_some_and(|max| ticks >= max) {
                    shutdown.cancel();
                    break;
                }
            }
        }
    }

    handle
        .await
        .map_err(|e| CliError::Runtime(format!("Scheduler task failed: {}", e)))?;

    info!(ticks, timed_out, "Simulation stopped");
    eprintln!("Stopped after {} ticks ({} timed out)", ticks, timed_out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            fleet: None,
            ticks: None,
            tick_ms: None,
            timeout_ms: None,
            workers: None,
            no_routing: false,
        }
    }

    #[test]
    fn test_overrides_replace_scheduler_settings() {
        let config = apply_overrides(
            ServiceConfig::default(),
            &RunArgs {
                tick_ms: Some(250),
                timeout_ms: Some(200),
                workers: Some(3),
                no_routing: true,
                ..args()
            },
        )
        .unwrap();

        assert_eq!(config.scheduler().tick_interval, Duration::from_millis(250));
        assert_eq!(config.scheduler().tick_timeout, Duration::from_millis(200));
        assert_eq!(config.scheduler().workers, 3);
        assert!(config.routing().is_none());
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = apply_overrides(ServiceConfig::default(), &args()).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_zero_values_rejected() {
        for bad in [
            RunArgs { tick_ms: Some(0), ..args() },
            RunArgs { timeout_ms: Some(0), ..args() },
            RunArgs { ticks: Some(0), ..args() },
        ] {
            assert!(matches!(
                apply_overrides(ServiceConfig::default(), &bad),
                Err(CliError::Config(_))
            ));
        }
    }
}
