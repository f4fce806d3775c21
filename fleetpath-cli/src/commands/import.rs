//! Import command - build route geometry once and write it out.
//!
//! The output has the same `routes` shape as a fleet file, so it can be
//! merged back in as stored geometry and later runs skip map data entirely.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use fleetpath::cache::RouteGeometryCache;
use fleetpath::fleet::RouteRecord;
use fleetpath::geometry::GeometryBlob;
use fleetpath::import::{ImportReport, RouteOutcome};
use fleetpath::transport::JsonLinesPublisher;
use serde_json::json;
use tracing::info;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for `fleetpath import`.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Fleet file listing the routes (overrides [fleet] file)
    #[arg(long)]
    pub fleet: Option<PathBuf>,

    /// Write the geometry here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leave gaps between segments unfilled
    #[arg(long)]
    pub no_routing: bool,
}

/// Run the import.
pub fn run(args: ImportArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("import");

    let fleet_file = runner.fleet_file(args.fleet.as_deref())?;
    let mut config = runner.service_config();
    if args.no_routing {
        config = config.without_routing();
    }

    // Nothing is simulated, so samples have nowhere to go.
    let publisher = Arc::new(JsonLinesPublisher::with_writer(Box::new(std::io::sink())));
    let service = runner.create_service(config, &fleet_file, publisher)?;

    let runtime = runner.runtime()?;
    let report = runtime
        .block_on(service.import())
        .map_err(CliError::Import)?;

    print_report(&report);

    let document = geometry_document(&report, service.cache());
    let text = serde_json::to_string_pretty(&document)
        .map_err(|e| CliError::Config(format!("Failed to encode geometry: {}", e)))?;

    match &args.output {
        Some(path) => {
            fs::write(path, text + "\n").map_err(|error| CliError::FileWrite {
                path: path.clone(),
                error,
            })?;
            info!(path = %path.display(), routes = report.imported(), "Geometry written");
            eprintln!("Wrote {} routes to {}", report.imported(), path.display());
        }
        None => println!("{}", text),
    }

    Ok(())
}

/// `{"routes": [...]}` with one record per imported route, in report order.
///
/// Routes without geometry are listed without a `geometry` field.
fn geometry_document(report: &ImportReport, cache: &RouteGeometryCache) -> serde_json::Value {
    let routes: Vec<RouteRecord> = report
        .routes
        .iter()
        .map(|result| {
            let record = RouteRecord::new(result.route.clone());
            match cache.get(&result.route) {
                Ok(polyline) => match serde_json::to_value(GeometryBlob::from_polyline(&polyline)) {
                    Ok(geometry) => record.with_geometry(geometry),
                    Err(_) => record,
                },
                Err(_) => record,
            }
        })
        .collect();

    json!({ "routes": routes })
}

fn print_report(report: &ImportReport) {
    for result in &report.routes {
        let detail = match &result.outcome {
            RouteOutcome::Imported {
                source,
                points,
                gaps_filled,
                discontinuities,
            } => {
                let mut line = format!("{} points from {}", points, source);
                if *gaps_filled > 0 {
                    line.push_str(&format!(", {} gaps filled", gaps_filled));
                }
                if *discontinuities > 0 {
                    line.push_str(&format!(", {} gaps open", discontinuities));
                }
                line
            }
            RouteOutcome::WithoutGeometry { reason } => format!("no geometry ({})", reason),
            RouteOutcome::FetchFailed { attempts, reason } => {
                format!("fetch failed after {} attempts ({})", attempts, reason)
            }
        };
        eprintln!("  {:<24} {}", result.route.to_string(), detail);
    }
    eprintln!("{}", report);
}
