//! Stitch command - assemble a stored geometry file offline.
//!
//! Reads a geometry blob (`[[lat, lon], ...]` or a list of such pieces),
//! stitches it into one polyline, optionally orients it by stops and writes
//! the result as a single `[[lat, lon], ...]` array.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use fleetpath::coord::{parse_lat_lon, Coordinate};
use fleetpath::gap::GapFiller;
use fleetpath::geometry::{
    orient_by_stops, GeometryBlob, GeometryStitcher, StitchConfig, StitchOutcome,
};
use fleetpath::service::ServiceGapFiller;
use tracing::info;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for `fleetpath stitch`.
#[derive(Debug, Args)]
pub struct StitchArgs {
    /// Geometry file to stitch
    pub input: PathBuf,

    /// Write the polyline here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Connectivity threshold in degrees (overrides [geometry] connect_threshold_deg)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Stops in travel order, as "lat,lon|lat,lon|..."
    #[arg(long)]
    pub stops: Option<String>,

    /// Bridge gaps with the configured routing service
    #[arg(long)]
    pub route_gaps: bool,
}

/// Run offline stitching.
pub fn run(args: StitchArgs, options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("stitch");

    let mut stitch = runner.service_config().import().stitch;
    if let Some(threshold) = args.threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(CliError::Config(format!(
                "--threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        stitch.connect_threshold = threshold;
    }

    let stops = match &args.stops {
        Some(text) => parse_stops(text)?,
        None => Vec::new(),
    };

    let routing = if args.route_gaps {
        let config = runner.service_config();
        let endpoint = config.routing().cloned().ok_or_else(|| {
            CliError::Config("--route-gaps needs [routing] enabled = true".to_string())
        })?;
        Some(endpoint)
    } else {
        None
    };
    let gap_filler =
        ServiceGapFiller::from_endpoint(routing.as_ref()).map_err(CliError::ServiceCreation)?;

    let input = read_input(&args.input)?;
    let (points, outcome) = stitch_value(&input, stitch, &stops, &gap_filler)?;

    info!(
        input = %args.input.display(),
        points = outcome.polyline.len(),
        segments = outcome.segments_used,
        gaps_filled = outcome.gaps_filled,
        discontinuities = outcome.discontinuities,
        "Geometry stitched"
    );
    eprintln!(
        "{} points from {} segments ({} gaps filled, {} gaps open, {} segments unreached)",
        outcome.polyline.len(),
        outcome.segments_used,
        outcome.gaps_filled,
        outcome.discontinuities,
        outcome.unreached
    );

    let text = serde_json::to_string(&points)
        .map_err(|e| CliError::Stitch(format!("Failed to encode polyline: {}", e)))?;
    match &args.output {
        Some(path) => fs::write(path, text + "\n").map_err(|error| CliError::FileWrite {
            path: path.clone(),
            error,
        }),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> Result<serde_json::Value, CliError> {
    let text = fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.to_path_buf(),
        error,
    })?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Stitch(format!("{}: not valid JSON ({})", path.display(), e)))
}

/// Parse `"lat,lon|lat,lon"` into coordinates.
fn parse_stops(text: &str) -> Result<Vec<Coordinate>, CliError> {
    text.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            parse_lat_lon(pair)
                .map_err(|e| CliError::Config(format!("Invalid stop '{}': {}", pair, e)))
        })
        .collect()
}

/// Stitch a geometry blob and orient it by `stops`.
///
/// Returns the encoded polyline and the stitching statistics.
fn stitch_value(
    value: &serde_json::Value,
    config: StitchConfig,
    stops: &[Coordinate],
    gap_filler: &dyn GapFiller,
) -> Result<(GeometryBlob, StitchOutcome), CliError> {
    let mut outcome = GeometryBlob::from_value(value)
        .and_then(|blob| blob.stitch(&GeometryStitcher::new(config), gap_filler))
        .map_err(|e| CliError::Stitch(e.to_string()))?;

    if !stops.is_empty() {
        outcome.polyline = orient_by_stops(outcome.polyline, stops);
    }

    Ok((GeometryBlob::from_polyline(&outcome.polyline), outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetpath::gap::NoGapFiller;
    use serde_json::json;

    #[test]
    fn test_pieces_are_joined() {
        let value = json!([
            [[0.0, 0.002], [0.0, 0.001]],
            [[0.0, 0.0], [0.0, 0.001]]
        ]);

        let (blob, outcome) =
            stitch_value(&value, StitchConfig::default(), &[], &NoGapFiller).unwrap();

        assert_eq!(blob.point_count(), 3);
        assert_eq!(outcome.segments_used, 2);
        assert!(outcome.is_continuous());
    }

    #[test]
    fn test_stops_set_direction() {
        let value = json!([[0.0, 0.0], [0.0, 0.001], [0.0, 0.002]]);
        let stops = parse_stops("0.0,0.0019 | 0.0,0.0001").unwrap();

        let (blob, _) =
            stitch_value(&value, StitchConfig::default(), &stops, &NoGapFiller).unwrap();

        assert_eq!(
            serde_json::to_value(&blob).unwrap(),
            json!([[0.0, 0.002], [0.0, 0.001], [0.0, 0.0]])
        );
    }

    #[test]
    fn test_invalid_stops_rejected() {
        assert!(matches!(parse_stops("38.7,-9.1|north"), Err(CliError::Config(_))));
        assert!(matches!(parse_stops("91.0,0.0"), Err(CliError::Config(_))));
        assert!(parse_stops(" | ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_blob_rejected() {
        let result = stitch_value(
            &json!({"type": "LineString"}),
            StitchConfig::default(),
            &[],
            &NoGapFiller,
        );
        assert!(matches!(result, Err(CliError::Stitch(_))));
    }

    #[test]
    fn test_read_input_reports_missing_file() {
        let result = read_input(Path::new("/nonexistent/geometry.json"));
        assert!(matches!(result, Err(CliError::FileRead { .. })));
    }
}
