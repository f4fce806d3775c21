//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::{parse_bbox, parse_lat_lon, Coordinate};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [simulation] section
    if let Some(section) = ini.section(Some("simulation")) {
        let s = &mut config.simulation;
        if let Some(v) = positive::<u64>(section, "simulation", "tick_interval_ms")? {
            s.tick_interval_ms = v;
        }
        if let Some(v) = positive::<u64>(section, "simulation", "tick_timeout_ms")? {
            s.tick_timeout_ms = v;
        }
        if let Some(v) = section.get("workers") {
            s.workers = v.trim().parse().map_err(|_| {
                invalid("simulation", "workers", v, "must be 0 (auto) or a positive integer")
            })?;
        }
        if let Some(v) = non_negative(section, "simulation", "base_speed_kmh")? {
            s.base_speed_kmh = v;
        }
        if let Some(v) = non_negative(section, "simulation", "speed_jitter_kmh")? {
            s.speed_jitter_kmh = v;
        }
    }

    // [geometry] section
    if let Some(section) = ini.section(Some("geometry")) {
        if let Some(v) = non_negative(section, "geometry", "connect_threshold_deg")? {
            config.geometry.connect_threshold_deg = v;
        }
        if let Some(v) = positive::<f64>(section, "geometry", "dedup_epsilon_deg")? {
            config.geometry.dedup_epsilon_deg = v;
        }
    }

    // [routing] section
    if let Some(section) = ini.section(Some("routing")) {
        if let Some(v) = section.get("enabled") {
            config.routing.enabled = parse_bool(v)
                .ok_or_else(|| invalid("routing", "enabled", v, "must be 'true' or 'false'"))?;
        }
        if let Some(v) = url(section, "routing", "url")? {
            config.routing.url = v;
        }
        if let Some(v) = positive::<u64>(section, "routing", "timeout_secs")? {
            config.routing.timeout_secs = v;
        }
    }

    // [mapdata] section
    if let Some(section) = ini.section(Some("mapdata")) {
        let m = &mut config.mapdata;
        if let Some(v) = url(section, "mapdata", "url")? {
            m.url = v;
        }
        if let Some(v) = positive::<u64>(section, "mapdata", "timeout_secs")? {
            m.timeout_secs = v;
        }
        if let Some(v) = positive::<u32>(section, "mapdata", "max_attempts")? {
            m.max_attempts = v;
        }
        if let Some(v) = positive::<u64>(section, "mapdata", "retry_base_delay_ms")? {
            m.retry_base_delay_ms = v;
        }
        if let Some(v) = positive::<u64>(section, "mapdata", "retry_max_delay_ms")? {
            m.retry_max_delay_ms = v;
        }
        if let Some(v) = positive::<usize>(section, "mapdata", "import_concurrency")? {
            m.import_concurrency = v;
        }
        if let Some(v) = section.get("service_area") {
            m.service_area = parse_bbox(v).map_err(|e| {
                invalid(
                    "mapdata",
                    "service_area",
                    v,
                    &format!("expected 'south,west,north,east' ({})", e),
                )
            })?;
        }
    }

    // [fallback] section
    if let Some(section) = ini.section(Some("fallback")) {
        if let Some(v) = section.get("anchors") {
            let anchors = parse_anchors(v).map_err(|reason| {
                invalid("fallback", "anchors", v, &reason)
            })?;
            config.fallback.anchors = anchors;
        }
        if let Some(v) = positive::<f64>(section, "fallback", "radius_deg")? {
            config.fallback.radius_deg = v;
        }
    }

    // [fleet] section
    if let Some(section) = ini.section(Some("fleet")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            config.fleet.file = (!v.is_empty()).then(|| expand_tilde(v));
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    if config.mapdata.retry_base_delay_ms > config.mapdata.retry_max_delay_ms {
        return Err(invalid(
            "mapdata",
            "retry_base_delay_ms",
            &config.mapdata.retry_base_delay_ms.to_string(),
            "must not exceed retry_max_delay_ms",
        ));
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Reads a numeric key that must be strictly greater than zero.
fn positive<T>(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(Some(parsed)),
        _ => Err(invalid(name, key, v, "must be a positive number")),
    }
}

fn non_negative(
    section: &Properties,
    name: &str,
    key: &str,
) -> Result<Option<f64>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    match v.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => Ok(Some(parsed)),
        _ => Err(invalid(name, key, v, "must be a non-negative number")),
    }
}

fn url(section: &Properties, name: &str, key: &str) -> Result<Option<String>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    let v = v.trim();
    if v.starts_with("http://") || v.starts_with("https://") {
        Ok(Some(v.trim_end_matches('/').to_string()))
    } else {
        Err(invalid(name, key, v, "must start with http:// or https://"))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Parses `"lat,lon | lat,lon | ..."` into a non-empty anchor list.
pub(super) fn parse_anchors(value: &str) -> Result<Vec<Coordinate>, String> {
    let anchors = value
        .split('|')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_lat_lon(part).map_err(|e| format!("'{}': {}", part, e)))
        .collect::<Result<Vec<_>, _>>()?;
    if anchors.is_empty() {
        return Err("at least one 'lat,lon' anchor is required".to_string());
    }
    Ok(anchors)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
