//! Service configuration types.

use std::time::Duration;

use crate::cache::{CacheError, FallbackLoops};
use crate::config::{resolve_workers, ConfigFile};
use crate::coord::Coordinate;
use crate::geometry::StitchConfig;
use crate::import::ImportConfig;
use crate::retry::RetryPolicy;
use crate::scheduler::SchedulerConfig;
use crate::simulation::SpeedModel;

/// Where and how to reach an HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub timeout: Duration,
}

/// Runtime configuration for [`super::FleetService`].
///
/// Built from the user's [`ConfigFile`]; every duration and count is already
/// resolved (for example `workers = 0` becomes the CPU count).
///
/// # Example
///
/// ```
/// use fleetpath::config::ConfigFile;
/// use fleetpath::service::ServiceConfig;
///
/// let mut file = ConfigFile::default();
/// file.simulation.workers = 2;
/// file.routing.enabled = false;
///
/// let config = ServiceConfig::from_config_file(&file);
/// assert_eq!(config.scheduler().workers, 2);
/// assert!(config.routing().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    scheduler: SchedulerConfig,
    import: ImportConfig,
    speed: SpeedModel,
    mapdata: Endpoint,
    /// None when gap filling is disabled
    routing: Option<Endpoint>,
    fallback_anchors: Vec<Coordinate>,
    fallback_radius_deg: f64,
}

impl ServiceConfig {
    /// Resolve a loaded config file into service settings.
    pub fn from_config_file(file: &ConfigFile) -> Self {
        let sim = &file.simulation;
        let mapdata = &file.mapdata;

        let scheduler = SchedulerConfig {
            tick_interval: Duration::from_millis(sim.tick_interval_ms),
            tick_timeout: Duration::from_millis(sim.tick_timeout_ms),
            workers: resolve_workers(sim.workers),
        };

        let import = ImportConfig {
            service_area: mapdata.service_area,
            retry: RetryPolicy {
                max_attempts: mapdata.max_attempts.max(1),
                base_delay: Duration::from_millis(mapdata.retry_base_delay_ms),
                max_delay: Duration::from_millis(mapdata.retry_max_delay_ms),
            },
            concurrency: mapdata.import_concurrency.max(1),
            stitch: StitchConfig {
                connect_threshold: file.geometry.connect_threshold_deg,
                dedup_epsilon: file.geometry.dedup_epsilon_deg,
            },
        };

        let routing = file.routing.enabled.then(|| Endpoint {
            url: file.routing.url.clone(),
            timeout: Duration::from_secs(file.routing.timeout_secs),
        });

        Self {
            scheduler,
            import,
            speed: SpeedModel::new(sim.base_speed_kmh, sim.speed_jitter_kmh),
            mapdata: Endpoint {
                url: mapdata.url.clone(),
                timeout: Duration::from_secs(mapdata.timeout_secs),
            },
            routing,
            fallback_anchors: file.fallback.anchors.clone(),
            fallback_radius_deg: file.fallback.radius_deg,
        }
    }

    pub fn scheduler(&self) -> &SchedulerConfig {
        &self.scheduler
    }

    pub fn import(&self) -> &ImportConfig {
        &self.import
    }

    pub fn speed(&self) -> SpeedModel {
        self.speed
    }

    pub fn mapdata(&self) -> &Endpoint {
        &self.mapdata
    }

    /// Routing endpoint, if gap filling is enabled.
    pub fn routing(&self) -> Option<&Endpoint> {
        self.routing.as_ref()
    }

    /// Replace the scheduler settings (tests and CLI overrides).
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Disable gap filling regardless of the config file.
    pub fn without_routing(mut self) -> Self {
        self.routing = None;
        self
    }

    /// Build the fallback loops from the configured anchors.
    pub fn fallback_loops(&self) -> Result<FallbackLoops, CacheError> {
        FallbackLoops::from_anchors(&self.fallback_anchors, self.fallback_radius_deg)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::num_cpus;

    #[test]
    fn test_from_default_config_file() {
        let config = ServiceConfig::default();

        assert_eq!(config.scheduler().tick_interval, Duration::from_secs(1));
        assert_eq!(config.scheduler().tick_timeout, Duration::from_secs(5));
        assert_eq!(config.scheduler().workers, num_cpus());
        assert_eq!(config.import().retry.max_attempts, 4);
        assert_eq!(config.import().retry.base_delay, Duration::from_millis(500));
        assert!(config.routing().is_some());
        assert_eq!(config.mapdata().timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_routing_disabled() {
        let mut file = ConfigFile::default();
        file.routing.enabled = false;
        assert!(ServiceConfig::from_config_file(&file).routing().is_none());

        let config = ServiceConfig::default().without_routing();
        assert!(config.routing().is_none());
    }

    #[test]
    fn test_stitch_settings_flow_through() {
        let mut file = ConfigFile::default();
        file.geometry.connect_threshold_deg = 0.0005;
        let config = ServiceConfig::from_config_file(&file);
        assert_eq!(config.import().stitch.connect_threshold, 0.0005);
    }

    #[test]
    fn test_fallback_loops_from_anchors() {
        let loops = ServiceConfig::default().fallback_loops().unwrap();
        assert_eq!(loops.len(), ConfigFile::default().fallback.anchors.len());

        let mut file = ConfigFile::default();
        file.fallback.anchors.clear();
        assert!(ServiceConfig::from_config_file(&file)
            .fallback_loops()
            .is_err());
    }
}
