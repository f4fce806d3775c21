//! Fleet service facade implementation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::config::{Endpoint, ServiceConfig};
use super::error::ServiceError;
use crate::cache::RouteGeometryCache;
use crate::coord::Coordinate;
use crate::fleet::FleetRepository;
use crate::gap::{GapFill, GapFiller, NoGapFiller, OsrmClient, RoutingGapFiller};
use crate::import::{ImportReport, RouteImporter};
use crate::mapdata::{MapDataClient, OverpassClient, SegmentStore};
use crate::scheduler::SimulationScheduler;
use crate::simulation::{PositionSimulator, ProgressStore};
use crate::transport::PositionPublisher;

/// Gap filler chosen from configuration.
pub enum ServiceGapFiller {
    Routing(RoutingGapFiller<OsrmClient>),
    Disabled(NoGapFiller),
}

impl ServiceGapFiller {
    /// OSRM-backed filler for `endpoint`, or no filling when it is `None`.
    pub fn from_endpoint(endpoint: Option<&Endpoint>) -> Result<Self, ServiceError> {
        match endpoint {
            Some(endpoint) => {
                let client = OsrmClient::new(endpoint.url.clone(), endpoint.timeout)
                    .map_err(ServiceError::RoutingClientError)?;
                Ok(Self::Routing(RoutingGapFiller::new(client)))
            }
            None => Ok(Self::Disabled(NoGapFiller)),
        }
    }
}

impl GapFiller for ServiceGapFiller {
    fn fill(&self, from: Coordinate, to: Coordinate) -> GapFill {
        match self {
            Self::Routing(filler) => filler.fill(from, to),
            Self::Disabled(filler) => filler.fill(from, to),
        }
    }
}

/// High-level facade wiring import, cache, simulator and scheduler.
///
/// One service owns one geometry cache and one progress store. Import fills
/// the cache; the scheduler reads it on every tick.
///
/// # Example
///
/// ```ignore
/// use fleetpath::fleet::JsonFleetFile;
/// use fleetpath::service::{FleetService, ServiceConfig};
/// use fleetpath::transport::JsonLinesPublisher;
///
/// let service = FleetService::new(
///     ServiceConfig::default(),
///     Arc::new(JsonFleetFile::new("fleet.json")),
///     Arc::new(JsonLinesPublisher::stdout()),
/// )?;
/// service.import().await?;
/// service.run(shutdown).await;
/// ```
pub struct FleetService<F, P, M = OverpassClient, G = ServiceGapFiller> {
    config: ServiceConfig,
    fleet: Arc<F>,
    publisher: Arc<P>,
    cache: Arc<RouteGeometryCache>,
    simulator: Arc<PositionSimulator>,
    importer: RouteImporter<M, G>,
}

impl<F, P> FleetService<F, P>
where
    F: FleetRepository,
    P: PositionPublisher,
{
    /// Create a service talking to the configured Overpass and OSRM endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the fallback
    /// anchors are invalid.
    pub fn new(config: ServiceConfig, fleet: Arc<F>, publisher: Arc<P>) -> Result<Self, ServiceError> {
        let map_data = OverpassClient::new(config.mapdata().url.clone(), config.mapdata().timeout)
            .map_err(ServiceError::MapDataClientError)?
            .with_stop_area(config.import().service_area);

        let gap_filler = ServiceGapFiller::from_endpoint(config.routing())?;

        Self::with_collaborators(
            config,
            fleet,
            publisher,
            Arc::new(map_data),
            Arc::new(gap_filler),
        )
    }
}

impl<F, P, M, G> FleetService<F, P, M, G>
where
    F: FleetRepository,
    P: PositionPublisher,
    M: MapDataClient + 'static,
    G: GapFiller + 'static,
{
    /// Create a service with explicit map-data and gap-filling collaborators.
    pub fn with_collaborators(
        config: ServiceConfig,
        fleet: Arc<F>,
        publisher: Arc<P>,
        map_data: Arc<M>,
        gap_filler: Arc<G>,
    ) -> Result<Self, ServiceError> {
        let fallback = Arc::new(config.fallback_loops()?);
        let cache = Arc::new(RouteGeometryCache::new());
        let progress = Arc::new(ProgressStore::new());
        let simulator = Arc::new(
            PositionSimulator::new(Arc::clone(&cache), progress, fallback)
                .with_speed_model(config.speed()),
        );
        let importer = RouteImporter::new(
            map_data,
            gap_filler,
            Arc::new(SegmentStore::new()),
            config.import().clone(),
        );

        info!(
            workers = config.scheduler().workers,
            tick_interval_ms = config.scheduler().tick_interval.as_millis() as u64,
            routing = config.routing().is_some(),
            mapdata_url = %config.mapdata().url,
            "Fleet service created"
        );

        Ok(Self {
            config,
            fleet,
            publisher,
            cache,
            simulator,
            importer,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<RouteGeometryCache> {
        &self.cache
    }

    pub fn simulator(&self) -> &Arc<PositionSimulator> {
        &self.simulator
    }

    /// Bulk import of every route into the geometry cache.
    pub async fn import(&self) -> Result<ImportReport, ServiceError> {
        let report = self
            .importer
            .import_all(Arc::clone(&self.fleet), &self.cache)
            .await?;
        info!(%report, "Route import finished");
        Ok(report)
    }

    /// A scheduler sharing this service's simulator and collaborators.
    pub fn scheduler(&self) -> SimulationScheduler<F, P> {
        SimulationScheduler::new(
            Arc::clone(&self.fleet),
            Arc::clone(&self.simulator),
            Arc::clone(&self.publisher),
        )
        .with_config(self.config.scheduler().clone())
    }

    /// Run the scheduler until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        self.scheduler().run(shutdown).await;
    }
}
