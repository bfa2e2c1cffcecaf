//! Engine assembly.
//!
//! [`EngineBuilder`] wires a snapshot repository, the external collaborators
//! and the domain stores together and registers every store with a
//! [`ServiceOrchestrator`]. Nothing is global; the caller owns the [`Engine`].

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::algorithms::fuel::{plan_fuel, FlightRules, FuelPlan, FuelPlanInput};
use crate::algorithms::route::RouteCalculator;
use crate::codecs::{CodecRegistry, MemoryDirectory, WaypointDirectory};
use crate::config::EngineConfig;
use crate::db::{RepositoryFactory, RepositoryResult, SnapshotRepository};
use crate::models::{AircraftId, RouteId, ServiceStatus};
use crate::providers::{
    BlankChartSource, ChartTileSource, FixedVariation, MagneticVariation, NoVariation,
    NotamProvider, StaticNotamProvider, StaticWeatherProvider, WeatherProvider,
};
use crate::services::{
    AircraftStore, ChartService, CleanupReport, NotamStore, OrchestratorError, PreferencesStore,
    RouteStore, ServiceError, ServiceOrchestrator, ServiceResult, WeatherStore,
};

pub const ROUTE_SERVICE: &str = "route";
pub const AIRCRAFT_SERVICE: &str = "aircraft";
pub const WEATHER_SERVICE: &str = "weather";
pub const NOTAM_SERVICE: &str = "notam";
pub const CHART_SERVICE: &str = "chart";
pub const PREFERENCES_SERVICE: &str = "preferences";

#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    repository: Option<Arc<dyn SnapshotRepository>>,
    weather: Option<Arc<dyn WeatherProvider>>,
    notams: Option<Arc<dyn NotamProvider>>,
    charts: Option<Arc<dyn ChartTileSource>>,
    variation: Option<Arc<dyn MagneticVariation>>,
    directory: Option<Arc<dyn WaypointDirectory>>,
    date: Option<NaiveDate>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this repository instead of the one described by `[persistence]`.
    pub fn with_repository(mut self, repository: Arc<dyn SnapshotRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_weather_provider(mut self, provider: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(provider);
        self
    }

    pub fn with_notam_provider(mut self, provider: Arc<dyn NotamProvider>) -> Self {
        self.notams = Some(provider);
        self
    }

    pub fn with_chart_source(mut self, source: Arc<dyn ChartTileSource>) -> Self {
        self.charts = Some(source);
        self
    }

    /// Overrides `planning.default_variation`.
    pub fn with_variation(mut self, variation: Arc<dyn MagneticVariation>) -> Self {
        self.variation = Some(variation);
        self
    }

    /// Directory used by the GFP codec to resolve named waypoints.
    pub fn with_waypoint_directory(mut self, directory: Arc<dyn WaypointDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Fix the date used for magnetic variation lookups.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Assemble the engine. Without an explicit repository one is created
    /// from the `[persistence]` settings, which may touch the filesystem.
    pub async fn build(self) -> RepositoryResult<Engine> {
        let repository = match self.repository {
            Some(repository) => repository,
            None => RepositoryFactory::from_settings(&self.config.persistence).await?,
        };

        let configured = self.config.planning.default_variation;
        let variation: Arc<dyn MagneticVariation> = match (self.variation, configured) {
            (Some(variation), _) => variation,
            (None, Some(degrees)) => Arc::new(FixedVariation(degrees)),
            (None, None) => Arc::new(NoVariation),
        };
        let mut calculator = RouteCalculator::new(variation);
        if let Some(date) = self.date {
            calculator = calculator.with_date(date);
        }

        let directory = self
            .directory
            .unwrap_or_else(|| Arc::new(MemoryDirectory::new()));
        let codecs = CodecRegistry::with_directory(directory);

        let cache = &self.config.cache;
        let routes = Arc::new(RouteStore::new(Arc::clone(&repository), calculator, codecs));
        let aircraft = Arc::new(AircraftStore::new(Arc::clone(&repository)));
        let weather = Arc::new(WeatherStore::new(
            Arc::clone(&repository),
            self.weather
                .unwrap_or_else(|| Arc::new(StaticWeatherProvider::new())),
            cache.weather_stale_after(),
        ));
        let notams = Arc::new(NotamStore::new(
            Arc::clone(&repository),
            self.notams
                .unwrap_or_else(|| Arc::new(StaticNotamProvider::new())),
            cache.notam_stale_after(),
        ));
        let charts = Arc::new(ChartService::new(
            self.charts.unwrap_or_else(|| Arc::new(BlankChartSource::new())),
            cache.chart_tile_capacity,
        ));
        let preferences = Arc::new(PreferencesStore::new(Arc::clone(&repository)));

        let orchestrator = ServiceOrchestrator::new();
        orchestrator.register(ROUTE_SERVICE, routes.clone());
        orchestrator.register(AIRCRAFT_SERVICE, aircraft.clone());
        orchestrator.register(WEATHER_SERVICE, weather.clone());
        orchestrator.register(NOTAM_SERVICE, notams.clone());
        orchestrator.register(CHART_SERVICE, charts.clone());
        orchestrator.register(PREFERENCES_SERVICE, preferences.clone());

        Ok(Engine {
            config: self.config,
            repository,
            routes,
            aircraft,
            weather,
            notams,
            charts,
            preferences,
            orchestrator,
        })
    }
}

/// The assembled domain engine.
pub struct Engine {
    config: EngineConfig,
    repository: Arc<dyn SnapshotRepository>,
    routes: Arc<RouteStore>,
    aircraft: Arc<AircraftStore>,
    weather: Arc<WeatherStore>,
    notams: Arc<NotamStore>,
    charts: Arc<ChartService>,
    preferences: Arc<PreferencesStore>,
    orchestrator: ServiceOrchestrator,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn SnapshotRepository> {
        &self.repository
    }

    pub fn routes(&self) -> &RouteStore {
        &self.routes
    }

    pub fn aircraft(&self) -> &AircraftStore {
        &self.aircraft
    }

    pub fn weather(&self) -> &WeatherStore {
        &self.weather
    }

    pub fn notams(&self) -> &NotamStore {
        &self.notams
    }

    pub fn charts(&self) -> &ChartService {
        &self.charts
    }

    pub fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    pub fn orchestrator(&self) -> &ServiceOrchestrator {
        &self.orchestrator
    }

    pub async fn initialize(&self) -> Result<(), OrchestratorError> {
        self.orchestrator.initialize().await
    }

    pub async fn cleanup(&self) -> CleanupReport {
        self.orchestrator.cleanup().await
    }

    pub fn health_status(&self) -> BTreeMap<String, ServiceStatus> {
        self.orchestrator.health_status()
    }

    pub fn is_healthy(&self) -> bool {
        self.orchestrator.is_healthy()
    }

    /// Fuel plan for a stored route flown by `aircraft`, or by the default
    /// profile when `aircraft` is `None`. The route needs a cruise speed and
    /// fuel burn rate.
    pub fn plan_route_fuel(
        &self,
        route: &RouteId,
        aircraft: Option<&AircraftId>,
        rules: FlightRules,
    ) -> ServiceResult<FuelPlan> {
        let route = self.routes.get(route)?;
        let profile = match aircraft {
            Some(id) => self.aircraft.get(id)?,
            None => self
                .aircraft
                .default_profile()?
                .ok_or_else(|| ServiceError::not_found("aircraft", "default"))?,
        };

        let trip_minutes = route
            .total_time
            .ok_or_else(|| ServiceError::validation("cruise_speed", "route has no cruise speed"))?;
        let fuel_burn = route
            .fuel_burn_rate
            .ok_or_else(|| ServiceError::validation("fuel_burn_rate", "route has no fuel burn rate"))?;
        let capacity = &profile.weight_balance.fuel_capacity;

        let input = FuelPlanInput {
            trip_minutes,
            fuel_burn,
            capacity: capacity.total,
            unusable: capacity.unusable,
            taxi_fuel: self.config.planning.taxi_fuel,
            alternate_minutes: None,
            additional_minutes: None,
            fuel_on_board: None,
        };
        Ok(plan_fuel(&input, rules, &self.config.planning.reserve_policy())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use crate::models::{Route, Waypoint};

    async fn engine() -> Engine {
        let engine = Engine::builder()
            .with_repository(Arc::new(LocalRepository::new()))
            .build()
            .await
            .unwrap();
        engine.initialize().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_registers_every_service() {
        let engine = engine().await;
        assert_eq!(
            engine.orchestrator().service_names(),
            vec!["route", "aircraft", "weather", "notam", "chart", "preferences"]
        );
        assert!(engine.is_healthy());
        assert!(engine.cleanup().await.is_clean());
        assert!(!engine.is_healthy());
    }

    #[tokio::test]
    async fn test_plan_route_fuel_with_default_aircraft() {
        let engine = engine().await;
        let route = engine
            .routes()
            .save(
                Route::new(
                    "Hop",
                    vec![
                        Waypoint::airport("KORD", 41.978, -87.904),
                        Waypoint::airport("KMDW", 41.786, -87.752),
                    ],
                )
                .with_cruise(110.0, 8.4),
            )
            .unwrap();
        let id = route.id.clone().unwrap();

        let plan = engine.plan_route_fuel(&id, None, FlightRules::Vfr).unwrap();
        assert!((plan.reserve_fuel - 4.2).abs() < 1e-9);
        assert!(plan.total_required > plan.trip_fuel);

        let unplanned = engine
            .routes()
            .save(Route::new("Bare", route.waypoints.clone()))
            .unwrap();
        let err = engine
            .plan_route_fuel(unplanned.id.as_ref().unwrap(), None, FlightRules::Vfr)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }
}
