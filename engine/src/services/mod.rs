//! Lifecycle-managed domain services.
//!
//! Each store owns an in-memory collection mirrored to a
//! [`SnapshotRepository`](crate::db::SnapshotRepository) and implements
//! [`Service`] so the [`ServiceOrchestrator`] can drive its startup and
//! shutdown.

pub mod aircraft_store;
pub mod chart_service;
pub mod defaults;
pub mod entity_store;
pub mod notam_store;
pub mod orchestrator;
pub mod preferences_store;
pub mod route_store;
pub mod service;
pub mod weather_store;

pub use aircraft_store::{AircraftStore, AIRCRAFT_KEY};
pub use chart_service::{ChartService, DEFAULT_TILE_CAPACITY};
pub use entity_store::{copy_of, CatalogEntity, EntityStore, StoredEntity};
pub use notam_store::{NotamStore, NOTAMS_KEY};
pub use orchestrator::{
    CleanupReport, OrchestratorError, OrchestratorState, ServiceOrchestrator, ServiceState,
};
pub use preferences_store::{PreferencesStore, PREFERENCES_KEY};
pub use route_store::{RouteStore, ROUTES_KEY};
pub use service::{Lifecycle, Service, ServiceError, ServiceResult, StoreWarning};
pub use weather_store::{WeatherStore, WEATHER_KEY};
