//! Domain model: entities, value objects and their patch types.
//!
//! - [`common`]: coordinates, time windows, service status
//! - [`route`]: waypoints, legs, routes, navigation logs
//! - [`aircraft`]: aircraft profiles, weight and balance, performance tables
//! - [`weather`] / [`notam`]: externally sourced reports
//! - [`preferences`]: user unit preferences

pub mod aircraft;
pub mod common;
pub mod macros;
pub mod notam;
pub mod preferences;
pub mod route;
pub mod weather;

pub use aircraft::{
    AircraftCategory, AircraftId, AircraftPatch, AircraftProfile, CgEnvelope, CgPoint, CgStatus,
    ClimbPerformance, CruisePerformance, EquipmentData, FieldPerformance, FuelCapacity,
    FuelQuantity, LoadingData, PerformanceData, RangePerformance, StationId, StationKind,
    StationLoad, WeightBalanceData, WeightStation,
};
pub use common::{FlightConditions, LatLng, LatLngBounds, Priority, ServiceStatus, TimeRange};
pub use notam::{AirportNotams, Notam, NotamId, NotamSummary, NotamType};
pub use preferences::{merge_preferences, PreferencesPatch, UserPreferences};
pub use route::{
    CourseStatus, NavigationLog, NavigationLogEntry, NavigationLogSummary, PlannedWind, Route,
    RouteEdit, RouteId, RouteLeg, RoutePatch, Waypoint, WaypointId, WaypointKind, WaypointPatch,
};
pub use weather::{WeatherReport, WindData};
