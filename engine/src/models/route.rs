//! Route, waypoint and leg entities.
//!
//! Leg geometry and route totals are derived data: they are produced by
//! [`crate::algorithms::route::RouteCalculator`] and must never be edited by
//! hand. The edit and patch types below describe intent; the route store
//! applies them and recomputes everything derived.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::LatLng;

crate::define_id_type!(RouteId);
crate::define_id_type!(WaypointId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointKind {
    Airport,
    Vor,
    Ndb,
    Fix,
    Gps,
    Custom,
}

impl WaypointKind {
    /// Named navigation database entries, as opposed to user coordinates.
    pub fn is_published(self) -> bool {
        !matches!(self, WaypointKind::Custom | WaypointKind::Gps)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WaypointKind::Airport => "airport",
            WaypointKind::Vor => "vor",
            WaypointKind::Ndb => "ndb",
            WaypointKind::Fix => "fix",
            WaypointKind::Gps => "gps",
            WaypointKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WaypointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "airport" => Ok(WaypointKind::Airport),
            "vor" => Ok(WaypointKind::Vor),
            "ndb" => Ok(WaypointKind::Ndb),
            "fix" | "int" | "intersection" => Ok(WaypointKind::Fix),
            "gps" => Ok(WaypointKind::Gps),
            "custom" | "user" => Ok(WaypointKind::Custom),
            other => Err(format!("Unknown waypoint type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: WaypointId,
    #[serde(rename = "type")]
    pub kind: WaypointKind,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub coordinates: LatLng,
    /// Feet MSL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Waypoint {
    pub fn new(identifier: impl Into<String>, kind: WaypointKind, coordinates: LatLng) -> Self {
        Self {
            id: WaypointId::generate(),
            kind,
            identifier: identifier.into(),
            name: None,
            coordinates,
            altitude: None,
            frequency: None,
            runway: None,
            notes: None,
        }
    }

    pub fn airport(identifier: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self::new(identifier, WaypointKind::Airport, LatLng::new(lat, lng))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_altitude(mut self, altitude_ft: f64) -> Self {
        self.altitude = Some(altitude_ft);
        self
    }
}

/// How the magnetic course of a leg was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Magnetic variation applied.
    Magnetic,
    /// Variation unavailable; magnetic course equals true course.
    Unconverted,
    /// Zero-length leg; no course exists.
    Undefined,
}

/// Planned wind, direction in degrees true the wind blows FROM, speed in knots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedWind {
    pub direction: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from: Waypoint,
    pub to: Waypoint,
    /// Great-circle distance, nautical miles.
    pub distance: f64,
    pub true_course: Option<f64>,
    pub magnetic_course: Option<f64>,
    pub course_status: CourseStatus,
    /// Variation used at the leg midpoint, east positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_variation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_correction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_speed: Option<f64>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_burn: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Option<RouteId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    /// Nautical miles
    #[serde(default)]
    pub total_distance: f64,
    /// Minutes; undefined without a cruise speed.
    #[serde(default)]
    pub total_time: Option<f64>,
    /// Undefined without both a cruise speed and a fuel burn rate.
    #[serde(default)]
    pub total_fuel: Option<f64>,
    /// Feet MSL
    #[serde(default)]
    pub cruise_altitude: Option<f64>,
    /// Knots true airspeed
    #[serde(default)]
    pub cruise_speed: Option<f64>,
    /// Fuel per hour, in the aircraft's fuel unit
    #[serde(default)]
    pub fuel_burn_rate: Option<f64>,
    #[serde(default)]
    pub wind: Option<PlannedWind>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Route {
    /// Unsaved route with no derived data yet.
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            waypoints,
            legs: Vec::new(),
            total_distance: 0.0,
            total_time: None,
            total_fuel: None,
            cruise_altitude: None,
            cruise_speed: None,
            fuel_burn_rate: None,
            wind: None,
            created: None,
            modified: None,
            created_by: None,
            is_active: false,
        }
    }

    pub fn with_cruise(mut self, speed_kts: f64, fuel_burn_per_hour: f64) -> Self {
        self.cruise_speed = Some(speed_kts);
        self.fuel_burn_rate = Some(fuel_burn_per_hour);
        self
    }

    pub fn with_wind(mut self, wind: PlannedWind) -> Self {
        self.wind = Some(wind);
        self
    }

    pub fn departure(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn destination(&self) -> Option<&Waypoint> {
        if self.waypoints.len() < 2 {
            return None;
        }
        self.waypoints.last()
    }

    pub fn waypoint_index(&self, id: &WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|w| &w.id == id)
    }
}

/// Partial update of a route's descriptive and cruise fields.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub cruise_altitude: Option<Option<f64>>,
    pub cruise_speed: Option<Option<f64>>,
    pub fuel_burn_rate: Option<Option<f64>>,
    pub wind: Option<Option<PlannedWind>>,
    pub created_by: Option<Option<String>>,
}

impl RoutePatch {
    /// Merge this patch over `route`; patch fields win. Derived data is left
    /// stale and must be recomputed by the caller.
    pub fn apply_to(&self, route: &Route) -> Route {
        let mut merged = route.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(altitude) = self.cruise_altitude {
            merged.cruise_altitude = altitude;
        }
        if let Some(speed) = self.cruise_speed {
            merged.cruise_speed = speed;
        }
        if let Some(burn) = self.fuel_burn_rate {
            merged.fuel_burn_rate = burn;
        }
        if let Some(wind) = self.wind {
            merged.wind = wind;
        }
        if let Some(created_by) = &self.created_by {
            merged.created_by = created_by.clone();
        }
        merged
    }
}

/// Partial update of a single waypoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointPatch {
    pub identifier: Option<String>,
    pub kind: Option<WaypointKind>,
    pub name: Option<Option<String>>,
    pub coordinates: Option<LatLng>,
    pub altitude: Option<Option<f64>>,
    pub frequency: Option<Option<String>>,
    pub runway: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl WaypointPatch {
    pub fn apply_to(&self, waypoint: &Waypoint) -> Waypoint {
        let mut merged = waypoint.clone();
        if let Some(identifier) = &self.identifier {
            merged.identifier = identifier.clone();
        }
        if let Some(kind) = self.kind {
            merged.kind = kind;
        }
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(coordinates) = self.coordinates {
            merged.coordinates = coordinates;
        }
        if let Some(altitude) = self.altitude {
            merged.altitude = altitude;
        }
        if let Some(frequency) = &self.frequency {
            merged.frequency = frequency.clone();
        }
        if let Some(runway) = &self.runway {
            merged.runway = runway.clone();
        }
        if let Some(notes) = &self.notes {
            merged.notes = notes.clone();
        }
        merged
    }
}

/// Explicit structural edits of a route's waypoint sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RouteEdit {
    /// Insert before `index`; `index == len` appends.
    Insert { index: usize, waypoint: Waypoint },
    Remove { waypoint_id: WaypointId },
    Move { waypoint_id: WaypointId, to_index: usize },
    UpdateWaypoint {
        waypoint_id: WaypointId,
        patch: WaypointPatch,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationLogEntry {
    pub leg_index: usize,
    pub from: String,
    /// Identifier of the waypoint reached at the end of the leg.
    pub waypoint: String,
    /// Magnetic when converted, true otherwise; `None` for zero-length legs.
    pub course: Option<f64>,
    pub course_status: CourseStatus,
    pub distance: f64,
    pub cumulative_distance: f64,
    pub ground_speed: f64,
    /// Minutes
    pub estimated_time: f64,
    pub cumulative_time: f64,
    pub fuel_burn: f64,
    pub fuel_remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationLogSummary {
    pub total_distance: f64,
    pub total_time: f64,
    pub total_fuel: f64,
    pub average_ground_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationLog {
    pub route_id: Option<RouteId>,
    pub starting_fuel: f64,
    pub entries: Vec<NavigationLogEntry>,
    pub summary: NavigationLogSummary,
    pub generated: DateTime<Utc>,
}
