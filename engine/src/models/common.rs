//! Value types shared by several domains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees (WGS-84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl LatLngBounds {
    pub fn contains(&self, point: LatLng) -> bool {
        let in_lat = point.lat <= self.north && point.lat >= self.south;
        let in_lng = if self.west <= self.east {
            point.lng >= self.west && point.lng <= self.east
        } else {
            // Box straddles the antimeridian
            point.lng >= self.west || point.lng <= self.east
        };
        in_lat && in_lng
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlightConditions {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];
}

/// Half-open time window; `end == None` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }
}

/// Self-reported status of a lifecycle-managed service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub healthy: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub error_count: u32,
    pub response_time_ms: Option<u64>,
    /// Degraded-but-non-fatal conditions, e.g. a failed persistence write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Captured when the status itself could not be obtained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            last_update: Some(Utc::now()),
            error_count: 0,
            response_time_ms: None,
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            last_update: Some(Utc::now()),
            error_count: 1,
            response_time_ms: None,
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }
}
