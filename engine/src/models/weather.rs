//! Structured weather reports, as handed over by the weather collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::FlightConditions;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindData {
    /// Degrees true; `None` when variable
    pub direction: Option<f64>,
    /// Knots
    pub speed: f64,
    #[serde(default)]
    pub gust: Option<f64>,
    #[serde(default)]
    pub variable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudCover {
    Skc,
    Clr,
    Few,
    Sct,
    Bkn,
    Ovc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudLayer {
    pub cover: CloudCover,
    /// Feet AGL
    pub altitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Airport identifier, upper case.
    pub airport: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_metar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_taf: Option<String>,
    pub conditions: FlightConditions,
    #[serde(default)]
    pub wind: Option<WindData>,
    /// Statute miles
    #[serde(default)]
    pub visibility: Option<f64>,
    /// Feet AGL of the lowest broken or overcast layer
    #[serde(default)]
    pub ceiling: Option<f64>,
    #[serde(default)]
    pub clouds: Vec<CloudLayer>,
    /// Celsius
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub dewpoint: Option<f64>,
    /// Altimeter setting, inches of mercury
    #[serde(default)]
    pub altimeter: Option<f64>,
    /// Feet; filled in by the engine when field elevation is known.
    #[serde(default)]
    pub density_altitude: Option<f64>,
    /// When the engine last fetched this report.
    pub last_update: DateTime<Utc>,
}

impl WeatherReport {
    pub fn new(airport: impl Into<String>, conditions: FlightConditions) -> Self {
        let now = Utc::now();
        Self {
            airport: airport.into().to_uppercase(),
            timestamp: now,
            raw_metar: None,
            raw_taf: None,
            conditions,
            wind: None,
            visibility: None,
            ceiling: None,
            clouds: Vec::new(),
            temperature: None,
            dewpoint: None,
            altimeter: None,
            density_altitude: None,
            last_update: now,
        }
    }
}
