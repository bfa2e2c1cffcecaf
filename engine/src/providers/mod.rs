//! Ports to external collaborators.
//!
//! The engine never fetches or parses weather, NOTAMs or chart imagery
//! itself; it talks to these traits. The [`memory`] module carries static
//! in-process implementations used by the demo binary and by tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{LatLng, Notam, WeatherReport};

pub mod memory;

pub use memory::{BlankChartSource, FixedVariation, NoVariation, StaticNotamProvider, StaticWeatherProvider};

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Collaborator could not be reached or refused the request.
    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("{provider} has no data for '{key}'")]
    NotFound { provider: String, key: String },
}

impl ProviderError {
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Source of current weather reports.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Reports for the given airports. Airports with no report are omitted.
    async fn fetch_current(&self, airports: &[String]) -> ProviderResult<Vec<WeatherReport>>;
}

/// Source of current NOTAMs.
#[async_trait]
pub trait NotamProvider: Send + Sync {
    async fn fetch_current(&self, airports: &[String]) -> ProviderResult<Vec<Notam>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Sectional,
    Terminal,
    IfrLow,
    IfrHigh,
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub chart: ChartKind,
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTile {
    pub key: TileKey,
    pub bytes: Vec<u8>,
    pub fetched: DateTime<Utc>,
}

#[async_trait]
pub trait ChartTileSource: Send + Sync {
    async fn load_tile(&self, key: TileKey) -> ProviderResult<ChartTile>;
}

/// Magnetic variation model. East variation is positive, so
/// magnetic = true - variation.
pub trait MagneticVariation: Send + Sync {
    /// `None` when the model has no value for this position or date.
    fn variation_at(&self, position: LatLng, date: NaiveDate) -> Option<f64>;
}
