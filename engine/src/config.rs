//! Engine configuration file support.
//!
//! Reads `flightplan.toml`:
//!
//! ```toml
//! [persistence]
//! type = "file"
//! directory = "flightplan-data"
//!
//! [planning]
//! vfr_day_reserve_minutes = 30
//! taxi_fuel = 1.1
//! default_variation = -3.5
//!
//! [cache]
//! weather_stale_minutes = 30
//! chart_tile_capacity = 256
//! ```
//!
//! Every section and key is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::algorithms::fuel::ReservePolicy;
use crate::db::{PersistenceSettings, RepositoryError};
use crate::services::DEFAULT_TILE_CAPACITY;

/// Environment variable overriding `planning.default_variation`.
pub const MAG_VAR_ENV: &str = "FLIGHTPLAN_MAG_VAR";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("No flightplan.toml found in standard locations")]
    NotFound,

    #[error("Invalid {field}: {message}")]
    Invalid { field: String, message: String },

    /// `[persistence]` section rejected.
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub planning: PlanningSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningSettings {
    pub vfr_day_reserve_minutes: f64,
    pub vfr_night_reserve_minutes: f64,
    pub ifr_reserve_minutes: f64,
    /// Fuel used before takeoff, in gallons
    pub taxi_fuel: f64,
    /// Degrees, east positive. Unset means courses stay unconverted.
    pub default_variation: Option<f64>,
}

impl Default for PlanningSettings {
    fn default() -> Self {
        let reserve = ReservePolicy::default();
        Self {
            vfr_day_reserve_minutes: reserve.vfr_day_minutes,
            vfr_night_reserve_minutes: reserve.vfr_night_minutes,
            ifr_reserve_minutes: reserve.ifr_minutes,
            taxi_fuel: 1.1,
            default_variation: None,
        }
    }
}

impl PlanningSettings {
    pub fn reserve_policy(&self) -> ReservePolicy {
        ReservePolicy {
            vfr_day_minutes: self.vfr_day_reserve_minutes,
            vfr_night_minutes: self.vfr_night_reserve_minutes,
            ifr_minutes: self.ifr_reserve_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub weather_stale_minutes: i64,
    pub notam_stale_minutes: i64,
    pub chart_tile_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            weather_stale_minutes: 30,
            notam_stale_minutes: 60,
            chart_tile_capacity: DEFAULT_TILE_CAPACITY,
        }
    }
}

impl CacheSettings {
    pub fn weather_stale_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.weather_stale_minutes)
    }

    pub fn notam_stale_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.notam_stale_minutes)
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Searches for `flightplan.toml` in:
    /// 1. Current directory
    /// 2. `engine/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("flightplan.toml"),
            PathBuf::from("engine/flightplan.toml"),
            PathBuf::from("../flightplan.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading configuration from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(ConfigError::NotFound)
    }

    /// The file from the standard locations when present, else defaults,
    /// with environment overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::from_default_location() {
            Ok(config) => config,
            Err(ConfigError::NotFound) => {
                log::debug!("No configuration file found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `FLIGHTPLAN_MAG_VAR` through `lookup`. Repository overrides are
    /// applied by [`RepositoryFactory::from_settings`](crate::db::RepositoryFactory::from_settings).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(MAG_VAR_ENV) {
            let value: f64 = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(MAG_VAR_ENV, format!("not a number: {}", raw))
            })?;
            self.planning.default_variation = Some(value);
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.persistence.repository_type()?;
        if let Some(variation) = self.planning.default_variation {
            if !(variation.is_finite() && variation.abs() <= 180.0) {
                return Err(ConfigError::invalid(
                    "default_variation",
                    format!("must lie in [-180, 180], got {}", variation),
                ));
            }
        }
        let planning = &self.planning;
        for (name, value) in [
            ("vfr_day_reserve_minutes", planning.vfr_day_reserve_minutes),
            ("vfr_night_reserve_minutes", planning.vfr_night_reserve_minutes),
            ("ifr_reserve_minutes", planning.ifr_reserve_minutes),
            ("taxi_fuel", planning.taxi_fuel),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(name, "must be a non-negative number"));
            }
        }
        for (name, value) in [
            ("weather_stale_minutes", self.cache.weather_stale_minutes),
            ("notam_stale_minutes", self.cache.notam_stale_minutes),
        ] {
            if value < 0 {
                return Err(ConfigError::invalid(name, "must not be negative"));
            }
        }
        Ok(())
    }
}
