//! User unit and behaviour preferences.

use serde::{Deserialize, Serialize};

use crate::units::{AltitudeUnit, DistanceUnit, FuelUnit, SpeedUnit, WeightUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPreferences {
    pub distance: DistanceUnit,
    pub speed: SpeedUnit,
    pub altitude: AltitudeUnit,
    pub weight: WeightUnit,
    pub fuel: FuelUnit,
}

impl Default for UnitPreferences {
    fn default() -> Self {
        Self {
            distance: DistanceUnit::Nm,
            speed: SpeedUnit::Kts,
            altitude: AltitudeUnit::Ft,
            weight: WeightUnit::Lbs,
            fuel: FuelUnit::Gal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub units: UnitPreferences,
    pub auto_save: bool,
    pub notifications: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            units: UnitPreferences::default(),
            auto_save: true,
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPreferencesPatch {
    pub distance: Option<DistanceUnit>,
    pub speed: Option<SpeedUnit>,
    pub altitude: Option<AltitudeUnit>,
    pub weight: Option<WeightUnit>,
    pub fuel: Option<FuelUnit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub units: UnitPreferencesPatch,
    pub auto_save: Option<bool>,
    pub notifications: Option<bool>,
}

/// Merge `patch` over `current`; patch fields win.
pub fn merge_preferences(current: &UserPreferences, patch: &PreferencesPatch) -> UserPreferences {
    let units = UnitPreferences {
        distance: patch.units.distance.unwrap_or(current.units.distance),
        speed: patch.units.speed.unwrap_or(current.units.speed),
        altitude: patch.units.altitude.unwrap_or(current.units.altitude),
        weight: patch.units.weight.unwrap_or(current.units.weight),
        fuel: patch.units.fuel.unwrap_or(current.units.fuel),
    };
    UserPreferences {
        units,
        auto_save: patch.auto_save.unwrap_or(current.auto_save),
        notifications: patch.notifications.unwrap_or(current.notifications),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_patch_wins() {
        let current = UserPreferences::default();
        let patch = PreferencesPatch {
            units: UnitPreferencesPatch {
                distance: Some(DistanceUnit::Km),
                ..Default::default()
            },
            notifications: Some(false),
            ..Default::default()
        };

        let merged = merge_preferences(&current, &patch);
        assert_eq!(merged.units.distance, DistanceUnit::Km);
        assert_eq!(merged.units.speed, SpeedUnit::Kts);
        assert!(!merged.notifications);
        assert!(merged.auto_save);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let current = UserPreferences::default();
        assert_eq!(merge_preferences(&current, &PreferencesPatch::default()), current);
    }
}
