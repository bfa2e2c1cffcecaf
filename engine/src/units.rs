//! Unit systems and conversions.
//!
//! Dimensioned conversions go through `qtty` quantities so that the factors
//! live in one place. Fuel is the odd one out: volume and weight are linked by
//! the density of the fuel grade, which `qtty` has no notion of, so the
//! density table lives here.

use qtty::{Foot, Kilogram, Kilometer, Meter, Mile, NauticalMile, Pound};
use serde::{Deserialize, Serialize};

/// Litres in one US gallon.
pub const LITERS_PER_GALLON: f64 = 3.785_411_784;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    /// Nautical miles
    Nm,
    /// Statute miles
    Sm,
    Km,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    Kts,
    Mph,
    Kmh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeUnit {
    Ft,
    M,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Lbs,
    Kg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelUnit {
    Gal,
    Lbs,
    Kg,
    L,
}

impl FuelUnit {
    pub fn is_volume(self) -> bool {
        matches!(self, FuelUnit::Gal | FuelUnit::L)
    }
}

/// Fuel grade, used to relate fuel volume to fuel weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FuelGrade {
    #[default]
    Avgas100ll,
    JetA,
    Mogas,
}

impl FuelGrade {
    /// Nominal density in pounds per US gallon at standard temperature.
    pub fn pounds_per_gallon(self) -> f64 {
        match self {
            FuelGrade::Avgas100ll => 6.0,
            FuelGrade::JetA => 6.7,
            FuelGrade::Mogas => 6.0,
        }
    }
}

fn to_nautical_miles(value: f64, unit: DistanceUnit) -> qtty::NauticalMiles {
    match unit {
        DistanceUnit::Nm => qtty::NauticalMiles::new(value),
        DistanceUnit::Sm => qtty::Miles::new(value).to::<NauticalMile>(),
        DistanceUnit::Km => qtty::Kilometers::new(value).to::<NauticalMile>(),
    }
}

fn from_nautical_miles(distance: qtty::NauticalMiles, unit: DistanceUnit) -> f64 {
    match unit {
        DistanceUnit::Nm => distance.value(),
        DistanceUnit::Sm => distance.to::<Mile>().value(),
        DistanceUnit::Km => distance.to::<Kilometer>().value(),
    }
}

/// Convert a distance between unit systems.
pub fn convert_distance(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
    if from == to {
        return value;
    }
    from_nautical_miles(to_nautical_miles(value, from), to)
}

fn speed_distance_unit(unit: SpeedUnit) -> DistanceUnit {
    match unit {
        SpeedUnit::Kts => DistanceUnit::Nm,
        SpeedUnit::Mph => DistanceUnit::Sm,
        SpeedUnit::Kmh => DistanceUnit::Km,
    }
}

/// Convert a speed between unit systems.
///
/// All supported speeds are "distance per hour", so the conversion is the
/// distance conversion of the distance covered in one hour.
pub fn convert_speed(value: f64, from: SpeedUnit, to: SpeedUnit) -> f64 {
    convert_distance(value, speed_distance_unit(from), speed_distance_unit(to))
}

/// Convert an altitude (or any vertical distance) between feet and metres.
pub fn convert_altitude(value: f64, from: AltitudeUnit, to: AltitudeUnit) -> f64 {
    match (from, to) {
        (AltitudeUnit::Ft, AltitudeUnit::M) => qtty::Feet::new(value).to::<Meter>().value(),
        (AltitudeUnit::M, AltitudeUnit::Ft) => qtty::Meters::new(value).to::<Foot>().value(),
        _ => value,
    }
}

/// Convert a weight between pounds and kilograms.
pub fn convert_weight(value: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    match (from, to) {
        (WeightUnit::Lbs, WeightUnit::Kg) => qtty::Pounds::new(value).to::<Kilogram>().value(),
        (WeightUnit::Kg, WeightUnit::Lbs) => qtty::Kilograms::new(value).to::<Pound>().value(),
        _ => value,
    }
}

fn fuel_to_gallons(value: f64, unit: FuelUnit, grade: FuelGrade) -> f64 {
    match unit {
        FuelUnit::Gal => value,
        FuelUnit::L => value / LITERS_PER_GALLON,
        FuelUnit::Lbs => value / grade.pounds_per_gallon(),
        FuelUnit::Kg => convert_weight(value, WeightUnit::Kg, WeightUnit::Lbs) / grade.pounds_per_gallon(),
    }
}

fn gallons_to_fuel(gallons: f64, unit: FuelUnit, grade: FuelGrade) -> f64 {
    match unit {
        FuelUnit::Gal => gallons,
        FuelUnit::L => gallons * LITERS_PER_GALLON,
        FuelUnit::Lbs => gallons * grade.pounds_per_gallon(),
        FuelUnit::Kg => {
            convert_weight(gallons * grade.pounds_per_gallon(), WeightUnit::Lbs, WeightUnit::Kg)
        }
    }
}

/// Convert a fuel quantity, crossing between volume and weight through the
/// density of `grade` when needed.
pub fn convert_fuel(value: f64, from: FuelUnit, to: FuelUnit, grade: FuelGrade) -> f64 {
    if from == to {
        return value;
    }
    gallons_to_fuel(fuel_to_gallons(value, from, grade), to, grade)
}

/// Weight in pounds of a fuel quantity.
pub fn fuel_weight_lbs(quantity: f64, unit: FuelUnit, grade: FuelGrade) -> f64 {
    convert_fuel(quantity, unit, FuelUnit::Lbs, grade)
}

/// Hours to minutes.
pub fn hours_to_minutes(hours: f64) -> f64 {
    qtty::Hours::new(hours).to::<qtty::Minute>().value()
}

/// Minutes to hours.
pub fn minutes_to_hours(minutes: f64) -> f64 {
    qtty::Minutes::new(minutes).to::<qtty::Hour>().value()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_distance_conversions() {
        assert!(close(convert_distance(1.0, DistanceUnit::Nm, DistanceUnit::Km), 1.852, 1e-9));
        assert!(close(convert_distance(1.0, DistanceUnit::Sm, DistanceUnit::Nm), 0.868976, 1e-5));
        assert_eq!(convert_distance(42.0, DistanceUnit::Km, DistanceUnit::Km), 42.0);
    }

    #[test]
    fn test_speed_conversions() {
        assert!(close(convert_speed(100.0, SpeedUnit::Kts, SpeedUnit::Kmh), 185.2, 1e-6));
        assert!(close(convert_speed(100.0, SpeedUnit::Mph, SpeedUnit::Kts), 86.8976, 1e-3));
    }

    #[test]
    fn test_altitude_and_weight_conversions() {
        assert!(close(convert_altitude(1000.0, AltitudeUnit::Ft, AltitudeUnit::M), 304.8, 1e-9));
        assert!(close(convert_altitude(304.8, AltitudeUnit::M, AltitudeUnit::Ft), 1000.0, 1e-9));
        assert!(close(convert_weight(2550.0, WeightUnit::Lbs, WeightUnit::Kg), 1156.66, 1e-2));
        assert!(close(convert_weight(1.0, WeightUnit::Kg, WeightUnit::Lbs), 2.20462, 1e-5));
    }

    #[test]
    fn test_fuel_conversions_use_grade_density() {
        let avgas = convert_fuel(10.0, FuelUnit::Gal, FuelUnit::Lbs, FuelGrade::Avgas100ll);
        let jet = convert_fuel(10.0, FuelUnit::Gal, FuelUnit::Lbs, FuelGrade::JetA);
        assert!(close(avgas, 60.0, 1e-9));
        assert!(close(jet, 67.0, 1e-9));
        assert!(close(
            convert_fuel(1.0, FuelUnit::Gal, FuelUnit::L, FuelGrade::Avgas100ll),
            LITERS_PER_GALLON,
            1e-12
        ));
        let back = convert_fuel(avgas, FuelUnit::Lbs, FuelUnit::Gal, FuelGrade::Avgas100ll);
        assert!(close(back, 10.0, 1e-9));
    }

    #[test]
    fn test_time_conversions() {
        assert!(close(hours_to_minutes(1.5), 90.0, 1e-9));
        assert!(close(minutes_to_hours(45.0), 0.75, 1e-9));
    }

    #[test]
    fn test_unit_serde_names() {
        assert_eq!(serde_json::to_string(&DistanceUnit::Sm).unwrap(), "\"sm\"");
        assert_eq!(serde_json::to_string(&FuelUnit::L).unwrap(), "\"l\"");
        assert_eq!(serde_json::to_string(&FuelGrade::JetA).unwrap(), "\"jet-a\"");
    }
}
