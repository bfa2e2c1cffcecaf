//! Weight and balance: loading computation and CG envelope checks.
//!
//! Arms and moments are in the profile's own units; weights of fuel are
//! derived from the profile's fuel grade and converted to the profile's
//! weight unit.

use std::collections::HashSet;

use chrono::Utc;

use super::{ComputationError, ComputationResult};
use crate::models::{
    AircraftProfile, CgEnvelope, CgStatus, FuelQuantity, LoadingData, StationLoad,
    WeightBalanceData,
};
use crate::units::{convert_fuel, convert_weight, fuel_weight_lbs, FuelUnit, WeightUnit};

/// Tolerance for capacity and envelope comparisons.
const EPSILON: f64 = 1e-9;

/// Forward and aft limits at `weight`, linearly interpolated between the
/// bracketing envelope points.
///
/// Weights outside the envelope's defined range are an error; the envelope
/// is never extended past its last bracket.
pub fn limits_at(envelope: &CgEnvelope, weight: f64) -> ComputationResult<(f64, f64)> {
    let (min, max) = envelope
        .weight_range()
        .ok_or_else(|| ComputationError::validation("cg_limits", "envelope has no points"))?;
    if weight < min - EPSILON || weight > max + EPSILON {
        return Err(ComputationError::EnvelopeRangeExceeded { weight, min, max });
    }

    let points = &envelope.points;
    if points.len() == 1 {
        return Ok((points[0].forward, points[0].aft));
    }
    for pair in points.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if weight <= hi.weight + EPSILON {
            let t = ((weight - lo.weight) / (hi.weight - lo.weight)).clamp(0.0, 1.0);
            let forward = lo.forward + t * (hi.forward - lo.forward);
            let aft = lo.aft + t * (hi.aft - lo.aft);
            return Ok((forward, aft));
        }
    }
    // Unreachable for a validated envelope: weight <= max was checked above.
    let last = points[points.len() - 1];
    Ok((last.forward, last.aft))
}

/// Classify a CG position at a gross weight.
///
/// Over-weight is checked first and wins regardless of CG.
pub fn classify_cg(
    weight_balance: &WeightBalanceData,
    total_weight: f64,
    cg_position: f64,
) -> ComputationResult<CgStatus> {
    if total_weight > weight_balance.max_gross_weight {
        return Ok(CgStatus::OverWeight);
    }
    let (forward, aft) = limits_at(&weight_balance.cg_limits, total_weight)?;
    if cg_position < forward - EPSILON {
        Ok(CgStatus::ForwardLimit)
    } else if cg_position > aft + EPSILON {
        Ok(CgStatus::AftLimit)
    } else {
        Ok(CgStatus::WithinLimits)
    }
}

/// Envelope points must be strictly increasing in weight with forward <= aft.
pub fn validate_envelope(envelope: &CgEnvelope) -> ComputationResult<()> {
    if envelope.points.is_empty() {
        return Err(ComputationError::validation(
            "cg_limits.points",
            "envelope needs at least one point",
        ));
    }
    for (i, point) in envelope.points.iter().enumerate() {
        if !(point.weight.is_finite() && point.forward.is_finite() && point.aft.is_finite()) {
            return Err(ComputationError::validation(
                format!("cg_limits.points[{}]", i),
                "non-finite value",
            ));
        }
        if point.forward > point.aft {
            return Err(ComputationError::validation(
                format!("cg_limits.points[{}]", i),
                format!("forward limit {} is aft of aft limit {}", point.forward, point.aft),
            ));
        }
    }
    for (i, pair) in envelope.points.windows(2).enumerate() {
        if pair[1].weight <= pair[0].weight {
            return Err(ComputationError::validation(
                format!("cg_limits.points[{}].weight", i + 1),
                "envelope weights must be strictly increasing",
            ));
        }
    }
    Ok(())
}

/// Structural checks of a weight and balance block.
pub fn validate_weight_balance(wb: &WeightBalanceData) -> ComputationResult<()> {
    if !(wb.empty_weight > 0.0) {
        return Err(ComputationError::validation("empty_weight", "must be positive"));
    }
    if !(wb.max_gross_weight > wb.empty_weight) {
        return Err(ComputationError::validation(
            "max_gross_weight",
            "must exceed empty weight",
        ));
    }
    let mut ids = HashSet::new();
    for (i, station) in wb.stations.iter().enumerate() {
        if !ids.insert(&station.id) {
            return Err(ComputationError::validation(
                format!("stations[{}].id", i),
                format!("duplicate station id '{}'", station.id),
            ));
        }
        if !(station.max_weight >= 0.0) {
            return Err(ComputationError::validation(
                format!("stations[{}].max_weight", i),
                "must be non-negative",
            ));
        }
    }
    let fuel = &wb.fuel_capacity;
    if fuel.total < 0.0 || fuel.usable < 0.0 || fuel.unusable < 0.0 {
        return Err(ComputationError::validation(
            "fuel_capacity",
            "capacities must be non-negative",
        ));
    }
    if fuel.usable + fuel.unusable > fuel.total + EPSILON {
        return Err(ComputationError::validation(
            "fuel_capacity",
            "usable plus unusable exceeds total",
        ));
    }
    validate_envelope(&wb.cg_limits)
}

fn fuel_weight(wb: &WeightBalanceData, fuel: FuelQuantity) -> ComputationResult<f64> {
    if !(fuel.quantity.is_finite() && fuel.quantity >= 0.0) {
        return Err(ComputationError::validation(
            "fuel.quantity",
            "must be a non-negative number",
        ));
    }
    let gallons = convert_fuel(fuel.quantity, fuel.unit, FuelUnit::Gal, wb.fuel_grade);
    if gallons > wb.fuel_capacity.total + EPSILON {
        return Err(ComputationError::validation(
            "fuel.quantity",
            format!(
                "{:.1} gal exceeds tank capacity {:.1} gal",
                gallons, wb.fuel_capacity.total
            ),
        ));
    }
    let lbs = fuel_weight_lbs(fuel.quantity, fuel.unit, wb.fuel_grade);
    Ok(match wb.units.weight {
        WeightUnit::Lbs => lbs,
        WeightUnit::Kg => convert_weight(lbs, WeightUnit::Lbs, WeightUnit::Kg),
    })
}

/// Total weight, moment and CG for a loading, classified against the
/// profile's envelope.
pub fn compute_loading(
    profile: &AircraftProfile,
    stations: &[StationLoad],
    fuel: FuelQuantity,
) -> ComputationResult<LoadingData> {
    let wb = &profile.weight_balance;

    let mut loaded = HashSet::new();
    let mut total_weight = wb.empty_weight;
    let mut total_moment = wb.empty_weight_moment;

    for (i, load) in stations.iter().enumerate() {
        let station = wb.station(&load.station_id).ok_or_else(|| {
            ComputationError::validation(
                format!("stations[{}].station_id", i),
                format!("unknown station '{}'", load.station_id),
            )
        })?;
        if !loaded.insert(&load.station_id) {
            return Err(ComputationError::validation(
                format!("stations[{}].station_id", i),
                format!("station '{}' loaded twice", load.station_id),
            ));
        }
        if !(load.weight.is_finite() && load.weight >= 0.0) {
            return Err(ComputationError::validation(
                format!("stations[{}].weight", i),
                "must be a non-negative number",
            ));
        }
        if load.weight > station.max_weight + EPSILON {
            return Err(ComputationError::validation(
                format!("stations[{}].weight", i),
                format!(
                    "{} exceeds '{}' maximum of {}",
                    load.weight, station.name, station.max_weight
                ),
            ));
        }
        total_weight += load.weight;
        total_moment += load.weight * station.arm;
    }

    let fuel_weight = fuel_weight(wb, fuel)?;
    total_weight += fuel_weight;
    total_moment += fuel_weight * wb.fuel_arm();

    if total_weight <= 0.0 {
        return Err(ComputationError::DivisionUndefined { total_weight });
    }
    let cg_position = total_moment / total_weight;
    let cg_status = classify_cg(wb, total_weight, cg_position)?;
    let cg_limits = limits_at(&wb.cg_limits, total_weight).ok();

    Ok(LoadingData {
        aircraft_id: profile.id.clone(),
        stations: stations.to_vec(),
        fuel,
        fuel_weight,
        total_weight,
        total_moment,
        cg_position,
        cg_status,
        cg_limits,
        calculated: Utc::now(),
    })
}

/// Loading at landing: the takeoff loading with the planned burn removed.
pub fn compute_landing_loading(
    profile: &AircraftProfile,
    stations: &[StationLoad],
    fuel: FuelQuantity,
    burn: FuelQuantity,
) -> ComputationResult<LoadingData> {
    let grade = profile.weight_balance.fuel_grade;
    let burn_in_fuel_unit = convert_fuel(burn.quantity, burn.unit, fuel.unit, grade);
    if burn_in_fuel_unit > fuel.quantity + EPSILON {
        return Err(ComputationError::InsufficientFuel {
            required: burn_in_fuel_unit,
            available: fuel.quantity,
        });
    }
    let remaining = FuelQuantity {
        quantity: (fuel.quantity - burn_in_fuel_unit).max(0.0),
        unit: fuel.unit,
    };
    compute_loading(profile, stations, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CgPoint;
    use crate::services::defaults::cessna_172s;

    fn envelope() -> CgEnvelope {
        CgEnvelope::new(vec![
            CgPoint {
                weight: 1500.0,
                forward: 35.0,
                aft: 47.3,
            },
            CgPoint {
                weight: 1950.0,
                forward: 35.0,
                aft: 47.3,
            },
            CgPoint {
                weight: 2550.0,
                forward: 41.0,
                aft: 47.3,
            },
        ])
    }

    #[test]
    fn test_limits_interpolate_between_points() {
        let (fwd, aft) = limits_at(&envelope(), 2250.0).unwrap();
        assert!((fwd - 38.0).abs() < 1e-9);
        assert!((aft - 47.3).abs() < 1e-9);
    }

    #[test]
    fn test_limits_at_exact_points() {
        let (fwd, _) = limits_at(&envelope(), 2550.0).unwrap();
        assert!((fwd - 41.0).abs() < 1e-9);
        let (fwd, _) = limits_at(&envelope(), 1500.0).unwrap();
        assert!((fwd - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_limits_outside_range() {
        let err = limits_at(&envelope(), 1400.0).unwrap_err();
        assert!(matches!(
            err,
            ComputationError::EnvelopeRangeExceeded { min, max, .. } if min == 1500.0 && max == 2550.0
        ));
    }

    #[test]
    fn test_envelope_validation() {
        assert!(validate_envelope(&envelope()).is_ok());
        let mut unordered = envelope();
        unordered.points.swap(0, 1);
        assert!(validate_envelope(&unordered).is_err());
        let mut inverted = envelope();
        inverted.points[1].forward = 50.0;
        assert!(validate_envelope(&inverted).is_err());
        assert!(validate_envelope(&CgEnvelope::default()).is_err());
    }

    #[test]
    fn test_over_weight_wins() {
        let profile = cessna_172s();
        let wb = &profile.weight_balance;
        // Forward of every limit, still reported as over-weight
        assert_eq!(classify_cg(wb, 2600.0, 10.0).unwrap(), CgStatus::OverWeight);
    }

    #[test]
    fn test_classify_forward_and_aft() {
        let profile = cessna_172s();
        let wb = &profile.weight_balance;
        assert_eq!(classify_cg(wb, 2400.0, 36.0).unwrap(), CgStatus::ForwardLimit);
        assert_eq!(classify_cg(wb, 2400.0, 48.0).unwrap(), CgStatus::AftLimit);
        assert_eq!(classify_cg(wb, 2400.0, 42.0).unwrap(), CgStatus::WithinLimits);
    }

    #[test]
    fn test_compute_loading_sums_moments() {
        let profile = cessna_172s();
        let stations = vec![
            StationLoad::new("front-seats", 340.0),
            StationLoad::new("rear-seats", 0.0),
            StationLoad::new("baggage-a", 20.0),
        ];
        let loading = compute_loading(&profile, &stations, FuelQuantity::gallons(40.0)).unwrap();

        let wb = &profile.weight_balance;
        let expected_weight = wb.empty_weight + 340.0 + 20.0 + 240.0;
        let expected_moment = wb.empty_weight_moment + 340.0 * 37.0 + 20.0 * 95.0 + 240.0 * 48.0;
        assert!((loading.fuel_weight - 240.0).abs() < 1e-9);
        assert!((loading.total_weight - expected_weight).abs() < 1e-9);
        assert!((loading.total_moment - expected_moment).abs() < 1e-6);
        assert!((loading.cg_position - expected_moment / expected_weight).abs() < 1e-9);
        assert_eq!(loading.cg_status, CgStatus::WithinLimits);
        assert!(loading.cg_limits.is_some());
    }

    #[test]
    fn test_station_over_max_rejected() {
        let profile = cessna_172s();
        let err = compute_loading(
            &profile,
            &[StationLoad::new("baggage-a", 150.0)],
            FuelQuantity::gallons(10.0),
        )
        .unwrap_err();
        assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "stations[0].weight"));
    }

    #[test]
    fn test_unknown_station_rejected() {
        let profile = cessna_172s();
        let err = compute_loading(
            &profile,
            &[StationLoad::new("wing-locker", 10.0)],
            FuelQuantity::gallons(10.0),
        )
        .unwrap_err();
        assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "stations[0].station_id"));
    }

    #[test]
    fn test_fuel_over_capacity_rejected() {
        let profile = cessna_172s();
        let err = compute_loading(&profile, &[], FuelQuantity::gallons(60.0)).unwrap_err();
        assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "fuel.quantity"));
    }

    #[test]
    fn test_non_positive_total_weight() {
        let mut profile = cessna_172s();
        profile.weight_balance.empty_weight = 0.0;
        profile.weight_balance.empty_weight_moment = 0.0;
        let err = compute_loading(&profile, &[], FuelQuantity::gallons(0.0)).unwrap_err();
        assert!(matches!(err, ComputationError::DivisionUndefined { .. }));
    }

    #[test]
    fn test_landing_loading_removes_burn() {
        let profile = cessna_172s();
        let stations = vec![StationLoad::new("front-seats", 340.0)];
        let takeoff = compute_loading(&profile, &stations, FuelQuantity::gallons(40.0)).unwrap();
        let landing = compute_landing_loading(
            &profile,
            &stations,
            FuelQuantity::gallons(40.0),
            FuelQuantity::gallons(15.0),
        )
        .unwrap();
        assert!((takeoff.total_weight - landing.total_weight - 90.0).abs() < 1e-9);

        let err = compute_landing_loading(
            &profile,
            &stations,
            FuelQuantity::gallons(10.0),
            FuelQuantity::gallons(15.0),
        )
        .unwrap_err();
        assert!(matches!(err, ComputationError::InsufficientFuel { .. }));
    }
}
