//! Trip, reserve and endurance fuel planning.

use serde::{Deserialize, Serialize};

use super::{ComputationError, ComputationResult};
use crate::units::{hours_to_minutes, minutes_to_hours};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlightRules {
    #[default]
    Vfr,
    VfrNight,
    Ifr,
}

/// Final reserve, in minutes at cruise burn, for each set of flight rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReservePolicy {
    pub vfr_day_minutes: f64,
    pub vfr_night_minutes: f64,
    pub ifr_minutes: f64,
}

impl Default for ReservePolicy {
    fn default() -> Self {
        Self {
            vfr_day_minutes: 30.0,
            vfr_night_minutes: 45.0,
            ifr_minutes: 45.0,
        }
    }
}

impl ReservePolicy {
    pub fn minutes_for(&self, rules: FlightRules) -> f64 {
        match rules {
            FlightRules::Vfr => self.vfr_day_minutes,
            FlightRules::VfrNight => self.vfr_night_minutes,
            FlightRules::Ifr => self.ifr_minutes,
        }
    }
}

/// Inputs for a fuel plan; quantities share one fuel unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelPlanInput {
    /// Minutes en route
    pub trip_minutes: f64,
    /// Per hour
    pub fuel_burn: f64,
    pub capacity: f64,
    pub unusable: f64,
    #[serde(default)]
    pub taxi_fuel: f64,
    /// Minutes to the alternate, when one is required
    #[serde(default)]
    pub alternate_minutes: Option<f64>,
    /// Extra minutes the pilot wants on top of the reserve
    #[serde(default)]
    pub additional_minutes: Option<f64>,
    /// Fuel actually loaded; when given the plan checks it
    #[serde(default)]
    pub fuel_on_board: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelPlan {
    pub rules: FlightRules,
    pub trip_fuel: f64,
    pub reserve_minutes: f64,
    pub reserve_fuel: f64,
    pub alternate_fuel: f64,
    pub additional_fuel: f64,
    pub taxi_fuel: f64,
    pub total_required: f64,
    /// Required fuel rounded up to a whole unit, capped at usable capacity
    pub recommended_load: f64,
    /// Minutes of flight with the loaded (or recommended) fuel, after taxi
    pub endurance_minutes: f64,
}

fn non_negative(field: &str, value: f64) -> ComputationResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(ComputationError::validation(
            field,
            format!("must be a non-negative number, got {}", value),
        ));
    }
    Ok(())
}

pub fn plan_fuel(
    input: &FuelPlanInput,
    rules: FlightRules,
    policy: &ReservePolicy,
) -> ComputationResult<FuelPlan> {
    non_negative("trip_minutes", input.trip_minutes)?;
    non_negative("capacity", input.capacity)?;
    non_negative("unusable", input.unusable)?;
    non_negative("taxi_fuel", input.taxi_fuel)?;
    if !(input.fuel_burn.is_finite() && input.fuel_burn > 0.0) {
        return Err(ComputationError::validation("fuel_burn", "must be positive"));
    }

    let burn_for = |minutes: f64| minutes_to_hours(minutes) * input.fuel_burn;

    let reserve_minutes = policy.minutes_for(rules);
    let trip_fuel = burn_for(input.trip_minutes);
    let reserve_fuel = burn_for(reserve_minutes);
    let alternate_fuel = input.alternate_minutes.map(burn_for).unwrap_or(0.0);
    let additional_fuel = input.additional_minutes.map(burn_for).unwrap_or(0.0);
    let total_required = input.taxi_fuel + trip_fuel + reserve_fuel + alternate_fuel + additional_fuel;

    let usable = (input.capacity - input.unusable).max(0.0);
    if total_required > usable {
        return Err(ComputationError::InsufficientFuel {
            required: total_required,
            available: usable,
        });
    }
    if let Some(on_board) = input.fuel_on_board {
        non_negative("fuel_on_board", on_board)?;
        if on_board < total_required {
            return Err(ComputationError::InsufficientFuel {
                required: total_required,
                available: on_board,
            });
        }
    }

    let recommended_load = total_required.ceil().min(usable);
    let loaded = input.fuel_on_board.unwrap_or(recommended_load);
    let endurance_minutes = hours_to_minutes((loaded - input.taxi_fuel).max(0.0) / input.fuel_burn);

    Ok(FuelPlan {
        rules,
        trip_fuel,
        reserve_minutes,
        reserve_fuel,
        alternate_fuel,
        additional_fuel,
        taxi_fuel: input.taxi_fuel,
        total_required,
        recommended_load,
        endurance_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> FuelPlanInput {
        FuelPlanInput {
            trip_minutes: 90.0,
            fuel_burn: 8.0,
            capacity: 56.0,
            unusable: 3.0,
            taxi_fuel: 1.1,
            alternate_minutes: None,
            additional_minutes: None,
            fuel_on_board: None,
        }
    }

    #[test]
    fn test_vfr_day_reserve() {
        let plan = plan_fuel(&input(), FlightRules::Vfr, &ReservePolicy::default()).unwrap();
        assert!((plan.trip_fuel - 12.0).abs() < 1e-9);
        assert!((plan.reserve_fuel - 4.0).abs() < 1e-9);
        assert!((plan.total_required - 17.1).abs() < 1e-9);
        assert_eq!(plan.recommended_load, 18.0);
        assert!((plan.endurance_minutes - (18.0 - 1.1) / 8.0 * 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_ifr_with_alternate() {
        let mut i = input();
        i.alternate_minutes = Some(30.0);
        let plan = plan_fuel(&i, FlightRules::Ifr, &ReservePolicy::default()).unwrap();
        assert!((plan.reserve_fuel - 6.0).abs() < 1e-9);
        assert!((plan.alternate_fuel - 4.0).abs() < 1e-9);
        assert!((plan.total_required - 23.1).abs() < 1e-9);
    }

    #[test]
    fn test_trip_beyond_capacity() {
        let mut i = input();
        i.trip_minutes = 400.0;
        let err = plan_fuel(&i, FlightRules::Vfr, &ReservePolicy::default()).unwrap_err();
        assert!(matches!(err, ComputationError::InsufficientFuel { available, .. } if available == 53.0));
    }

    #[test]
    fn test_fuel_on_board_checked() {
        let mut i = input();
        i.fuel_on_board = Some(15.0);
        let err = plan_fuel(&i, FlightRules::Vfr, &ReservePolicy::default()).unwrap_err();
        assert!(matches!(err, ComputationError::InsufficientFuel { .. }));

        i.fuel_on_board = Some(40.0);
        let plan = plan_fuel(&i, FlightRules::Vfr, &ReservePolicy::default()).unwrap();
        assert!((plan.endurance_minutes - (40.0 - 1.1) / 8.0 * 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_burn_rejected() {
        let mut i = input();
        i.fuel_burn = 0.0;
        assert!(plan_fuel(&i, FlightRules::Vfr, &ReservePolicy::default()).is_err());
    }
}
