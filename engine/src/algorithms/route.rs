//! Leg geometry, route aggregation and navigation logs.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::debug;

use super::geodesy::{angle_difference, haversine_nm, initial_bearing, midpoint, normalize_degrees};
use super::{ComputationError, ComputationResult};
use crate::models::{
    CourseStatus, NavigationLog, NavigationLogEntry, NavigationLogSummary, PlannedWind, Route,
    RouteEdit, RouteLeg, Waypoint,
};
use crate::providers::{MagneticVariation, NoVariation};
use crate::units::{hours_to_minutes, minutes_to_hours};

/// Heading and ground speed from the wind triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSolution {
    /// Degrees, positive to the right of course.
    pub wind_correction: f64,
    pub true_heading: f64,
    pub ground_speed: f64,
}

/// Solve the wind triangle for a true course and true airspeed.
///
/// The correction angle follows from the law of sines; the ground speed is
/// the along-track component, so a headwind stronger than the airspeed gives
/// a negative value instead of a misleading magnitude.
pub fn solve_wind_triangle(
    true_course: f64,
    true_airspeed: f64,
    wind: PlannedWind,
) -> ComputationResult<WindSolution> {
    let relative = qtty::Degrees::new(angle_difference(wind.direction, true_course));
    let crosswind_ratio = wind.speed / true_airspeed * relative.sin();
    if crosswind_ratio.abs() > 1.0 {
        return Err(ComputationError::validation(
            "wind",
            format!(
                "crosswind of {:.0} kt exceeds true airspeed {:.0} kt",
                wind.speed * relative.sin().abs(),
                true_airspeed
            ),
        ));
    }
    let wca_rad = crosswind_ratio.asin();
    let wind_correction = qtty::Radians::new(wca_rad).to::<qtty::Degree>().value();
    let ground_speed = true_airspeed * wca_rad.cos() - wind.speed * relative.cos();

    Ok(WindSolution {
        wind_correction,
        true_heading: normalize_degrees(true_course + wind_correction),
        ground_speed,
    })
}

/// Computes legs, totals and navigation logs.
///
/// Magnetic courses come from the injected variation model, evaluated at each
/// leg's midpoint.
#[derive(Clone)]
pub struct RouteCalculator {
    variation: Arc<dyn MagneticVariation>,
    date: Option<NaiveDate>,
}

impl Default for RouteCalculator {
    fn default() -> Self {
        Self::new(Arc::new(NoVariation))
    }
}

impl RouteCalculator {
    pub fn new(variation: Arc<dyn MagneticVariation>) -> Self {
        Self {
            variation,
            date: None,
        }
    }

    /// Pin the date used for variation lookups (defaults to today).
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    fn variation_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Geometry of the leg between two waypoints.
    pub fn compute_leg(&self, from: &Waypoint, to: &Waypoint) -> ComputationResult<RouteLeg> {
        validate_waypoint(from, "from")?;
        validate_waypoint(to, "to")?;

        let distance = haversine_nm(from.coordinates, to.coordinates);
        let true_course = initial_bearing(from.coordinates, to.coordinates);

        let (magnetic_course, course_status, magnetic_variation) = match true_course {
            None => (None, CourseStatus::Undefined, None),
            Some(tc) => {
                let mid = midpoint(from.coordinates, to.coordinates);
                match self.variation.variation_at(mid, self.variation_date()) {
                    Some(var) => (
                        Some(normalize_degrees(tc - var)),
                        CourseStatus::Magnetic,
                        Some(var),
                    ),
                    None => (Some(tc), CourseStatus::Unconverted, None),
                }
            }
        };

        Ok(RouteLeg {
            from: from.clone(),
            to: to.clone(),
            distance,
            true_course,
            magnetic_course,
            course_status,
            magnetic_variation,
            wind_correction: None,
            true_heading: None,
            ground_speed: None,
            estimated_time: None,
            fuel_burn: None,
        })
    }

    /// Fill time and fuel of a leg from cruise speed, burn rate and wind.
    fn apply_cruise(
        leg: &mut RouteLeg,
        cruise_speed: f64,
        fuel_burn_rate: Option<f64>,
        wind: Option<PlannedWind>,
    ) -> ComputationResult<()> {
        let ground_speed = match (wind, leg.true_course) {
            (Some(wind), Some(tc)) => {
                let solution = solve_wind_triangle(tc, cruise_speed, wind)?;
                leg.wind_correction = Some(solution.wind_correction);
                leg.true_heading = Some(solution.true_heading);
                solution.ground_speed
            }
            _ => cruise_speed,
        };
        if ground_speed <= 0.0 {
            return Err(ComputationError::validation(
                "ground_speed",
                format!(
                    "non-positive ground speed {:.1} kt on leg {} -> {}",
                    ground_speed, leg.from.identifier, leg.to.identifier
                ),
            ));
        }

        let minutes = hours_to_minutes(leg.distance / ground_speed);
        leg.ground_speed = Some(ground_speed);
        leg.estimated_time = Some(minutes);
        leg.fuel_burn = fuel_burn_rate.map(|rate| minutes_to_hours(minutes) * rate);
        Ok(())
    }

    /// Rebuild legs and totals of `route` from its waypoints and cruise settings.
    pub fn recompute(&self, route: &Route) -> ComputationResult<Route> {
        validate_route_inputs(route)?;

        let mut legs = Vec::with_capacity(route.waypoints.len().saturating_sub(1));
        for pair in route.waypoints.windows(2) {
            let mut leg = self.compute_leg(&pair[0], &pair[1])?;
            if let Some(speed) = route.cruise_speed {
                Self::apply_cruise(&mut leg, speed, route.fuel_burn_rate, route.wind)?;
            }
            legs.push(leg);
        }

        let total_distance = legs.iter().map(|l| l.distance).sum();
        let (total_time, total_fuel) = if legs.is_empty() {
            (Some(0.0), Some(0.0))
        } else {
            let time: Option<f64> = legs.iter().map(|l| l.estimated_time).sum();
            let fuel: Option<f64> = legs.iter().map(|l| l.fuel_burn).sum();
            (time, fuel)
        };

        debug!(
            "Computed route '{}': {} legs, {:.1} NM",
            route.name,
            legs.len(),
            total_distance
        );

        Ok(Route {
            legs,
            total_distance,
            total_time,
            total_fuel,
            ..route.clone()
        })
    }

    /// Build a fresh (unsaved) route from a waypoint sequence.
    pub fn compute_route(
        &self,
        name: impl Into<String>,
        waypoints: Vec<Waypoint>,
        cruise_speed: Option<f64>,
        fuel_burn_rate: Option<f64>,
    ) -> ComputationResult<Route> {
        let mut route = Route::new(name, waypoints);
        route.cruise_speed = cruise_speed;
        route.fuel_burn_rate = fuel_burn_rate;
        self.recompute(&route)
    }

    /// Apply a structural edit and recompute everything derived.
    pub fn apply_edit(&self, route: &Route, edit: &RouteEdit) -> ComputationResult<Route> {
        let mut edited = route.clone();
        match edit {
            RouteEdit::Insert { index, waypoint } => {
                if *index > edited.waypoints.len() {
                    return Err(ComputationError::validation(
                        "index",
                        format!(
                            "insert position {} beyond route length {}",
                            index,
                            edited.waypoints.len()
                        ),
                    ));
                }
                edited.waypoints.insert(*index, waypoint.clone());
            }
            RouteEdit::Remove { waypoint_id } => {
                let idx = find_waypoint(&edited, waypoint_id)?;
                edited.waypoints.remove(idx);
            }
            RouteEdit::Move {
                waypoint_id,
                to_index,
            } => {
                let idx = find_waypoint(&edited, waypoint_id)?;
                if *to_index >= edited.waypoints.len() {
                    return Err(ComputationError::validation(
                        "to_index",
                        format!(
                            "target position {} beyond last index {}",
                            to_index,
                            edited.waypoints.len() - 1
                        ),
                    ));
                }
                let wp = edited.waypoints.remove(idx);
                edited.waypoints.insert(*to_index, wp);
            }
            RouteEdit::UpdateWaypoint { waypoint_id, patch } => {
                let idx = find_waypoint(&edited, waypoint_id)?;
                edited.waypoints[idx] = patch.apply_to(&edited.waypoints[idx]);
            }
        }
        self.recompute(&edited)
    }

    /// Navigation log with fuel remaining after each leg.
    ///
    /// Legs are recomputed first so the log never reflects stale geometry.
    /// Fails with [`ComputationError::FuelExhausted`] at the first waypoint
    /// that cannot be reached with `starting_fuel`.
    pub fn build_navigation_log(
        &self,
        route: &Route,
        starting_fuel: f64,
    ) -> ComputationResult<NavigationLog> {
        if route.cruise_speed.is_none() {
            return Err(ComputationError::validation(
                "cruise_speed",
                "navigation log requires a cruise speed",
            ));
        }
        if route.fuel_burn_rate.is_none() {
            return Err(ComputationError::validation(
                "fuel_burn_rate",
                "navigation log requires a fuel burn rate",
            ));
        }
        if !starting_fuel.is_finite() || starting_fuel < 0.0 {
            return Err(ComputationError::validation(
                "starting_fuel",
                "must be a non-negative number",
            ));
        }

        let computed = self.recompute(route)?;
        let mut entries = Vec::with_capacity(computed.legs.len());
        let mut cumulative_distance = 0.0;
        let mut cumulative_time = 0.0;
        let mut remaining = starting_fuel;

        for (index, leg) in computed.legs.iter().enumerate() {
            let time = leg.estimated_time.unwrap_or(0.0);
            let burn = leg.fuel_burn.unwrap_or(0.0);
            remaining -= burn;
            if remaining < 0.0 {
                return Err(ComputationError::FuelExhausted {
                    leg_index: index,
                    waypoint: leg.to.identifier.clone(),
                    shortfall: -remaining,
                });
            }
            cumulative_distance += leg.distance;
            cumulative_time += time;

            let course = match leg.course_status {
                CourseStatus::Magnetic => leg.magnetic_course,
                _ => leg.true_course,
            };
            entries.push(NavigationLogEntry {
                leg_index: index,
                from: leg.from.identifier.clone(),
                waypoint: leg.to.identifier.clone(),
                course,
                course_status: leg.course_status,
                distance: leg.distance,
                cumulative_distance,
                ground_speed: leg.ground_speed.unwrap_or(0.0),
                estimated_time: time,
                cumulative_time,
                fuel_burn: burn,
                fuel_remaining: remaining,
            });
        }

        let total_time = computed.total_time.unwrap_or(0.0);
        let average_ground_speed = if total_time > 0.0 {
            computed.total_distance / minutes_to_hours(total_time)
        } else {
            0.0
        };

        Ok(NavigationLog {
            route_id: computed.id.clone(),
            starting_fuel,
            entries,
            summary: NavigationLogSummary {
                total_distance: computed.total_distance,
                total_time,
                total_fuel: computed.total_fuel.unwrap_or(0.0),
                average_ground_speed,
            },
            generated: Utc::now(),
        })
    }
}

fn find_waypoint(route: &Route, id: &crate::models::WaypointId) -> ComputationResult<usize> {
    route.waypoint_index(id).ok_or_else(|| {
        ComputationError::validation("waypoint_id", format!("no waypoint '{}' in route", id))
    })
}

fn validate_waypoint(waypoint: &Waypoint, field: &str) -> ComputationResult<()> {
    if !waypoint.coordinates.is_valid() {
        return Err(ComputationError::validation(
            format!("{}.coordinates", field),
            format!(
                "({}, {}) outside lat [-90, 90] / lng [-180, 180]",
                waypoint.coordinates.lat, waypoint.coordinates.lng
            ),
        ));
    }
    Ok(())
}

fn validate_route_inputs(route: &Route) -> ComputationResult<()> {
    let mut seen = HashSet::new();
    for (i, wp) in route.waypoints.iter().enumerate() {
        validate_waypoint(wp, &format!("waypoints[{}]", i))?;
        if !seen.insert(&wp.id) {
            return Err(ComputationError::validation(
                format!("waypoints[{}].id", i),
                format!("duplicate waypoint id '{}'", wp.id),
            ));
        }
    }
    if let Some(speed) = route.cruise_speed {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ComputationError::validation(
                "cruise_speed",
                format!("must be positive, got {}", speed),
            ));
        }
    }
    if let Some(rate) = route.fuel_burn_rate {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(ComputationError::validation(
                "fuel_burn_rate",
                format!("must be non-negative, got {}", rate),
            ));
        }
    }
    if let Some(wind) = route.wind {
        if wind.speed < 0.0 || !wind.direction.is_finite() {
            return Err(ComputationError::validation("wind", "invalid planned wind"));
        }
    }
    Ok(())
}
