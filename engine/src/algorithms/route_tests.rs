use std::sync::Arc;

use chrono::NaiveDate;

use super::route::{solve_wind_triangle, RouteCalculator};
use super::ComputationError;
use crate::models::{
    CourseStatus, LatLng, PlannedWind, Route, RouteEdit, Waypoint, WaypointKind, WaypointPatch,
};
use crate::providers::FixedVariation;

fn kord() -> Waypoint {
    Waypoint::airport("KORD", 41.978, -87.904)
}

fn kmdw() -> Waypoint {
    Waypoint::airport("KMDW", 41.786, -87.752)
}

fn kdpa() -> Waypoint {
    Waypoint::airport("KDPA", 41.907, -88.248)
}

fn calc() -> RouteCalculator {
    RouteCalculator::default()
}

#[test]
fn test_kord_to_kmdw_leg() {
    let leg = calc().compute_leg(&kord(), &kmdw()).unwrap();
    assert!((leg.distance - 13.37).abs() < 0.1, "distance {}", leg.distance);
    let tc = leg.true_course.unwrap();
    assert!((145.0..=155.0).contains(&tc), "true course {}", tc);
    assert_eq!(leg.course_status, CourseStatus::Unconverted);
    assert_eq!(leg.magnetic_course, leg.true_course);
}

#[test]
fn test_magnetic_course_subtracts_east_variation() {
    let calculator = RouteCalculator::new(Arc::new(FixedVariation(-3.0)))
        .with_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let leg = calculator.compute_leg(&kord(), &kmdw()).unwrap();
    let tc = leg.true_course.unwrap();
    let mc = leg.magnetic_course.unwrap();
    assert_eq!(leg.course_status, CourseStatus::Magnetic);
    assert!((mc - (tc + 3.0)).abs() < 1e-9);
    assert_eq!(leg.magnetic_variation, Some(-3.0));
}

#[test]
fn test_zero_length_leg_is_signaled() {
    let a = kord();
    let mut b = kord();
    b.id = crate::models::WaypointId::generate();
    let leg = calc().compute_leg(&a, &b).unwrap();
    assert_eq!(leg.distance, 0.0);
    assert_eq!(leg.true_course, None);
    assert_eq!(leg.course_status, CourseStatus::Undefined);
}

#[test]
fn test_invalid_coordinate_rejected() {
    let bad = Waypoint::new("BAD", WaypointKind::Custom, LatLng::new(95.0, 0.0));
    let err = calc().compute_leg(&kord(), &bad).unwrap_err();
    match err {
        ComputationError::Validation { field, .. } => assert_eq!(field, "to.coordinates"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_empty_and_single_waypoint_routes() {
    let empty = calc().compute_route("Empty", vec![], Some(110.0), Some(8.0)).unwrap();
    assert!(empty.legs.is_empty());
    assert_eq!(empty.total_distance, 0.0);
    assert_eq!(empty.total_time, Some(0.0));
    assert_eq!(empty.total_fuel, Some(0.0));

    let single = calc().compute_route("One", vec![kord()], None, None).unwrap();
    assert!(single.legs.is_empty());
    assert_eq!(single.total_distance, 0.0);
}

#[test]
fn test_totals_sum_over_legs() {
    let route = calc()
        .compute_route("Tour", vec![kord(), kmdw(), kdpa()], Some(120.0), Some(9.0))
        .unwrap();
    assert_eq!(route.legs.len(), 2);
    let sum: f64 = route.legs.iter().map(|l| l.distance).sum();
    assert!((route.total_distance - sum).abs() < 1e-9);

    let expected_minutes = route.total_distance / 120.0 * 60.0;
    assert!((route.total_time.unwrap() - expected_minutes).abs() < 1e-6);
    let expected_fuel = expected_minutes / 60.0 * 9.0;
    assert!((route.total_fuel.unwrap() - expected_fuel).abs() < 1e-6);
}

#[test]
fn test_time_undefined_without_cruise_speed() {
    let route = calc()
        .compute_route("NoSpeed", vec![kord(), kmdw()], None, Some(9.0))
        .unwrap();
    assert_eq!(route.total_time, None);
    assert_eq!(route.total_fuel, None);

    let no_burn = calc()
        .compute_route("NoBurn", vec![kord(), kmdw()], Some(100.0), None)
        .unwrap();
    assert!(no_burn.total_time.is_some());
    assert_eq!(no_burn.total_fuel, None);
}

#[test]
fn test_duplicate_waypoint_ids_rejected() {
    let a = kord();
    let route = Route::new("Dup", vec![a.clone(), a]);
    let err = calc().recompute(&route).unwrap_err();
    assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "waypoints[1].id"));
}

#[test]
fn test_headwind_reduces_ground_speed() {
    let solution = solve_wind_triangle(
        90.0,
        100.0,
        PlannedWind {
            direction: 90.0,
            speed: 20.0,
        },
    )
    .unwrap();
    assert!(solution.wind_correction.abs() < 1e-9);
    assert!((solution.ground_speed - 80.0).abs() < 1e-9);
}

#[test]
fn test_crosswind_correction_into_wind() {
    let solution = solve_wind_triangle(
        0.0,
        100.0,
        PlannedWind {
            direction: 90.0,
            speed: 50.0,
        },
    )
    .unwrap();
    assert!((solution.wind_correction - 30.0).abs() < 1e-6);
    assert!((solution.true_heading - 30.0).abs() < 1e-6);
}

#[test]
fn test_headwind_stronger_than_airspeed_fails() {
    let route = Route::new("Gale", vec![kord(), kmdw()])
        .with_cruise(40.0, 5.0)
        .with_wind(PlannedWind {
            direction: 150.0,
            speed: 60.0,
        });
    let err = calc().recompute(&route).unwrap_err();
    assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "ground_speed"));
}

#[test]
fn test_edits_recompute_legs() {
    let route = calc()
        .compute_route("Edit", vec![kord(), kmdw()], Some(100.0), Some(8.0))
        .unwrap();

    let inserted = calc()
        .apply_edit(
            &route,
            &RouteEdit::Insert {
                index: 1,
                waypoint: kdpa(),
            },
        )
        .unwrap();
    assert_eq!(inserted.legs.len(), 2);
    assert_eq!(inserted.legs[0].to.identifier, "KDPA");
    assert!(inserted.total_distance > route.total_distance);

    let target = inserted.waypoints[1].id.clone();
    let moved = calc()
        .apply_edit(
            &inserted,
            &RouteEdit::Move {
                waypoint_id: target.clone(),
                to_index: 2,
            },
        )
        .unwrap();
    assert_eq!(moved.waypoints[2].identifier, "KDPA");

    let updated = calc()
        .apply_edit(
            &moved,
            &RouteEdit::UpdateWaypoint {
                waypoint_id: target.clone(),
                patch: WaypointPatch {
                    coordinates: Some(LatLng::new(41.786, -87.752)),
                    ..Default::default()
                },
            },
        )
        .unwrap();
    // KDPA moved onto KMDW: last leg collapses
    assert_eq!(updated.legs[1].course_status, CourseStatus::Undefined);

    let removed = calc()
        .apply_edit(&updated, &RouteEdit::Remove { waypoint_id: target })
        .unwrap();
    assert_eq!(removed.waypoints.len(), 2);
    assert!((removed.total_distance - route.total_distance).abs() < 1e-9);
}

#[test]
fn test_edit_unknown_waypoint() {
    let route = calc().compute_route("R", vec![kord(), kmdw()], None, None).unwrap();
    let err = calc()
        .apply_edit(
            &route,
            &RouteEdit::Remove {
                waypoint_id: "missing".into(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "waypoint_id"));
}

#[test]
fn test_navigation_log_tracks_fuel_remaining() {
    let route = Route::new("Log", vec![kord(), kmdw(), kdpa()]).with_cruise(120.0, 9.0);
    let log = calc().build_navigation_log(&route, 40.0).unwrap();

    assert_eq!(log.entries.len(), 2);
    let first = &log.entries[0];
    assert_eq!(first.from, "KORD");
    assert_eq!(first.waypoint, "KMDW");
    assert!((first.fuel_remaining - (40.0 - first.fuel_burn)).abs() < 1e-9);
    let last = &log.entries[1];
    assert!((last.fuel_remaining - (40.0 - log.summary.total_fuel)).abs() < 1e-9);
    assert!((log.summary.average_ground_speed - 120.0).abs() < 1e-6);
    assert!((last.cumulative_distance - log.summary.total_distance).abs() < 1e-9);
}

#[test]
fn test_navigation_log_fuel_exhausted() {
    let route = Route::new("Dry", vec![kord(), kmdw(), kdpa()]).with_cruise(60.0, 12.0);
    let err = calc().build_navigation_log(&route, 2.0).unwrap_err();
    match err {
        ComputationError::FuelExhausted {
            leg_index,
            waypoint,
            shortfall,
        } => {
            assert_eq!(leg_index, 0);
            assert_eq!(waypoint, "KMDW");
            assert!(shortfall > 0.0);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_navigation_log_requires_cruise_settings() {
    let route = Route::new("NoCruise", vec![kord(), kmdw()]);
    let err = calc().build_navigation_log(&route, 40.0).unwrap_err();
    assert!(matches!(err, ComputationError::Validation { ref field, .. } if field == "cruise_speed"));
}
