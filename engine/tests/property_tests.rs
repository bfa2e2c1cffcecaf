//! Property tests for leg geometry, codecs and weight and balance.

use std::sync::Arc;

use proptest::prelude::*;

use flightplan_engine::algorithms::geodesy::angle_difference;
use flightplan_engine::algorithms::performance::takeoff_table;
use flightplan_engine::algorithms::weight_balance::classify_cg;
use flightplan_engine::algorithms::RouteCalculator;
use flightplan_engine::codecs::{CodecRegistry, MemoryDirectory, RouteFormat};
use flightplan_engine::models::{CgStatus, LatLng, Route, Waypoint, WaypointKind};
use flightplan_engine::services::defaults::cessna_172s;

fn position() -> impl Strategy<Value = (f64, f64)> {
    (-60.0f64..60.0, -179.0f64..179.0)
}

fn route_points() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec(position(), 2..8)
}

fn airports(points: &[(f64, f64)]) -> Vec<Waypoint> {
    points
        .iter()
        .enumerate()
        .map(|(i, (lat, lng))| Waypoint::airport(format!("AP{:02}", i), *lat, *lng))
        .collect()
}

fn kind() -> impl Strategy<Value = WaypointKind> {
    prop_oneof![
        Just(WaypointKind::Airport),
        Just(WaypointKind::Vor),
        Just(WaypointKind::Gps),
        Just(WaypointKind::Custom),
    ]
}

fn mixed_points() -> impl Strategy<Value = Vec<((f64, f64), WaypointKind)>> {
    prop::collection::vec((position(), kind()), 2..8)
}

/// Unique identifiers so FPL's waypoint table never sees one name at two
/// positions.
fn mixed_waypoints(points: &[((f64, f64), WaypointKind)]) -> Vec<Waypoint> {
    points
        .iter()
        .enumerate()
        .map(|(i, ((lat, lng), kind))| {
            let identifier = format!("{}{:02}", kind.as_str().to_uppercase(), i);
            Waypoint::new(identifier, *kind, LatLng::new(*lat, *lng))
        })
        .collect()
}

proptest! {
    #[test]
    fn leg_distance_symmetric(
        (lat, lng) in position(),
        dlat in -0.5f64..0.5,
        dlng in -0.5f64..0.5,
    ) {
        prop_assume!(dlat.abs() > 1e-4 || dlng.abs() > 1e-4);
        let calc = RouteCalculator::default();
        let a = Waypoint::new("A", WaypointKind::Custom, LatLng::new(lat, lng));
        let b = Waypoint::new("B", WaypointKind::Custom, LatLng::new(lat + dlat, lng + dlng));

        let out = calc.compute_leg(&a, &b).unwrap();
        let back = calc.compute_leg(&b, &a).unwrap();
        prop_assert!(out.distance > 0.0);
        prop_assert!((out.distance - back.distance).abs() < 1e-9);

        // Reverse course differs from the reciprocal by meridian convergence,
        // which never exceeds the longitude difference below 60 degrees.
        let reciprocal = out.true_course.unwrap() + 180.0;
        let skew = angle_difference(back.true_course.unwrap(), reciprocal).abs();
        prop_assert!(skew <= dlng.abs() + 1e-6, "skew {} for dlng {}", skew, dlng);
    }

    #[test]
    fn route_totals_match_legs(points in route_points()) {
        let route = RouteCalculator::default()
            .compute_route("Prop", airports(&points), Some(120.0), Some(9.0))
            .unwrap();
        prop_assert_eq!(route.legs.len(), points.len() - 1);
        let sum: f64 = route.legs.iter().map(|l| l.distance).sum();
        prop_assert!((route.total_distance - sum).abs() < 1e-6);
    }

    #[test]
    fn codec_round_trip_preserves_identifiers(points in mixed_points()) {
        let waypoints = mixed_waypoints(&points);
        let route = Route::new("Round trip", waypoints.clone());
        let expected: Vec<_> = waypoints.iter().map(|w| w.identifier.clone()).collect();

        let with_directory =
            CodecRegistry::with_directory(Arc::new(MemoryDirectory::with_waypoints(waypoints.clone())));
        for registry in [CodecRegistry::default(), with_directory] {
            for format in RouteFormat::ALL {
                let raw = registry.encode(&route, format).unwrap();
                let decoded = registry.decode(&raw, format).unwrap();
                let identifiers: Vec<_> =
                    decoded.waypoints.iter().map(|w| w.identifier.clone()).collect();
                prop_assert_eq!(&identifiers, &expected, "format {}", format);
            }
        }
    }

    #[test]
    fn over_gross_weight_always_over_weight(excess in 0.1f64..2000.0, cg in -100.0f64..200.0) {
        let wb = cessna_172s().weight_balance;
        let status = classify_cg(&wb, wb.max_gross_weight + excess, cg).unwrap();
        prop_assert_eq!(status, CgStatus::OverWeight);
    }
}

#[test]
fn takeoff_table_returns_recorded_points() {
    let profile = cessna_172s();
    let table = takeoff_table(&profile.performance).unwrap();
    for row in &profile.performance.takeoff {
        let [distance, ground_roll] = table
            .interpolate([row.weight, row.altitude, row.temperature])
            .unwrap();
        assert_eq!(distance, row.distance);
        assert_eq!(ground_roll, row.ground_roll);
    }
}
