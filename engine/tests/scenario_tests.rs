//! End-to-end planning scenarios through the assembled engine.

mod support;

use std::sync::Arc;

use flightplan_engine::algorithms::weight_balance::classify_cg;
use flightplan_engine::algorithms::{FlightRules, PerformanceCalculator};
use flightplan_engine::codecs::RouteFormat;
use flightplan_engine::db::LocalRepository;
use flightplan_engine::models::{
    CgStatus, CourseStatus, FlightConditions, FuelQuantity, Route, StationLoad, WeatherReport,
};
use flightplan_engine::providers::{FixedVariation, StaticWeatherProvider};
use flightplan_engine::services::defaults::cessna_172s;
use flightplan_engine::services::ServiceError;
use flightplan_engine::Engine;

#[tokio::test]
async fn test_kord_to_kmdw_single_leg() {
    let engine = support::ready_engine(LocalRepository::new()).await;
    let route = engine
        .routes()
        .save(Route::new("Hop", vec![support::kord(), support::kmdw()]))
        .unwrap();

    assert_eq!(route.legs.len(), 1);
    let leg = &route.legs[0];
    assert!((leg.distance - 13.3).abs() < 0.2, "distance {}", leg.distance);
    let course = leg.true_course.unwrap();
    assert!((145.0..=155.0).contains(&course), "course {}", course);
    assert_eq!(leg.course_status, CourseStatus::Unconverted);
}

#[tokio::test]
async fn test_configured_variation_converts_courses() {
    let engine = Engine::builder()
        .with_repository(Arc::new(LocalRepository::new()))
        .with_variation(Arc::new(FixedVariation(-3.0)))
        .build()
        .await
        .unwrap();
    engine.initialize().await.unwrap();

    let route = engine
        .routes()
        .save(Route::new("Hop", vec![support::kord(), support::kmdw()]))
        .unwrap();
    let leg = &route.legs[0];
    assert_eq!(leg.course_status, CourseStatus::Magnetic);
    assert!((leg.magnetic_course.unwrap() - leg.true_course.unwrap() - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_save_then_load_all_assigns_id() {
    let engine = support::ready_engine(LocalRepository::new()).await;
    engine.routes().save(support::chicago_tour()).unwrap();

    let routes = engine.routes().load_all().unwrap();
    assert_eq!(routes.len(), 1);
    let route = &routes[0];
    assert!(!route.id.as_ref().unwrap().as_str().is_empty());
    assert!(route.created.is_some());
    assert_eq!(route.created, route.modified);
}

#[tokio::test]
async fn test_stores_reject_use_before_initialize() {
    let engine = Engine::builder()
        .with_repository(Arc::new(LocalRepository::new()))
        .build()
        .await
        .unwrap();
    let err = engine.routes().load_all().unwrap_err();
    assert!(matches!(err, ServiceError::NotInitialized { .. }));
    assert!(!engine.is_healthy());
}

#[tokio::test]
async fn test_duplicate_and_active_route() {
    let engine = support::ready_engine(LocalRepository::new()).await;
    let original = engine.routes().save(support::chicago_tour()).unwrap();
    let original_id = original.id.clone().unwrap();
    engine.routes().set_active(&original_id).unwrap();

    let copy = engine.routes().duplicate(&engine.routes().get(&original_id).unwrap()).unwrap();
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.name, "Chicago tour (Copy)");
    assert!(!copy.is_active);

    let copy_id = copy.id.clone().unwrap();
    engine.routes().set_active(&copy_id).unwrap();
    let active: Vec<_> = engine
        .routes()
        .load_all()
        .unwrap()
        .into_iter()
        .filter(|r| r.is_active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, copy.id);

    engine.routes().delete(&copy_id).unwrap();
    engine.routes().delete(&copy_id).unwrap();
    assert_eq!(engine.routes().load_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_export_then_import_through_store() {
    let engine = support::ready_engine(LocalRepository::new()).await;
    let saved = engine.routes().save(support::chicago_tour()).unwrap();
    let id = saved.id.clone().unwrap();

    // The default engine has an empty waypoint directory, so each format
    // must carry enough to rebuild the route on its own.
    for format in RouteFormat::ALL {
        let raw = engine.routes().export(&id, format).unwrap();
        let imported = engine.routes().import(&raw, format).unwrap();
        let identifiers: Vec<_> = imported.waypoints.iter().map(|w| w.identifier.as_str()).collect();
        assert_eq!(identifiers, vec!["KORD", "KMDW", "KDPA"]);
        assert_eq!(imported.legs.len(), 2);
        assert_ne!(imported.id, saved.id);
        assert!((imported.total_distance - saved.total_distance).abs() < 0.5);
    }
    assert_eq!(engine.routes().load_all().unwrap().len(), 4);
}

#[test]
fn test_over_gross_weight_is_over_weight() {
    let profile = cessna_172s();
    assert_eq!(profile.weight_balance.max_gross_weight, 2550.0);
    let status = classify_cg(&profile.weight_balance, 2600.0, 40.0).unwrap();
    assert_eq!(status, CgStatus::OverWeight);
}

#[tokio::test]
async fn test_default_aircraft_loading() {
    let engine = support::ready_engine(LocalRepository::new()).await;
    let aircraft = engine.aircraft().default_profile().unwrap().unwrap();
    let id = aircraft.id.clone().unwrap();

    let loading = engine
        .aircraft()
        .compute_loading(
            &id,
            &[StationLoad::new("front-seats", 340.0), StationLoad::new("baggage-a", 40.0)],
            FuelQuantity::gallons(40.0),
        )
        .unwrap();
    assert!((loading.total_weight - (1663.0 + 340.0 + 40.0 + 240.0)).abs() < 1e-6);
    assert_eq!(loading.cg_status, CgStatus::WithinLimits);

    let err = engine
        .aircraft()
        .compute_loading(&id, &[StationLoad::new("rear-seats", 450.0)], FuelQuantity::gallons(10.0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Computation(_)));
}

#[test]
fn test_takeoff_table_exact_point() {
    let profile = cessna_172s();
    let figures = PerformanceCalculator::new(&profile)
        .takeoff_figures(2550.0, 0.0, 20.0)
        .unwrap();
    assert_eq!(figures.distance, 1690.0);
    assert_eq!(figures.ground_roll, 995.0);
}

#[tokio::test]
async fn test_weather_and_fuel_plan() {
    let provider = StaticWeatherProvider::with_reports(vec![WeatherReport::new(
        "KMDW",
        FlightConditions::Vfr,
    )]);
    let engine = Engine::builder()
        .with_repository(Arc::new(LocalRepository::new()))
        .with_weather_provider(Arc::new(provider))
        .build()
        .await
        .unwrap();
    engine.initialize().await.unwrap();

    engine.weather().load(&["kmdw".to_string()]).await.unwrap();
    assert!(engine.weather().get("KMDW").unwrap().is_some());

    let route = engine.routes().save(support::chicago_tour()).unwrap();
    let plan = engine
        .plan_route_fuel(route.id.as_ref().unwrap(), None, FlightRules::Ifr)
        .unwrap();
    assert!((plan.reserve_fuel - 8.4 * 0.75).abs() < 1e-9);
    assert!(plan.recommended_load <= 53.0);
}
