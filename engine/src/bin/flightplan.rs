//! Demonstration binary.
//!
//! Builds an engine from `flightplan.toml` (or defaults), stores a short
//! KORD to KMDW route and prints its navigation log as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin flightplan
//! FLIGHTPLAN_REPOSITORY=file FLIGHTPLAN_DATA_DIR=/tmp/fp cargo run --bin flightplan
//! ```
//!
//! # Environment Variables
//!
//! - `FLIGHTPLAN_REPOSITORY`: `local` (default) or `file`
//! - `FLIGHTPLAN_DATA_DIR`: data directory for the file repository
//! - `FLIGHTPLAN_MAG_VAR`: magnetic variation in degrees, east positive
//! - `RUST_LOG`: Log level (default: info)

use std::env;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use flightplan_engine::algorithms::FlightRules;
use flightplan_engine::models::{Route, Waypoint};
use flightplan_engine::{Engine, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let config = EngineConfig::load()?;
    let engine = Engine::builder().with_config(config).build().await?;
    engine.initialize().await?;
    info!("Engine ready");

    let route = Route::new(
        "KORD to KMDW",
        vec![
            Waypoint::airport("KORD", 41.978, -87.904).with_name("Chicago O'Hare"),
            Waypoint::airport("KMDW", 41.786, -87.752).with_name("Chicago Midway"),
        ],
    )
    .with_cruise(110.0, 8.4);
    let route = engine.routes().save(route)?;
    let id = route
        .id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("saved route has no id"))?;

    let log = engine.routes().navigation_log(&id, 40.0)?;
    println!("{}", serde_json::to_string_pretty(&log)?);

    let fuel = engine.plan_route_fuel(&id, None, FlightRules::Vfr)?;
    println!("{}", serde_json::to_string_pretty(&fuel)?);

    let report = engine.cleanup().await;
    for (service, error) in &report.failed {
        warn!("{} cleanup failed: {}", service, error);
    }
    Ok(())
}
