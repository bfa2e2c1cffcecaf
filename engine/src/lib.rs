//! # Flight Planning Domain Engine
//!
//! Data model and computations for general-aviation flight planning, plus
//! the service layer that keeps the domain stores initialized, healthy and
//! persisted.
//!
//! ## Architecture
//!
//! - [`units`]: unit conversions
//! - [`models`]: routes, waypoints, aircraft profiles, weather and NOTAM reports
//! - [`algorithms`]: route geometry, weight and balance, performance
//!   interpolation and fuel planning
//! - [`codecs`]: FPL, GFP and GPX route import/export
//! - [`providers`]: ports to weather, NOTAM, chart and magnetic variation sources
//! - [`db`]: snapshot persistence
//! - [`services`]: domain stores and the service orchestrator
//! - [`engine`]: explicit assembly of all of the above
//!
//! ```
//! use flightplan_engine::db::LocalRepository;
//! use flightplan_engine::models::{Route, Waypoint};
//! use flightplan_engine::Engine;
//! use std::sync::Arc;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let engine = Engine::builder()
//!         .with_repository(Arc::new(LocalRepository::new()))
//!         .build()
//!         .await
//!         .unwrap();
//!     engine.initialize().await.unwrap();
//!
//!     let route = Route::new(
//!         "Short hop",
//!         vec![
//!             Waypoint::airport("KORD", 41.978, -87.904),
//!             Waypoint::airport("KMDW", 41.786, -87.752),
//!         ],
//!     );
//!     let saved = engine.routes().save(route).unwrap();
//!     assert_eq!(saved.legs.len(), 1);
//!
//!     engine.cleanup().await;
//! });
//! ```

// RepositoryError carries a rich ErrorContext
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod codecs;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod providers;
pub mod services;
pub mod units;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineBuilder};
