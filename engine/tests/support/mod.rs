#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flightplan_engine::db::LocalRepository;
use flightplan_engine::models::{Route, ServiceStatus, Waypoint};
use flightplan_engine::services::{Lifecycle, Service, ServiceError, ServiceResult};
use flightplan_engine::Engine;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn kord() -> Waypoint {
    Waypoint::airport("KORD", 41.978, -87.904).with_name("Chicago O'Hare")
}

pub fn kmdw() -> Waypoint {
    Waypoint::airport("KMDW", 41.786, -87.752).with_name("Chicago Midway")
}

pub fn kdpa() -> Waypoint {
    Waypoint::airport("KDPA", 41.907, -88.248).with_name("DuPage")
}

pub fn chicago_tour() -> Route {
    Route::new("Chicago tour", vec![kord(), kmdw(), kdpa()]).with_cruise(110.0, 8.4)
}

/// Engine over a fresh in-memory repository, already initialized.
pub async fn ready_engine(repository: LocalRepository) -> Engine {
    let engine = Engine::builder()
        .with_repository(Arc::new(repository))
        .build()
        .await
        .unwrap();
    engine.initialize().await.unwrap();
    engine
}

/// Scripted service for orchestrator tests.
pub struct ScriptedService {
    lifecycle: Lifecycle,
    fail_initialize: bool,
    fail_cleanup: bool,
    fail_status: bool,
    delay_ms: u64,
    pub initialize_calls: AtomicUsize,
    pub cleanup_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn healthy() -> Self {
        Self {
            lifecycle: Lifecycle::new("scripted"),
            fail_initialize: false,
            fail_cleanup: false,
            fail_status: false,
            delay_ms: 0,
            initialize_calls: AtomicUsize::new(0),
            cleanup_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_initialize() -> Self {
        Self {
            fail_initialize: true,
            ..Self::healthy()
        }
    }

    pub fn failing_cleanup() -> Self {
        Self {
            fail_cleanup: true,
            ..Self::healthy()
        }
    }

    pub fn failing_status() -> Self {
        Self {
            fail_status: true,
            ..Self::healthy()
        }
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            ..Self::healthy()
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn failure(&self, what: &str) -> ServiceError {
        ServiceError::Unavailable {
            service: "scripted".into(),
            message: format!("{} failed", what),
        }
    }
}

#[async_trait]
impl Service for ScriptedService {
    async fn initialize(&self) -> ServiceResult<()> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_initialize {
            return Err(self.failure("initialize"));
        }
        self.lifecycle.mark_initialized();
        Ok(())
    }

    async fn cleanup(&self) -> ServiceResult<()> {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        self.lifecycle.mark_stopped();
        if self.fail_cleanup {
            return Err(self.failure("cleanup"));
        }
        Ok(())
    }

    fn status(&self) -> ServiceResult<ServiceStatus> {
        if self.fail_status {
            return Err(self.failure("status"));
        }
        Ok(self.lifecycle.status())
    }
}
