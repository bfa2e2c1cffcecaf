//! Coordinated startup, shutdown and health of registered services.
//!
//! Services initialize concurrently as spawned tasks. The first failure
//! fails the whole `initialize`, but siblings still in flight are detached
//! rather than aborted, and services that already succeeded stay
//! initialized. Cleanup always visits every service and always returns the
//! orchestrator to [`OrchestratorState::NotStarted`].
//!
//! Initializers are spawned on the ambient tokio runtime. On a current-thread
//! runtime they interleave on the caller's thread; on a multi-thread runtime
//! they may run in parallel, and each service guards its own state.
//! A panicking initializer counts as that service failing.

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::{Id, JoinSet};

use super::service::{Service, ServiceError};
use crate::models::ServiceStatus;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Service '{service}' failed to initialize: {source}")]
    ServiceInitFailure {
        service: String,
        #[source]
        source: ServiceError,
    },

    /// Another initialize or cleanup is still running.
    #[error("Orchestrator is busy ({state:?})")]
    Busy { state: OrchestratorState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestratorState {
    NotStarted,
    Initializing,
    Initialized,
    CleaningUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceState {
    Unregistered,
    /// Registered but not initialized, or cleaned up.
    Registered,
    Initializing,
    Ready,
    Failed,
}

/// Outcome of [`ServiceOrchestrator::cleanup`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub failed: Vec<(String, ServiceError)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

type StateMap = Arc<Mutex<HashMap<String, ServiceState>>>;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

pub struct ServiceOrchestrator {
    services: RwLock<Vec<(String, Arc<dyn Service>)>>,
    service_states: StateMap,
    state: Mutex<OrchestratorState>,
}

impl Default for ServiceOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceOrchestrator {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(Vec::new()),
            service_states: Arc::new(Mutex::new(HashMap::new())),
            state: Mutex::new(OrchestratorState::NotStarted),
        }
    }

    /// Register `service` under `name`. A service registered under an existing
    /// name replaces it.
    pub fn register(&self, name: impl Into<String>, service: Arc<dyn Service>) {
        let name = name.into();
        let mut services = self.services.write();
        match services.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => {
                log::warn!("Replacing registered service '{}'", name);
                entry.1 = service;
            }
            None => services.push((name.clone(), service)),
        }
        self.service_states.lock().insert(name, ServiceState::Registered);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| Arc::clone(s))
    }

    /// Names in registration order.
    pub fn service_names(&self) -> Vec<String> {
        self.services.read().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn service_state(&self, name: &str) -> ServiceState {
        self.service_states
            .lock()
            .get(name)
            .copied()
            .unwrap_or(ServiceState::Unregistered)
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.lock()
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == OrchestratorState::Initialized
    }

    /// Initialize every registered service concurrently. Returns immediately
    /// once initialized.
    pub async fn initialize(&self) -> Result<(), OrchestratorError> {
        {
            let mut state = self.state.lock();
            match *state {
                OrchestratorState::Initialized => return Ok(()),
                OrchestratorState::NotStarted => *state = OrchestratorState::Initializing,
                busy => return Err(OrchestratorError::Busy { state: busy }),
            }
        }

        let services = self.services.read().clone();
        log::info!("Initializing {} services", services.len());

        let mut tasks = JoinSet::new();
        let mut names: HashMap<Id, String> = HashMap::new();
        for (name, service) in services {
            let states = Arc::clone(&self.service_states);
            states.lock().insert(name.clone(), ServiceState::Initializing);
            let task_name = name.clone();
            let handle = tasks.spawn(async move {
                let result = match AssertUnwindSafe(service.initialize()).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => Err(ServiceError::Unavailable {
                        service: task_name.clone(),
                        message: format!("initialize panicked: {}", panic_message(payload.as_ref())),
                    }),
                };
                let next = if result.is_ok() {
                    ServiceState::Ready
                } else {
                    ServiceState::Failed
                };
                states.lock().insert(task_name, next);
                result
            });
            names.insert(handle.id(), name);
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => (
                    e.id(),
                    Err(ServiceError::Unavailable {
                        service: names.get(&e.id()).cloned().unwrap_or_default(),
                        message: format!("initialize task failed: {}", e),
                    }),
                ),
            };
            let service = names.get(&id).cloned().unwrap_or_default();
            if let Err(source) = result {
                self.service_states
                    .lock()
                    .insert(service.clone(), ServiceState::Failed);
                failure = Some(OrchestratorError::ServiceInitFailure { service, source });
                break;
            }
        }

        match failure {
            Some(err) => {
                // Dropping the set would abort the remaining initializers.
                tasks.detach_all();
                *self.state.lock() = OrchestratorState::NotStarted;
                log::warn!("{}", err);
                Err(err)
            }
            None => {
                *self.state.lock() = OrchestratorState::Initialized;
                log::info!("All services initialized");
                Ok(())
            }
        }
    }

    /// Clean up every registered service concurrently, whatever its state.
    pub async fn cleanup(&self) -> CleanupReport {
        *self.state.lock() = OrchestratorState::CleaningUp;
        let services = self.services.read().clone();
        log::info!("Cleaning up {} services", services.len());

        let outcomes = join_all(services.iter().map(|(name, service)| async move {
            (name.clone(), service.cleanup().await)
        }))
        .await;

        let mut report = CleanupReport::default();
        {
            let mut states = self.service_states.lock();
            for (name, result) in outcomes {
                states.insert(name.clone(), ServiceState::Registered);
                if let Err(e) = result {
                    log::warn!("Service '{}' failed to clean up: {}", name, e);
                    report.failed.push((name, e));
                }
            }
        }

        *self.state.lock() = OrchestratorState::NotStarted;
        log::info!("Services cleaned up");
        report
    }

    /// Self-reported status of every service. A status call that fails is
    /// reported as unhealthy.
    pub fn health_status(&self) -> BTreeMap<String, ServiceStatus> {
        self.services
            .read()
            .iter()
            .map(|(name, service)| {
                let status = service
                    .status()
                    .unwrap_or_else(|e| ServiceStatus::unhealthy(e.to_string()));
                (name.clone(), status)
            })
            .collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.health_status().values().all(|s| s.healthy)
    }
}
