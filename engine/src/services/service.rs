//! Lifecycle contract shared by every engine service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::algorithms::ComputationError;
use crate::codecs::CodecError;
use crate::models::ServiceStatus;
use crate::providers::ProviderError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{service} service is not initialized")]
    NotInitialized { service: String },

    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("{service} service unavailable: {message}")]
    Unavailable { service: String, message: String },

    #[error(transparent)]
    Computation(#[from] ComputationError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ServiceError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// Non-fatal condition recorded by a store. Never returned as an error; the
/// in-memory collection stays authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum StoreWarning {
    #[error("persistence degraded during {operation} of '{key}': {message}")]
    PersistenceDegraded {
        key: String,
        operation: String,
        message: String,
        at: DateTime<Utc>,
    },
}

/// A lifecycle-managed engine service.
#[async_trait]
pub trait Service: Send + Sync {
    /// Load state and make the service usable.
    async fn initialize(&self) -> ServiceResult<()>;

    /// Flush state and release resources. The service must accept a later
    /// `initialize`.
    async fn cleanup(&self) -> ServiceResult<()>;

    /// Self-reported health.
    fn status(&self) -> ServiceResult<ServiceStatus>;
}

const MAX_WARNINGS: usize = 32;

#[derive(Debug, Default)]
struct LifecycleState {
    initialized: bool,
    last_update: Option<DateTime<Utc>>,
    error_count: u32,
    last_error: Option<String>,
    warnings: Vec<StoreWarning>,
}

/// Initialization flag, warnings and error counters for one service.
#[derive(Debug)]
pub struct Lifecycle {
    name: &'static str,
    state: RwLock<LifecycleState>,
}

impl Lifecycle {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(LifecycleState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    pub fn ensure_initialized(&self) -> ServiceResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ServiceError::NotInitialized {
                service: self.name.to_string(),
            })
        }
    }

    pub fn mark_initialized(&self) {
        let mut state = self.state.write();
        state.initialized = true;
        state.last_update = Some(Utc::now());
        log::info!("{} service initialized", self.name);
    }

    pub fn mark_stopped(&self) {
        self.state.write().initialized = false;
        log::info!("{} service cleaned up", self.name);
    }

    pub fn touch(&self) {
        self.state.write().last_update = Some(Utc::now());
    }

    /// Record a failed operation that was reported to the caller.
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{} service error: {}", self.name, message);
        let mut state = self.state.write();
        state.error_count = state.error_count.saturating_add(1);
        state.last_error = Some(message);
    }

    pub fn clear_error(&self) {
        self.state.write().last_error = None;
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Record a degraded persistence operation.
    pub fn degraded(&self, key: &str, operation: &str, message: impl Into<String>) {
        let warning = StoreWarning::PersistenceDegraded {
            key: key.to_string(),
            operation: operation.to_string(),
            message: message.into(),
            at: Utc::now(),
        };
        log::warn!("{} service: {}", self.name, warning);
        let mut state = self.state.write();
        if state.warnings.len() == MAX_WARNINGS {
            state.warnings.remove(0);
        }
        state.warnings.push(warning);
    }

    pub fn warnings(&self) -> Vec<StoreWarning> {
        self.state.read().warnings.clone()
    }

    /// Healthy once initialized; warnings are carried but do not affect health.
    pub fn status(&self) -> ServiceStatus {
        let state = self.state.read();
        let warnings = state.warnings.iter().map(|w| w.to_string()).collect();
        if state.initialized {
            ServiceStatus {
                healthy: true,
                last_update: state.last_update,
                error_count: state.error_count,
                response_time_ms: None,
                warnings,
                error: state.last_error.clone(),
            }
        } else {
            ServiceStatus {
                healthy: false,
                last_update: state.last_update,
                error_count: state.error_count,
                response_time_ms: None,
                warnings,
                error: Some(format!("{} service is not initialized", self.name)),
            }
        }
    }
}
