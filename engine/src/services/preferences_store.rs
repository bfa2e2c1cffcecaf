//! User preferences, persisted as a single snapshot.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use super::service::{Lifecycle, Service, ServiceResult, StoreWarning};
use crate::db::{snapshot, SnapshotRepository};
use crate::models::{merge_preferences, PreferencesPatch, ServiceStatus, UserPreferences};

pub const PREFERENCES_KEY: &str = "flight-plan-storage";
const PREFERENCES_KIND: &str = "preferences";

pub struct PreferencesStore {
    repository: Arc<dyn SnapshotRepository>,
    lifecycle: Lifecycle,
    current: RwLock<UserPreferences>,
}

impl PreferencesStore {
    pub fn new(repository: Arc<dyn SnapshotRepository>) -> Self {
        Self {
            repository,
            lifecycle: Lifecycle::new("preferences"),
            current: RwLock::new(UserPreferences::default()),
        }
    }

    pub fn warnings(&self) -> Vec<StoreWarning> {
        self.lifecycle.warnings()
    }

    pub fn get(&self) -> ServiceResult<UserPreferences> {
        self.lifecycle.ensure_initialized()?;
        Ok(self.current.read().clone())
    }

    pub fn update(&self, patch: &PreferencesPatch) -> ServiceResult<UserPreferences> {
        self.lifecycle.ensure_initialized()?;
        let merged = {
            let mut current = self.current.write();
            *current = merge_preferences(&current, patch);
            current.clone()
        };
        self.lifecycle.touch();
        Ok(merged)
    }

    pub fn reset(&self) -> ServiceResult<UserPreferences> {
        self.lifecycle.ensure_initialized()?;
        *self.current.write() = UserPreferences::default();
        self.lifecycle.touch();
        Ok(UserPreferences::default())
    }

    /// Unreadable snapshots fall back to the defaults.
    async fn restore(&self) {
        let restored = match self.repository.read(PREFERENCES_KEY).await {
            Ok(Some(raw)) => snapshot::decode(PREFERENCES_KIND, &raw).unwrap_or_else(|e| {
                self.lifecycle.degraded(PREFERENCES_KEY, "decode", e.to_string());
                UserPreferences::default()
            }),
            Ok(None) => UserPreferences::default(),
            Err(e) => {
                self.lifecycle.degraded(PREFERENCES_KEY, "read", e.to_string());
                UserPreferences::default()
            }
        };
        *self.current.write() = restored;
        self.lifecycle.mark_initialized();
    }

    pub async fn flush(&self) -> bool {
        let current = self.current.read().clone();
        let result = match snapshot::encode(PREFERENCES_KIND, &current) {
            Ok(encoded) => self
                .repository
                .write(PREFERENCES_KEY, &encoded)
                .await
                .map_err(|e| ("write", e)),
            Err(e) => Err(("encode", e)),
        };
        match result {
            Ok(()) => true,
            Err((operation, e)) => {
                self.lifecycle.degraded(PREFERENCES_KEY, operation, e.to_string());
                false
            }
        }
    }
}

#[async_trait]
impl Service for PreferencesStore {
    async fn initialize(&self) -> ServiceResult<()> {
        self.restore().await;
        Ok(())
    }

    async fn cleanup(&self) -> ServiceResult<()> {
        if self.lifecycle.is_initialized() {
            self.flush().await;
        }
        self.lifecycle.mark_stopped();
        Ok(())
    }

    fn status(&self) -> ServiceResult<ServiceStatus> {
        Ok(self.lifecycle.status())
    }
}
