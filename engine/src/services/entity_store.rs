//! Generic in-memory collection mirrored to a snapshot repository.
//!
//! The collection is authoritative for the session. It is restored from the
//! repository on initialize and flushed back on cleanup; repository failures
//! are recorded as [`StoreWarning`](super::StoreWarning)s and never surface as
//! errors.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::service::{Lifecycle, ServiceResult};
use crate::db::{snapshot, SnapshotRepository};
use crate::models::{AircraftId, AircraftProfile, AirportNotams, Route, RouteId, WeatherReport};

/// An entity kept in an [`EntityStore`].
pub trait StoredEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Snapshot kind recorded in the envelope.
    const KIND: &'static str;

    /// Store key, `None` until one is assigned.
    fn key(&self) -> Option<String>;
}

/// User-managed entities with generated ids, timestamps and a display name.
pub trait CatalogEntity: StoredEntity {
    fn assign_id(&mut self);

    fn stamp(&mut self, now: DateTime<Utc>);

    /// Turn a clone into a fresh copy: no id, no timestamps, "(Copy)"
    /// appended to the name and default/active flags cleared.
    fn reset_as_copy(&mut self);
}

impl StoredEntity for Route {
    const KIND: &'static str = "route";

    fn key(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.to_string())
    }
}

impl CatalogEntity for Route {
    fn assign_id(&mut self) {
        self.id = Some(RouteId::generate());
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.modified = Some(now);
        self.created.get_or_insert(now);
    }

    fn reset_as_copy(&mut self) {
        self.id = None;
        self.created = None;
        self.modified = None;
        self.is_active = false;
        self.name = format!("{} (Copy)", self.name);
    }
}

impl StoredEntity for AircraftProfile {
    const KIND: &'static str = "aircraft";

    fn key(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.to_string())
    }
}

impl CatalogEntity for AircraftProfile {
    fn assign_id(&mut self) {
        self.id = Some(AircraftId::generate());
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.modified = Some(now);
        self.created.get_or_insert(now);
    }

    fn reset_as_copy(&mut self) {
        self.id = None;
        self.created = None;
        self.modified = None;
        self.is_default = false;
        self.name = format!("{} (Copy)", self.name);
    }
}

impl StoredEntity for WeatherReport {
    const KIND: &'static str = "weather";

    fn key(&self) -> Option<String> {
        Some(self.airport.clone())
    }
}

impl StoredEntity for AirportNotams {
    const KIND: &'static str = "notams";

    fn key(&self) -> Option<String> {
        Some(self.airport.clone())
    }
}

pub struct EntityStore<T: StoredEntity> {
    key: &'static str,
    repository: Arc<dyn SnapshotRepository>,
    lifecycle: Lifecycle,
    items: RwLock<Vec<T>>,
}

impl<T: StoredEntity> EntityStore<T> {
    /// `name` identifies the service, `key` the repository entry.
    pub fn new(name: &'static str, key: &'static str, repository: Arc<dyn SnapshotRepository>) -> Self {
        Self {
            key,
            repository,
            lifecycle: Lifecycle::new(name),
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn repository_key(&self) -> &'static str {
        self.key
    }

    /// Replace the collection with the persisted snapshot and mark the store
    /// initialized. Absent or unreadable data falls back to `seed()`.
    pub async fn restore(&self, seed: impl FnOnce() -> Vec<T>) -> usize {
        let restored = match self.repository.read(self.key).await {
            Ok(Some(raw)) => match snapshot::decode::<Vec<T>>(T::KIND, &raw) {
                Ok(items) => items,
                Err(e) => {
                    self.lifecycle.degraded(self.key, "decode", e.to_string());
                    seed()
                }
            },
            Ok(None) => seed(),
            Err(e) => {
                self.lifecycle.degraded(self.key, "read", e.to_string());
                seed()
            }
        };

        let count = restored.len();
        *self.items.write() = restored;
        self.lifecycle.mark_initialized();
        log::debug!("Restored {} {} entries from '{}'", count, T::KIND, self.key);
        count
    }

    /// Write the current collection to the repository. Returns whether the
    /// write succeeded.
    pub async fn flush(&self) -> bool {
        let items = self.items.read().clone();
        let encoded = match snapshot::encode(T::KIND, &items) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.lifecycle.degraded(self.key, "encode", e.to_string());
                return false;
            }
        };
        match self.repository.write(self.key, &encoded).await {
            Ok(()) => {
                log::debug!("Flushed {} {} entries to '{}'", items.len(), T::KIND, self.key);
                true
            }
            Err(e) => {
                self.lifecycle.degraded(self.key, "write", e.to_string());
                false
            }
        }
    }

    /// Flush and mark the store stopped. The in-memory collection is kept
    /// until the next `restore`.
    pub async fn shutdown(&self) {
        if self.lifecycle.is_initialized() {
            self.flush().await;
        }
        self.lifecycle.mark_stopped();
    }

    pub fn load_all(&self) -> ServiceResult<Vec<T>> {
        self.lifecycle.ensure_initialized()?;
        Ok(self.items.read().clone())
    }

    pub fn get(&self, key: &str) -> ServiceResult<Option<T>> {
        self.lifecycle.ensure_initialized()?;
        Ok(self
            .items
            .read()
            .iter()
            .find(|item| item.key().as_deref() == Some(key))
            .cloned())
    }

    pub fn keys(&self) -> ServiceResult<Vec<String>> {
        self.lifecycle.ensure_initialized()?;
        Ok(self.items.read().iter().filter_map(|item| item.key()).collect())
    }

    /// Replace the entry with the same key, or append. Entities without a key
    /// are appended.
    pub fn upsert(&self, entity: T) -> ServiceResult<T> {
        self.lifecycle.ensure_initialized()?;
        {
            let mut items = self.items.write();
            let key = entity.key();
            match items
                .iter_mut()
                .find(|item| key.is_some() && item.key() == key)
            {
                Some(existing) => *existing = entity.clone(),
                None => items.push(entity.clone()),
            }
        }
        self.lifecycle.touch();
        Ok(entity)
    }

    /// Remove by key. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> ServiceResult<bool> {
        self.lifecycle.ensure_initialized()?;
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|item| item.key().as_deref() != Some(key));
        Ok(items.len() != before)
    }

    /// Run `f` with exclusive access to the collection.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> ServiceResult<R> {
        self.lifecycle.ensure_initialized()?;
        let result = f(&mut *self.items.write());
        self.lifecycle.touch();
        Ok(result)
    }

    pub fn clear(&self) -> ServiceResult<()> {
        self.modify(|items| items.clear())
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: CatalogEntity> EntityStore<T> {
    /// Assign an id if missing, stamp timestamps and upsert.
    pub fn save(&self, mut entity: T) -> ServiceResult<T> {
        self.lifecycle.ensure_initialized()?;
        if entity.key().map_or(true, |k| k.is_empty()) {
            entity.assign_id();
        }
        entity.stamp(Utc::now());
        self.upsert(entity)
    }
}

/// Fresh copy of `entity`, ready to be saved.
pub fn copy_of<T: CatalogEntity>(entity: &T) -> T {
    let mut copy = entity.clone();
    copy.reset_as_copy();
    copy
}
