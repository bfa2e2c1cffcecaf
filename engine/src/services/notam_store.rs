//! NOTAM cache grouped by airport.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::entity_store::EntityStore;
use super::service::{Service, ServiceError, ServiceResult};
use super::weather_store::normalize_airports;
use crate::db::SnapshotRepository;
use crate::models::{AirportNotams, Notam, NotamSummary, Priority, ServiceStatus};
use crate::providers::NotamProvider;

pub const NOTAMS_KEY: &str = "flight-plan-notams";

pub struct NotamStore {
    store: EntityStore<AirportNotams>,
    provider: Arc<dyn NotamProvider>,
    stale_after: Duration,
}

impl NotamStore {
    pub fn new(
        repository: Arc<dyn SnapshotRepository>,
        provider: Arc<dyn NotamProvider>,
        stale_after: Duration,
    ) -> Self {
        Self {
            store: EntityStore::new("notam", NOTAMS_KEY, repository),
            provider,
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn last_error(&self) -> Option<String> {
        self.store.lifecycle().last_error()
    }

    pub fn load_all(&self) -> ServiceResult<Vec<AirportNotams>> {
        self.store.load_all()
    }

    pub fn get(&self, airport: &str) -> ServiceResult<Option<AirportNotams>> {
        self.store.get(&airport.trim().to_uppercase())
    }

    pub fn save(&self, mut entry: AirportNotams) -> ServiceResult<AirportNotams> {
        entry.airport = entry.airport.trim().to_uppercase();
        if entry.airport.is_empty() {
            return Err(ServiceError::validation("airport", "must not be empty"));
        }
        self.store.upsert(entry)
    }

    pub fn delete(&self, airport: &str) -> ServiceResult<()> {
        self.store.remove(&airport.trim().to_uppercase())?;
        Ok(())
    }

    /// Fetch current NOTAMs for `airports` and replace each airport's entry.
    /// Requested airports with no NOTAMs are cached as empty, so they do not
    /// read as stale.
    pub async fn load(&self, airports: &[String]) -> ServiceResult<Vec<AirportNotams>> {
        self.store.lifecycle().ensure_initialized()?;
        let airports = normalize_airports(airports);
        if airports.is_empty() {
            return Ok(Vec::new());
        }

        let notams = match self.provider.fetch_current(&airports).await {
            Ok(notams) => notams,
            Err(e) => {
                self.store.lifecycle().record_error(e.to_string());
                return Err(e.into());
            }
        };
        self.store.lifecycle().clear_error();

        let mut grouped: BTreeMap<String, Vec<Notam>> =
            airports.iter().map(|a| (a.clone(), Vec::new())).collect();
        for mut notam in notams {
            notam.airport = notam.airport.trim().to_uppercase();
            grouped.entry(notam.airport.clone()).or_default().push(notam);
        }

        let now = Utc::now();
        let mut stored = Vec::with_capacity(grouped.len());
        for (airport, notams) in grouped {
            stored.push(self.save(AirportNotams {
                airport,
                notams,
                last_update: now,
            })?);
        }
        log::debug!("Loaded NOTAMs for {} airports", stored.len());
        Ok(stored)
    }

    pub async fn refresh(&self) -> ServiceResult<Vec<AirportNotams>> {
        let airports = self.store.keys()?;
        self.load(&airports).await
    }

    pub async fn refresh_stale(&self, now: DateTime<Utc>) -> ServiceResult<Vec<AirportNotams>> {
        let stale: Vec<String> = self
            .store
            .load_all()?
            .into_iter()
            .filter(|e| now - e.last_update > self.stale_after)
            .map(|e| e.airport)
            .collect();
        self.load(&stale).await
    }

    pub fn is_stale(&self, airport: &str, now: DateTime<Utc>) -> ServiceResult<bool> {
        Ok(match self.get(airport)? {
            Some(entry) => now - entry.last_update > self.stale_after,
            None => true,
        })
    }

    pub fn clear(&self) -> ServiceResult<()> {
        self.store.lifecycle().clear_error();
        self.store.clear()
    }

    /// NOTAMs for `airport` effective at `at`.
    pub fn effective(&self, airport: &str, at: DateTime<Utc>) -> ServiceResult<Vec<Notam>> {
        Ok(self
            .get(airport)?
            .map(|entry| {
                entry
                    .notams
                    .into_iter()
                    .filter(|n| n.is_effective_at(at))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn summary(&self, airport: &str, at: DateTime<Utc>) -> ServiceResult<Option<NotamSummary>> {
        Ok(self.get(airport)?.map(|entry| NotamSummary::build(&entry, at)))
    }

    /// Critical NOTAMs effective at `at`, across all cached airports.
    pub fn critical(&self, at: DateTime<Utc>) -> ServiceResult<Vec<Notam>> {
        Ok(self
            .store
            .load_all()?
            .into_iter()
            .flat_map(|entry| entry.notams)
            .filter(|n| n.is_effective_at(at) && n.classification.severity == Priority::Critical)
            .collect())
    }

    pub async fn flush(&self) -> bool {
        self.store.flush().await
    }
}

#[async_trait]
impl Service for NotamStore {
    async fn initialize(&self) -> ServiceResult<()> {
        self.store.restore(Vec::new).await;
        Ok(())
    }

    async fn cleanup(&self) -> ServiceResult<()> {
        self.store.shutdown().await;
        Ok(())
    }

    fn status(&self) -> ServiceResult<ServiceStatus> {
        Ok(self.store.lifecycle().status())
    }
}
