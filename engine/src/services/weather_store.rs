//! Weather report cache keyed by airport identifier.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::entity_store::EntityStore;
use super::service::{Service, ServiceError, ServiceResult};
use crate::db::SnapshotRepository;
use crate::models::{ServiceStatus, WeatherReport};
use crate::providers::WeatherProvider;

pub const WEATHER_KEY: &str = "flight-plan-weather";

/// Upper-cased, trimmed, de-duplicated identifiers; empty ones dropped.
pub(crate) fn normalize_airports(airports: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(airports.len());
    for airport in airports {
        let id = airport.trim().to_uppercase();
        if !id.is_empty() && !normalized.contains(&id) {
            normalized.push(id);
        }
    }
    normalized
}

pub struct WeatherStore {
    store: EntityStore<WeatherReport>,
    provider: Arc<dyn WeatherProvider>,
    stale_after: Duration,
}

impl WeatherStore {
    pub fn new(
        repository: Arc<dyn SnapshotRepository>,
        provider: Arc<dyn WeatherProvider>,
        stale_after: Duration,
    ) -> Self {
        Self {
            store: EntityStore::new("weather", WEATHER_KEY, repository),
            provider,
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn load_all(&self) -> ServiceResult<Vec<WeatherReport>> {
        self.store.load_all()
    }

    pub fn get(&self, airport: &str) -> ServiceResult<Option<WeatherReport>> {
        self.store.get(&airport.trim().to_uppercase())
    }

    /// Upsert a report under its upper-cased airport.
    pub fn save(&self, mut report: WeatherReport) -> ServiceResult<WeatherReport> {
        report.airport = report.airport.trim().to_uppercase();
        if report.airport.is_empty() {
            return Err(ServiceError::validation("airport", "must not be empty"));
        }
        self.store.upsert(report)
    }

    pub fn delete(&self, airport: &str) -> ServiceResult<()> {
        self.store.remove(&airport.trim().to_uppercase())?;
        Ok(())
    }

    /// Fetch current reports for `airports` and cache them. Airports the
    /// provider has no report for are left untouched.
    pub async fn load(&self, airports: &[String]) -> ServiceResult<Vec<WeatherReport>> {
        self.store.lifecycle().ensure_initialized()?;
        let airports = normalize_airports(airports);
        if airports.is_empty() {
            return Ok(Vec::new());
        }

        let reports = match self.provider.fetch_current(&airports).await {
            Ok(reports) => reports,
            Err(e) => {
                self.store.lifecycle().record_error(e.to_string());
                return Err(e.into());
            }
        };
        self.store.lifecycle().clear_error();

        let now = Utc::now();
        let mut stored = Vec::with_capacity(reports.len());
        for mut report in reports {
            report.last_update = now;
            stored.push(self.save(report)?);
        }
        log::debug!("Loaded weather for {}/{} airports", stored.len(), airports.len());
        Ok(stored)
    }

    /// Re-fetch every cached airport.
    pub async fn refresh(&self) -> ServiceResult<Vec<WeatherReport>> {
        let airports = self.store.keys()?;
        self.load(&airports).await
    }

    /// Re-fetch only the cached airports that are stale at `now`.
    pub async fn refresh_stale(&self, now: DateTime<Utc>) -> ServiceResult<Vec<WeatherReport>> {
        let stale: Vec<String> = self
            .store
            .load_all()?
            .into_iter()
            .filter(|r| now - r.last_update > self.stale_after)
            .map(|r| r.airport)
            .collect();
        self.load(&stale).await
    }

    /// True when no report is cached or the cached one is older than the
    /// refresh threshold.
    pub fn is_stale(&self, airport: &str, now: DateTime<Utc>) -> ServiceResult<bool> {
        Ok(match self.get(airport)? {
            Some(report) => now - report.last_update > self.stale_after,
            None => true,
        })
    }

    pub fn clear(&self) -> ServiceResult<()> {
        self.store.lifecycle().clear_error();
        self.store.clear()
    }

    pub fn last_error(&self) -> Option<String> {
        self.store.lifecycle().last_error()
    }

    pub async fn flush(&self) -> bool {
        self.store.flush().await
    }
}

#[async_trait]
impl Service for WeatherStore {
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
