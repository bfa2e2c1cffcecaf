//! Static collaborator implementations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;

use super::{
    ChartTile, ChartTileSource, MagneticVariation, NotamProvider, ProviderError, ProviderResult,
    TileKey, WeatherProvider,
};
use crate::models::{LatLng, Notam, WeatherReport};

/// Weather provider serving reports from an in-memory table.
#[derive(Clone, Default)]
pub struct StaticWeatherProvider {
    reports: Arc<RwLock<HashMap<String, WeatherReport>>>,
    offline: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
}

impl StaticWeatherProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: impl IntoIterator<Item = WeatherReport>) -> Self {
        let provider = Self::new();
        for report in reports {
            provider.set_report(report);
        }
        provider
    }

    pub fn set_report(&self, report: WeatherReport) {
        self.reports
            .write()
            .insert(report.airport.to_uppercase(), report);
    }

    /// Simulate an unreachable upstream.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of fetch calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for StaticWeatherProvider {
    async fn fetch_current(&self, airports: &[String]) -> ProviderResult<Vec<WeatherReport>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::unavailable("weather", "provider offline"));
        }
        let reports = self.reports.read();
        let now = Utc::now();
        Ok(airports
            .iter()
            .filter_map(|a| reports.get(&a.to_uppercase()))
            .cloned()
            .map(|mut r| {
                r.last_update = now;
                r
            })
            .collect())
    }
}

/// NOTAM provider serving NOTAMs from an in-memory table.
#[derive(Clone, Default)]
pub struct StaticNotamProvider {
    notams: Arc<RwLock<Vec<Notam>>>,
    offline: Arc<AtomicBool>,
    fetches: Arc<AtomicUsize>,
}

impl StaticNotamProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notams(notams: impl IntoIterator<Item = Notam>) -> Self {
        let provider = Self::new();
        provider.notams.write().extend(notams);
        provider
    }

    pub fn push(&self, notam: Notam) {
        self.notams.write().push(notam);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotamProvider for StaticNotamProvider {
    async fn fetch_current(&self, airports: &[String]) -> ProviderResult<Vec<Notam>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProviderError::unavailable("notam", "provider offline"));
        }
        let wanted: Vec<String> = airports.iter().map(|a| a.to_uppercase()).collect();
        Ok(self
            .notams
            .read()
            .iter()
            .filter(|n| wanted.contains(&n.airport.to_uppercase()))
            .cloned()
            .collect())
    }
}

/// Tile source producing empty tiles; counts loads.
#[derive(Clone, Default)]
pub struct BlankChartSource {
    loads: Arc<AtomicUsize>,
}

impl BlankChartSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChartTileSource for BlankChartSource {
    async fn load_tile(&self, key: TileKey) -> ProviderResult<ChartTile> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(ChartTile {
            key,
            bytes: Vec::new(),
            fetched: Utc::now(),
        })
    }
}

/// Same variation everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedVariation(pub f64);

impl MagneticVariation for FixedVariation {
    fn variation_at(&self, _position: LatLng, _date: NaiveDate) -> Option<f64> {
        Some(self.0)
    }
}

/// No model available; courses stay unconverted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoVariation;

impl MagneticVariation for NoVariation {
    fn variation_at(&self, _position: LatLng, _date: NaiveDate) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlightConditions;

    #[tokio::test]
    async fn test_static_weather_filters_and_stamps() {
        let provider = StaticWeatherProvider::with_reports(vec![
            WeatherReport::new("KORD", FlightConditions::Vfr),
            WeatherReport::new("KMDW", FlightConditions::Ifr),
        ]);

        let reports = provider
            .fetch_current(&["kord".to_string(), "KSFO".to_string()])
            .await
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].airport, "KORD");
        assert_eq!(provider.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_provider_errors() {
        let provider = StaticWeatherProvider::new();
        provider.set_offline(true);
        let err = provider.fetch_current(&["KORD".into()]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }

    #[test]
    fn test_variation_models() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let here = LatLng::new(41.9, -87.8);
        assert_eq!(FixedVariation(-3.5).variation_at(here, date), Some(-3.5));
        assert_eq!(NoVariation.variation_at(here, date), None);
    }
}
