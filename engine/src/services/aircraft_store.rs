//! Aircraft store: saved aircraft profiles and loading computations.

use async_trait::async_trait;
use std::sync::Arc;

use super::defaults;
use super::entity_store::{copy_of, EntityStore};
use super::service::{Service, ServiceError, ServiceResult};
use crate::algorithms::performance::PerformanceCalculator;
use crate::algorithms::weight_balance::{compute_landing_loading, compute_loading, validate_weight_balance};
use crate::db::SnapshotRepository;
use crate::models::{
    AircraftId, AircraftPatch, AircraftProfile, FuelQuantity, LoadingData, ServiceStatus,
    StationLoad,
};

pub const AIRCRAFT_KEY: &str = "flight-plan-aircraft";

pub struct AircraftStore {
    store: EntityStore<AircraftProfile>,
}

/// The built-in profile, with id and timestamps assigned.
fn seed() -> Vec<AircraftProfile> {
    let mut profile = defaults::cessna_172s();
    let now = chrono::Utc::now();
    profile.id = Some(AircraftId::generate());
    profile.created = Some(now);
    profile.modified = Some(now);
    vec![profile]
}

impl AircraftStore {
    pub fn new(repository: Arc<dyn SnapshotRepository>) -> Self {
        Self {
            store: EntityStore::new("aircraft", AIRCRAFT_KEY, repository),
        }
    }

    pub fn warnings(&self) -> Vec<super::StoreWarning> {
        self.store.lifecycle().warnings()
    }

    pub fn load_all(&self) -> ServiceResult<Vec<AircraftProfile>> {
        self.store.load_all()
    }

    pub fn get(&self, id: &AircraftId) -> ServiceResult<AircraftProfile> {
        self.store
            .get(id.as_str())?
            .ok_or_else(|| ServiceError::not_found("aircraft", id))
    }

    /// Validate the weight and balance block and upsert. A profile saved as
    /// default clears the flag on every other profile.
    pub fn save(&self, profile: AircraftProfile) -> ServiceResult<AircraftProfile> {
        self.store.lifecycle().ensure_initialized()?;
        if profile.name.trim().is_empty() {
            return Err(ServiceError::validation("name", "must not be empty"));
        }
        validate_weight_balance(&profile.weight_balance)?;

        let saved = self.store.save(profile)?;
        if saved.is_default {
            let keep = saved.id.clone();
            self.store.modify(|profiles| {
                for p in profiles.iter_mut() {
                    if p.id != keep {
                        p.is_default = false;
                    }
                }
            })?;
        }
        log::debug!("Saved aircraft '{}'", saved.name);
        Ok(saved)
    }

    pub fn delete(&self, id: &AircraftId) -> ServiceResult<()> {
        self.store.remove(id.as_str())?;
        Ok(())
    }

    pub fn duplicate(&self, profile: &AircraftProfile) -> ServiceResult<AircraftProfile> {
        self.save(copy_of(profile))
    }

    pub fn update(&self, id: &AircraftId, patch: &AircraftPatch) -> ServiceResult<AircraftProfile> {
        let profile = self.get(id)?;
        self.save(patch.apply_to(&profile))
    }

    pub fn set_default(&self, id: &AircraftId) -> ServiceResult<AircraftProfile> {
        let mut profile = self.get(id)?;
        profile.is_default = true;
        self.save(profile)
    }

    /// The profile flagged default, else the first stored one.
    pub fn default_profile(&self) -> ServiceResult<Option<AircraftProfile>> {
        let profiles = self.store.load_all()?;
        let fallback = profiles.first().cloned();
        Ok(profiles.into_iter().find(|p| p.is_default).or(fallback))
    }

    pub fn compute_loading(
        &self,
        id: &AircraftId,
        stations: &[StationLoad],
        fuel: FuelQuantity,
    ) -> ServiceResult<LoadingData> {
        let profile = self.get(id)?;
        Ok(compute_loading(&profile, stations, fuel)?)
    }

    pub fn compute_landing_loading(
        &self,
        id: &AircraftId,
        stations: &[StationLoad],
        fuel: FuelQuantity,
        burn: FuelQuantity,
    ) -> ServiceResult<LoadingData> {
        let profile = self.get(id)?;
        Ok(compute_landing_loading(&profile, stations, fuel, burn)?)
    }

    /// Run `f` against the stored profile's performance tables.
    pub fn with_performance<R>(
        &self,
        id: &AircraftId,
        f: impl FnOnce(&PerformanceCalculator<'_>) -> crate::algorithms::ComputationResult<R>,
    ) -> ServiceResult<R> {
        let profile = self.get(id)?;
        let calculator = PerformanceCalculator::new(&profile);
        Ok(f(&calculator)?)
    }

    pub async fn flush(&self) -> bool {
        self.store.flush().await
    }
}

#[async_trait]
impl Service for AircraftStore {
    async fn initialize(&self) -> ServiceResult<()> {
        self.store.restore(seed).await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::ComputationError;
    use crate::db::LocalRepository;
    use crate::models::CgStatus;

    async fn ready(repo: &LocalRepository) -> AircraftStore {
        let store = AircraftStore::new(Arc::new(repo.clone()));
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_seeds_default_profile() {
        let store = ready(&LocalRepository::new()).await;
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        let default = store.default_profile().unwrap().unwrap();
        assert_eq!(default.model, "172S");
        assert!(default.id.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_data_reseeds() {
        let repo = LocalRepository::new();
        repo.insert_raw(AIRCRAFT_KEY, "garbage");
        let store = ready(&repo).await;
        assert_eq!(store.load_all().unwrap().len(), 1);
        assert_eq!(store.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_single_default() {
        let store = ready(&LocalRepository::new()).await;
        let seeded = store.default_profile().unwrap().unwrap();
        let copy = store.duplicate(&seeded).unwrap();
        assert!(!copy.is_default);
        assert_eq!(copy.name, "Cessna 172S Skyhawk (Copy)");

        store.set_default(copy.id.as_ref().unwrap()).unwrap();
        let defaults: Vec<_> = store
            .load_all()
            .unwrap()
            .into_iter()
            .filter(|p| p.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, copy.id);
    }

    #[tokio::test]
    async fn test_invalid_envelope_rejected() {
        let store = ready(&LocalRepository::new()).await;
        let mut profile = defaults::cessna_172s();
        profile.weight_balance.cg_limits.points.reverse();
        assert!(matches!(
            store.save(profile),
            Err(ServiceError::Computation(ComputationError::Validation { .. }))
        ));
    }

    #[tokio::test]
    async fn test_loading_through_store() {
        let store = ready(&LocalRepository::new()).await;
        let id = store.default_profile().unwrap().unwrap().id.unwrap();
        let loading = store
            .compute_loading(
                &id,
                &[StationLoad::new("front-seats", 380.0), StationLoad::new("rear-seats", 300.0)],
                FuelQuantity::gallons(53.0),
            )
            .unwrap();
        // 1663 + 680 + 318
        assert!((loading.total_weight - 2661.0).abs() < 1e-9);
        assert_eq!(loading.cg_status, CgStatus::OverWeight);

        let cruise = store
            .with_performance(&id, |calc| calc.cruise_figures(8000.0))
            .unwrap();
        assert_eq!(cruise.speed, 120.0);
    }
}
