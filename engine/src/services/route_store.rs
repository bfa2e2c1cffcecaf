//! Route store: the authoritative collection of saved routes.
//!
//! Every save recomputes legs and totals, so stored routes never carry stale
//! geometry. At most one route is active.

use async_trait::async_trait;
use std::sync::Arc;

use super::entity_store::{copy_of, EntityStore};
use super::service::{Service, ServiceError, ServiceResult};
use crate::algorithms::RouteCalculator;
use crate::codecs::{CodecRegistry, RouteFormat};
use crate::db::SnapshotRepository;
use crate::models::{NavigationLog, Route, RouteEdit, RouteId, RoutePatch, ServiceStatus};

pub const ROUTES_KEY: &str = "flight-plan-routes";

pub struct RouteStore {
    store: EntityStore<Route>,
    calculator: RouteCalculator,
    codecs: CodecRegistry,
}

impl RouteStore {
    pub fn new(
        repository: Arc<dyn SnapshotRepository>,
        calculator: RouteCalculator,
        codecs: CodecRegistry,
    ) -> Self {
        Self {
            store: EntityStore::new("route", ROUTES_KEY, repository),
            calculator,
            codecs,
        }
    }

    pub fn calculator(&self) -> &RouteCalculator {
        &self.calculator
    }

    pub fn warnings(&self) -> Vec<super::StoreWarning> {
        self.store.lifecycle().warnings()
    }

    pub fn load_all(&self) -> ServiceResult<Vec<Route>> {
        self.store.load_all()
    }

    pub fn get(&self, id: &RouteId) -> ServiceResult<Route> {
        self.store
            .get(id.as_str())?
            .ok_or_else(|| ServiceError::not_found("route", id))
    }

    /// Validate, recompute and upsert. A route saved as active deactivates
    /// every other route.
    pub fn save(&self, route: Route) -> ServiceResult<Route> {
        self.store.lifecycle().ensure_initialized()?;
        let computed = self.calculator.recompute(&route)?;
        let saved = self.store.save(computed)?;
        if saved.is_active {
            self.deactivate_others(saved.id.as_ref())?;
        }
        log::debug!(
            "Saved route '{}' ({} waypoints)",
            saved.name,
            saved.waypoints.len()
        );
        Ok(saved)
    }

    pub fn delete(&self, id: &RouteId) -> ServiceResult<()> {
        if self.store.remove(id.as_str())? {
            log::debug!("Deleted route {}", id);
        }
        Ok(())
    }

    pub fn duplicate(&self, route: &Route) -> ServiceResult<Route> {
        self.save(copy_of(route))
    }

    fn deactivate_others(&self, keep: Option<&RouteId>) -> ServiceResult<()> {
        self.store.modify(|routes| {
            for route in routes.iter_mut() {
                if route.id.as_ref() != keep {
                    route.is_active = false;
                }
            }
        })
    }

    /// Make `id` the only active route.
    pub fn set_active(&self, id: &RouteId) -> ServiceResult<Route> {
        let mut route = self.get(id)?;
        route.is_active = true;
        self.deactivate_others(Some(id))?;
        self.store.upsert(route)
    }

    pub fn active(&self) -> ServiceResult<Option<Route>> {
        Ok(self.store.load_all()?.into_iter().find(|r| r.is_active))
    }

    /// Apply a structural edit to a stored route and save the result.
    pub fn edit(&self, id: &RouteId, edit: &RouteEdit) -> ServiceResult<Route> {
        let route = self.get(id)?;
        let edited = self.calculator.apply_edit(&route, edit)?;
        self.save(edited)
    }

    pub fn update(&self, id: &RouteId, patch: &RoutePatch) -> ServiceResult<Route> {
        let route = self.get(id)?;
        self.save(patch.apply_to(&route))
    }

    pub fn navigation_log(&self, id: &RouteId, usable_fuel: f64) -> ServiceResult<NavigationLog> {
        let route = self.get(id)?;
        Ok(self.calculator.build_navigation_log(&route, usable_fuel)?)
    }

    /// Decode `raw` and save it as a new route.
    pub fn import(&self, raw: &str, format: RouteFormat) -> ServiceResult<Route> {
        self.store.lifecycle().ensure_initialized()?;
        let mut route = self.codecs.decode(raw, format)?;
        route.id = None;
        route.is_active = false;
        let saved = self.save(route)?;
        log::info!(
            "Imported route '{}' from {} ({} waypoints)",
            saved.name,
            format,
            saved.waypoints.len()
        );
        Ok(saved)
    }

    pub fn export(&self, id: &RouteId, format: RouteFormat) -> ServiceResult<String> {
        let route = self.get(id)?;
        Ok(self.codecs.encode(&route, format)?)
    }

    /// Write the collection now instead of waiting for cleanup.
    pub async fn flush(&self) -> bool {
        self.store.flush().await
    }
}

#[async_trait]
impl Service for RouteStore {
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
