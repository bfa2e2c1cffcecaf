//! In-memory snapshot repository.
//!
//! Data lives in a `HashMap` behind a lock and disappears with the process.
//! The health toggle lets tests simulate an unreachable backing store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, SnapshotRepository};

/// In-memory local repository.
///
/// # Example
/// ```
/// use flightplan_engine::db::repositories::LocalRepository;
/// use flightplan_engine::db::SnapshotRepository;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     repo.write("flight-plan-routes", "[]").await.unwrap();
///     assert_eq!(repo.read("flight-plan-routes").await.unwrap().as_deref(), Some("[]"));
/// });
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    entries: HashMap<String, String>,
    is_healthy: bool,
    writes: usize,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            is_healthy: true,
            writes: 0,
        }
    }
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all entries, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.entries.clear();
        data.writes = 0;
    }

    /// Store a raw value without going through the async port, e.g. to seed
    /// corrupt data in tests.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().entries.insert(key.into(), value.into());
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.data.read().entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Successful writes since creation or the last `clear`.
    pub fn write_count(&self) -> usize {
        self.data.read().writes
    }

    fn ensure_healthy(&self, operation: &str, key: Option<&str>) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            return Ok(());
        }
        let mut context = ErrorContext::new(operation);
        if let Some(key) = key {
            context = context.with_key(key);
        }
        Err(RepositoryError::connection(
            "Local repository marked unhealthy",
            context,
        ))
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.ensure_healthy("health_check", None)?;
        Ok(true)
    }

    async fn read(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.ensure_healthy("read", Some(key))?;
        Ok(self.data.read().entries.get(key).cloned())
    }

    async fn write(&self, key: &str, serialized: &str) -> RepositoryResult<()> {
        self.ensure_healthy("write", Some(key))?;
        let mut data = self.data.write();
        data.entries.insert(key.to_string(), serialized.to_string());
        data.writes += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> RepositoryResult<()> {
        self.ensure_healthy("remove", Some(key))?;
        self.data.write().entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> RepositoryResult<Vec<String>> {
        self.ensure_healthy("keys", None)?;
        let mut keys: Vec<String> = self.data.read().entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
