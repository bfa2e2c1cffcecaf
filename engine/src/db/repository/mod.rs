//! Persistence port.
//!
//! The engine treats persistence as an opaque key-value store of serialized
//! snapshots. Stores own the (de)serialization; implementations only move
//! strings.

use async_trait::async_trait;

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Key-value snapshot storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared between stores.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// - `Ok(true)` if the backing store is usable
    /// - `Err(RepositoryError)` if it is not
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Serialized value under `key`, `None` when absent.
    async fn read(&self, key: &str) -> RepositoryResult<Option<String>>;

    /// Replace the value under `key`.
    async fn write(&self, key: &str, serialized: &str) -> RepositoryResult<()>;

    /// Remove `key`; removing an absent key is not an error.
    async fn remove(&self, key: &str) -> RepositoryResult<()>;

    /// All keys currently stored, sorted.
    async fn keys(&self) -> RepositoryResult<Vec<String>>;
}
