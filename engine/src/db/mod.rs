//! Snapshot persistence.
//!
//! Stores serialize their collections into checksummed envelopes
//! ([`snapshot`]) and hand the resulting strings to a
//! [`SnapshotRepository`]. Two implementations are provided:
//!
//! - [`LocalRepository`]: in-memory, used by tests and ephemeral sessions
//! - [`FileRepository`]: one JSON file per key

pub mod checksum;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod snapshot;

pub use checksum::calculate_checksum;
pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::PersistenceSettings;
pub use repositories::{FileRepository, LocalRepository};
pub use repository::{ErrorContext, RepositoryError, RepositoryResult, SnapshotRepository};
