//! Repository factory for dependency injection.
//!
//! Creates repository instances from runtime configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::PersistenceSettings;
use super::repositories::{FileRepository, LocalRepository};
use super::repository::{RepositoryError, RepositoryResult, SnapshotRepository};

/// Environment variable selecting the repository type.
pub const REPOSITORY_ENV: &str = "FLIGHTPLAN_REPOSITORY";
/// Environment variable overriding the file repository directory.
pub const DATA_DIR_ENV: &str = "FLIGHTPLAN_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
    /// JSON files under a data directory
    File,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts `"local"`, `"memory"`, `"file"` or `"fs"`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "file" | "fs" => Ok(Self::File),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Read `FLIGHTPLAN_REPOSITORY`. Defaults to Local when unset or invalid.
    pub fn from_env() -> Self {
        std::env::var(REPOSITORY_ENV)
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```
/// use flightplan_engine::db::{RepositoryFactory, RepositoryType};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let repo = rt
///     .block_on(RepositoryFactory::create(RepositoryType::Local, None))
///     .unwrap();
/// assert!(rt.block_on(repo.health_check()).unwrap());
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// The file repository requires a directory and fails its health check
    /// when the directory cannot be created.
    pub async fn create(
        repo_type: RepositoryType,
        directory: Option<PathBuf>,
    ) -> RepositoryResult<Arc<dyn SnapshotRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::File => {
                let directory = directory.ok_or_else(|| {
                    RepositoryError::configuration("File repository requires a data directory")
                })?;
                let repo = Self::create_file(directory);
                repo.health_check().await?;
                Ok(repo)
            }
        }
    }

    pub fn create_local() -> Arc<dyn SnapshotRepository> {
        Arc::new(LocalRepository::new())
    }

    pub fn create_file(directory: impl Into<PathBuf>) -> Arc<dyn SnapshotRepository> {
        Arc::new(FileRepository::new(directory))
    }

    /// Create a repository from the `[persistence]` settings, with
    /// `FLIGHTPLAN_REPOSITORY` and `FLIGHTPLAN_DATA_DIR` taking precedence.
    pub async fn from_settings(
        settings: &PersistenceSettings,
    ) -> RepositoryResult<Arc<dyn SnapshotRepository>> {
        let repo_type = match std::env::var(REPOSITORY_ENV) {
            Ok(val) => val.parse().map_err(RepositoryError::configuration)?,
            Err(_) => settings.repository_type()?,
        };
        let directory = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| settings.directory.clone());

        log::info!("Using {:?} snapshot repository", repo_type);
        Self::create(repo_type, Some(directory)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_parsing() {
        assert_eq!("local".parse::<RepositoryType>(), Ok(RepositoryType::Local));
        assert_eq!("FILE".parse::<RepositoryType>(), Ok(RepositoryType::File));
        assert_eq!(" fs ".parse::<RepositoryType>(), Ok(RepositoryType::File));
        assert!("postgres".parse::<RepositoryType>().is_err());
    }

    #[tokio::test]
    async fn test_file_repository_requires_directory() {
        let err = RepositoryFactory::create(RepositoryType::File, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    }

    #[tokio::test]
    async fn test_create_file_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = RepositoryFactory::create(RepositoryType::File, Some(dir.path().join("d")))
            .await
            .unwrap();
        repo.write("k", "v").await.unwrap();
        assert_eq!(repo.read("k").await.unwrap().as_deref(), Some("v"));
    }
}
