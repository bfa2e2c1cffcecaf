//! File-backed snapshot repository.
//!
//! Each key maps to `<directory>/<key>.json`. Writes go to a temporary file
//! first and are renamed into place, so a crash mid-write leaves the previous
//! snapshot intact.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, SnapshotRepository};

const EXTENSION: &str = "json";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct FileRepository {
    directory: PathBuf,
}

impl FileRepository {
    /// Create a repository rooted at `directory`. The directory is created
    /// lazily on first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path for `key`. Characters outside `[A-Za-z0-9_-]` are replaced with
    /// `_` so keys cannot escape the directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{}", sanitize_key(key), EXTENSION))
    }

    fn io_error(operation: &str, key: Option<&str>, err: std::io::Error) -> RepositoryError {
        let mut context = ErrorContext::new(operation).with_entity("snapshot file");
        if let Some(key) = key {
            context = context.with_key(key);
        }
        if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) {
            context = context.retryable();
        }
        RepositoryError::io(err.to_string(), context)
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl SnapshotRepository for FileRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| Self::io_error("health_check", None, e))?;
        let metadata = tokio::fs::metadata(&self.directory)
            .await
            .map_err(|e| Self::io_error("health_check", None, e))?;
        if metadata.permissions().readonly() {
            return Err(RepositoryError::connection(
                format!("Data directory {} is read-only", self.directory.display()),
                ErrorContext::new("health_check").with_entity("snapshot file"),
            ));
        }
        Ok(true)
    }

    async fn read(&self, key: &str) -> RepositoryResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error("read", Some(key), e)),
        }
    }

    async fn write(&self, key: &str, serialized: &str) -> RepositoryResult<()> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| Self::io_error("write", Some(key), e))?;

        let target = self.path_for(key);
        let mut tmp = target.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, serialized)
            .await
            .map_err(|e| Self::io_error("write", Some(key), e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::io_error("write", Some(key), e));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> RepositoryResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("remove", Some(key), e)),
        }
    }

    async fn keys(&self) -> RepositoryResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error("keys", None, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error("keys", None, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
