//! `[persistence]` section of the engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::factory::RepositoryType;
use super::repository::RepositoryError;

/// Where and how snapshots are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceSettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
    /// Data directory for the file repository
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from("flightplan-data")
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
            directory: default_directory(),
        }
    }
}

impl PersistenceSettings {
    /// Parsed repository type.
    pub fn repository_type(&self) -> Result<RepositoryType, RepositoryError> {
        RepositoryType::from_str(&self.repo_type).map_err(RepositoryError::configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default)]
        persistence: PersistenceSettings,
    }

    #[test]
    fn test_defaults_when_section_missing() {
        let parsed: Wrapper = toml::from_str("").unwrap();
        assert_eq!(parsed.persistence, PersistenceSettings::default());
        assert_eq!(
            parsed.persistence.repository_type().unwrap(),
            RepositoryType::Local
        );
    }

    #[test]
    fn test_file_settings() {
        let parsed: Wrapper = toml::from_str(
            r#"
            [persistence]
            type = "file"
            directory = "/var/lib/flightplan"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.persistence.repository_type().unwrap(),
            RepositoryType::File
        );
        assert_eq!(
            parsed.persistence.directory,
            PathBuf::from("/var/lib/flightplan")
        );
    }

    #[test]
    fn test_unknown_type_is_configuration_error() {
        let settings = PersistenceSettings {
            repo_type: "postgres".into(),
            ..Default::default()
        };
        assert!(matches!(
            settings.repository_type(),
            Err(RepositoryError::ConfigurationError { .. })
        ));
    }
}
