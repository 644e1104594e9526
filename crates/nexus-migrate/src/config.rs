//! Configuration types for nexus-migrate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Legacy database to migrate from.
    pub source: SourceConfig,
    /// Key-value store to migrate into.
    pub destination: DestinationConfig,
    /// Migration options.
    #[serde(default)]
    pub options: MigrationOptions,
}

/// Legacy database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database engine of the origin file.
    #[serde(default, rename = "type")]
    pub kind: SourceKind,
    /// Path to the origin database file.
    pub path: PathBuf,
}

/// Supported origin database engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Single-file SQLite database.
    #[default]
    Sqlite,
}

/// Destination store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Store engine.
    #[serde(default, rename = "type")]
    pub backend: DestinationKind,
    /// Path of the store to create.
    pub path: PathBuf,
}

/// Supported destination stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    /// Single-file B-tree store with one table per namespace (default).
    #[default]
    Bbolt,
    /// Log-structured store with key-prefix namespaces.
    Badger,
}

impl DestinationKind {
    /// Name used on the command line and in config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bbolt => "bbolt",
            Self::Badger => "badger",
        }
    }
}

impl std::fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Where the origin file is moved before it is read.
    #[serde(default = "default_scratch_path")]
    pub scratch_path: PathBuf,
    /// How long to wait for the destination store's file lock.
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,
    /// Hide the progress spinner.
    #[serde(default)]
    pub quiet: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            scratch_path: default_scratch_path(),
            open_timeout_secs: default_open_timeout_secs(),
            quiet: false,
        }
    }
}

impl MigrationOptions {
    /// Destination open timeout as a [`Duration`].
    #[must_use]
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}

fn default_scratch_path() -> PathBuf {
    PathBuf::from("runtime/old_database.db")
}

fn default_open_timeout_secs() -> u64 {
    15
}

impl MigrationConfig {
    /// Creates a configuration with default options.
    #[must_use]
    pub fn new(origin: impl Into<PathBuf>, backend: DestinationKind, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: SourceConfig {
                kind: SourceKind::Sqlite,
                path: origin.into(),
            },
            destination: DestinationConfig {
                backend,
                path: dest.into(),
            },
            options: MigrationOptions::default(),
        }
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read '{}': {e}", path.display())))?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.source.path.as_os_str().is_empty() {
            return Err(Error::Config(
                "no origin database file supplied".to_string(),
            ));
        }
        if self.destination.path.as_os_str().is_empty() {
            return Err(Error::Config(
                "no destination database file supplied".to_string(),
            ));
        }
        if self.options.scratch_path.as_os_str().is_empty() {
            return Err(Error::Config("scratch path cannot be empty".to_string()));
        }
        if self.destination.path == self.source.path {
            return Err(Error::Config(
                "destination database file must differ from the origin file".to_string(),
            ));
        }
        if self.destination.path == self.options.scratch_path {
            return Err(Error::Config(
                "destination database file must differ from the scratch path".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let options = MigrationOptions::default();
        assert_eq!(options.scratch_path, PathBuf::from("runtime/old_database.db"));
        assert_eq!(options.open_timeout(), Duration::from_secs(15));
        assert!(!options.quiet);
        assert_eq!(DestinationKind::default(), DestinationKind::Bbolt);
    }

    #[test]
    fn test_config_validate_empty_paths() {
        let config = MigrationConfig::new("", DestinationKind::Bbolt, "nexus.db");
        assert!(config.validate().is_err());

        let config = MigrationConfig::new("old.db", DestinationKind::Bbolt, "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_same_paths() {
        let config = MigrationConfig::new("old.db", DestinationKind::Badger, "old.db");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("differ"));

        let mut config = MigrationConfig::new("old.db", DestinationKind::Badger, "scratch.db");
        config.options.scratch_path = PathBuf::from("scratch.db");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_ok() {
        let config = MigrationConfig::new("old.db", DestinationKind::Bbolt, "nexus.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r#"
source:
  path: ./runtime/database.db
destination:
  type: badger
  path: ./runtime/nexus
options:
  open_timeout_secs: 5
"#;
        let config: MigrationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source.kind, SourceKind::Sqlite);
        assert_eq!(config.destination.backend, DestinationKind::Badger);
        assert_eq!(config.options.open_timeout_secs, 5);
        assert_eq!(
            config.options.scratch_path,
            PathBuf::from("runtime/old_database.db")
        );
    }

    #[test]
    fn test_config_yaml_rejects_unknown_backend() {
        let yaml = r#"
source:
  path: old.db
destination:
  type: rocksdb
  path: nexus.db
"#;
        assert!(serde_yaml::from_str::<MigrationConfig>(yaml).is_err());
    }
}
