//! TOML configuration for sync runs.
//!
//! ```toml
//! database_path = "/var/lib/residentsync/residents.sqlite3"
//!
//! [logging]
//! level = "info"
//! dir = "/var/log/residentsync"
//!
//! [staging]
//! retention_days = 30
//!
//! [[providers.static]]
//! id = "demo"
//! property_external_id = "test"
//! residents = [{ external_id = "test_res_1", email = "test@asdf.com" }]
//!
//! [[providers.snapshot]]
//! id = "nightly_export"
//! path = "/srv/exports/residents.json"
//! ```

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub database_path: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Falls back to `default_log_level()` when unset.
    pub level: Option<String>,
    /// Logging stays disabled when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingConfig {
    /// Staged rows older than this many days are purged after a sync.
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default, rename = "static")]
    pub static_providers: Vec<StaticProviderConfig>,
    #[serde(default)]
    pub snapshot: Vec<SnapshotProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticProviderConfig {
    pub id: String,
    pub property_external_id: String,
    #[serde(default)]
    pub residents: Vec<StaticResidentConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticResidentConfig {
    pub external_id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotProviderConfig {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

/// Reads and parses a config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::{load_config, AppConfig, ConfigError};
    use std::path::PathBuf;

    #[test]
    fn parses_full_config() {
        let config = AppConfig::from_toml_str(
            r#"
            database_path = "/tmp/residents.sqlite3"

            [logging]
            level = "debug"
            dir = "/tmp/residentsync-logs"

            [staging]
            retention_days = 14

            [[providers.static]]
            id = "demo"
            property_external_id = "test"
            residents = [
                { external_id = "test_res_1", email = "test@asdf.com" },
                { external_id = "test_res_2", email = "test@asdf.com" },
            ]

            [[providers.snapshot]]
            id = "nightly_export"
            path = "/srv/exports/residents.json"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.database_path, PathBuf::from("/tmp/residents.sqlite3"));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.staging.retention_days, Some(14));
        assert_eq!(config.providers.static_providers.len(), 1);
        assert_eq!(config.providers.static_providers[0].residents.len(), 2);
        assert_eq!(config.providers.snapshot[0].id, "nightly_export");
    }

    #[test]
    fn optional_sections_default_to_empty() {
        let config = AppConfig::from_toml_str(r#"database_path = "residents.sqlite3""#)
            .expect("minimal config should parse");
        assert!(config.logging.dir.is_none());
        assert!(config.staging.retention_days.is_none());
        assert!(config.providers.static_providers.is_empty());
        assert!(config.providers.snapshot.is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = AppConfig::from_toml_str(
            r#"
            database_path = "residents.sqlite3"
            databse_url = "typo"
            "#,
        )
        .expect_err("unknown key must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_config(dir.path().join("absent.toml")).expect_err("missing file");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
