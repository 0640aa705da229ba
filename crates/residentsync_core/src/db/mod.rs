//! Resident store bootstrap: connection setup, migrations, schema checks.
//!
//! # Responsibility
//! - Hand out connections whose schema holds properties, residents and the
//!   staging table at the version this binary understands.
//! - Refuse databases missing the uniqueness keys reconciliation relies on.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - After `open_db*` returns, `(property_uuid, external_id)` on residents and
//!   `(property_external_id, resident_external_id, observed_on)` on staging
//!   are backed by unique indexes.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{unique_keys, REQUIRED_UNIQUE_KEYS};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer residentsync.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Migration `version` (`name`) failed to apply; nothing was committed.
    MigrationFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// A table lost one of the unique keys reconciliation depends on.
    MissingUniqueKey {
        table: &'static str,
        columns: &'static [&'static str],
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "resident store schema v{db_version} is newer than this binary (v{latest_supported})"
            ),
            Self::MigrationFailed {
                version,
                name,
                source,
            } => write!(f, "migration {version:04}_{name} failed: {source}"),
            Self::MissingUniqueKey { table, columns } => write!(
                f,
                "table `{table}` has no unique key on ({})",
                columns.join(", ")
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MigrationFailed { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::MissingUniqueKey { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
