//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for properties,
//!   residents and staged backend rows.
//! - Isolate SQLite query details from importer/reconciler orchestration.
//!
//! # Invariants
//! - Write paths call the model `validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`PropertyNotFound`,
//!   `DuplicateStagedRecord`, ...) in addition to DB transport errors.
//! - Repositories never open a transaction on behalf of the caller unless the
//!   operation documents it; the reconciler owns per-property transactions.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::property::PropertyId;
use crate::model::resident::ResidentId;
use crate::model::validation::ModelValidationError;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod property_repo;
pub mod resident_repo;
pub mod staging_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all stores.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    PropertyNotFound(String),
    ResidentNotFound(ResidentId),
    DuplicateProperty(String),
    DuplicateResident {
        property_uuid: PropertyId,
        external_id: String,
    },
    /// Second row for the same `(property, resident, date)` triple.
    DuplicateStagedRecord {
        property_external_id: String,
        resident_external_id: String,
        observed_on: NaiveDate,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::PropertyNotFound(external_id) => {
                write!(f, "property not found: {external_id}")
            }
            Self::ResidentNotFound(id) => write!(f, "resident not found: {id}"),
            Self::DuplicateProperty(external_id) => {
                write!(f, "property already exists: {external_id}")
            }
            Self::DuplicateResident {
                property_uuid,
                external_id,
            } => write!(
                f,
                "resident `{external_id}` already exists in property {property_uuid}"
            ),
            Self::DuplicateStagedRecord {
                property_external_id,
                resident_external_id,
                observed_on,
            } => write!(
                f,
                "staged record already imported: property={property_external_id} resident={resident_external_id} date={observed_on}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Rejects connections that did not go through `open_db*`.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// `?, ?, ?` with `count` placeholders.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
