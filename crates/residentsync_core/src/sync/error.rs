//! Failure kinds reported per provider, per property and per resident.
//!
//! None of these abort a whole `collect_data` or `sync` run; they are
//! collected into the run report next to the successful outcomes.

use crate::model::validation::ModelValidationError;
use crate::repo::RepoError;
use crate::sync::provider::ProviderError;
use crate::sync::provider_registry::ProviderRegistryError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug)]
pub enum SyncError {
    /// A provider could not fetch its data; other providers still run.
    SourceUnavailable(ProviderError),
    /// The source answered with something that could not be decoded.
    InvalidPayload(ProviderError),
    /// A decoded record failed validation; the provider's whole batch is rejected.
    InvalidRecord {
        provider_id: String,
        property_external_id: String,
        resident_external_id: String,
        reason: ModelValidationError,
    },
    /// A registry entry could not be turned into a provider.
    ProviderNotResolved(ProviderRegistryError),
    /// The provider already staged a row for this triple today.
    DuplicateStagingRecord {
        property_external_id: String,
        resident_external_id: String,
        observed_on: NaiveDate,
    },
    /// The notifier failed; the resident stays unnotified and is retried next run.
    NotificationFailed {
        property_external_id: String,
        resident_external_id: String,
        message: String,
    },
    /// Two staged rows for one resident in one property/day.
    IntegrityViolation {
        property_external_id: String,
        resident_external_id: String,
        observed_on: NaiveDate,
    },
    Repo(RepoError),
}

impl SyncError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::InvalidRecord { .. } => "invalid_record",
            Self::ProviderNotResolved(_) => "provider_not_resolved",
            Self::DuplicateStagingRecord { .. } => "duplicate_staging_record",
            Self::NotificationFailed { .. } => "notification_failed",
            Self::IntegrityViolation { .. } => "integrity_violation",
            Self::Repo(_) => "repo_error",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceUnavailable(err) => write!(f, "{err}"),
            Self::InvalidPayload(err) => write!(f, "{err}"),
            Self::InvalidRecord {
                provider_id,
                property_external_id,
                resident_external_id,
                reason,
            } => write!(
                f,
                "provider `{provider_id}` reported an invalid record (property={property_external_id} resident={resident_external_id}): {reason}"
            ),
            Self::ProviderNotResolved(err) => write!(f, "{err}"),
            Self::DuplicateStagingRecord {
                property_external_id,
                resident_external_id,
                observed_on,
            } => write!(
                f,
                "duplicate staging record: property={property_external_id} resident={resident_external_id} date={observed_on}"
            ),
            Self::NotificationFailed {
                property_external_id,
                resident_external_id,
                message,
            } => write!(
                f,
                "notification failed for resident {resident_external_id} of property {property_external_id}: {message}"
            ),
            Self::IntegrityViolation {
                property_external_id,
                resident_external_id,
                observed_on,
            } => write!(
                f,
                "resident {resident_external_id} staged more than once for property {property_external_id} on {observed_on}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SourceUnavailable(err) | Self::InvalidPayload(err) => Some(err),
            Self::InvalidRecord { reason, .. } => Some(reason),
            Self::ProviderNotResolved(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProviderError> for SyncError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::SourceUnavailable { .. } => Self::SourceUnavailable(value),
            ProviderError::InvalidPayload { .. } => Self::InvalidPayload(value),
        }
    }
}

impl From<ProviderRegistryError> for SyncError {
    fn from(value: ProviderRegistryError) -> Self {
        Self::ProviderNotResolved(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateStagedRecord {
                property_external_id,
                resident_external_id,
                observed_on,
            } => Self::DuplicateStagingRecord {
                property_external_id,
                resident_external_id,
                observed_on,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}
