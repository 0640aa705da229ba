//! Provider SPI for external resident sources.
//!
//! # Invariants
//! - `fetch` returns a finite, fully materialized batch.
//! - Providers only read from their source; they never touch the stores.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// One normalized row reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub property_external_id: String,
    pub resident_external_id: String,
    pub date: NaiveDate,
    pub email: String,
}

/// Provider fetch failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The external source could not be reached or read.
    SourceUnavailable { provider_id: String, message: String },
    /// The source answered but the payload could not be decoded.
    InvalidPayload { provider_id: String, message: String },
}

impl ProviderError {
    pub fn source_unavailable(provider_id: &str, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            provider_id: provider_id.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_payload(provider_id: &str, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            provider_id: provider_id.to_string(),
            message: message.into(),
        }
    }

    pub fn provider_id(&self) -> &str {
        match self {
            Self::SourceUnavailable { provider_id, .. } => provider_id,
            Self::InvalidPayload { provider_id, .. } => provider_id,
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceUnavailable {
                provider_id,
                message,
            } => write!(f, "provider `{provider_id}` source unavailable: {message}"),
            Self::InvalidPayload {
                provider_id,
                message,
            } => write!(f, "provider `{provider_id}` returned invalid payload: {message}"),
        }
    }
}

impl Error for ProviderError {}

/// A pluggable source of resident snapshots.
pub trait ResidentProvider: Send + Sync {
    /// Stable registry id (`[a-z0-9_-]+`).
    fn provider_id(&self) -> &str;

    /// Reads the current snapshot from the external source.
    fn fetch(&self) -> ProviderResult<Vec<ProviderRecord>>;
}
