//! Staged backend snapshot rows.
//!
//! # Invariants
//! - `(property_external_id, resident_external_id, observed_on)` is unique.
//! - Rows are immutable once written; a second import for the same day is a
//!   duplicate, not an update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{require_email, require_external_id, ModelValidationError};

/// What one backend reported about one resident for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedRecord {
    pub property_external_id: String,
    pub resident_external_id: String,
    pub observed_on: NaiveDate,
    pub email: String,
    /// Registry id of the provider that produced this row.
    pub provider_id: String,
}

impl StagedRecord {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_external_id("property_external_id", &self.property_external_id)?;
        require_external_id("resident_external_id", &self.resident_external_id)?;
        require_email(&self.email)
    }
}
