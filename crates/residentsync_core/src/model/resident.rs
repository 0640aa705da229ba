//! Resident domain model.
//!
//! # Invariants
//! - `external_id` is unique only within `property_uuid`.
//! - `is_active` is the source of truth for visibility; rows are never hard-deleted.
//! - `is_notified` flips to `true` once and stays there.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::property::PropertyId;
use super::validation::{require_email, require_external_id, ModelValidationError};

/// Stable internal identifier of a resident row.
pub type ResidentId = Uuid;

/// One person tracked at one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub uuid: ResidentId,
    pub property_uuid: PropertyId,
    /// Identifier from the backend, unique throughout the property.
    pub external_id: String,
    pub email: String,
    /// Inactive residents stay queryable for audit and rollback.
    pub is_active: bool,
    /// Set once the welcome notification went out.
    pub is_notified: bool,
}

impl Resident {
    /// Creates an active, not yet notified resident.
    pub fn new(
        property_uuid: PropertyId,
        external_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            property_uuid,
            external_id: external_id.into(),
            email: email.into(),
            is_active: true,
            is_notified: false,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_external_id("resident.external_id", &self.external_id)?;
        require_email(&self.email)
    }
}
