//! Property domain model.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use super::validation::{require_external_id, ModelValidationError};

/// Stable internal identifier of a property.
pub type PropertyId = Uuid;

/// A managed site, identified across systems by `external_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub uuid: PropertyId,
    /// Identifier used by third-party backends; unique across the system.
    pub external_id: String,
}

impl Property {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            external_id: external_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_external_id("property.external_id", &self.external_id)
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Property {}", self.external_id)
    }
}
