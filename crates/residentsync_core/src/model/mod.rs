//! Domain model for properties, residents and staged backend snapshots.
//!
//! # Responsibility
//! - Define canonical data structures used by the import and sync pipeline.
//! - Keep field-level validation next to the types it protects.
//!
//! # Invariants
//! - `(property, external_id)` identifies one resident.
//! - Residents leave the visible set through `is_active = false`, never hard delete.

pub mod property;
pub mod resident;
pub mod staged_record;
pub mod validation;
