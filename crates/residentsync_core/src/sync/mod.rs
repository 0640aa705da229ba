//! Backend provider contracts, registry and sync error kinds.
//!
//! # Responsibility
//! - Define the single-operation provider SPI (`fetch`).
//! - Keep the catalog of known providers explicit and testable.
//! - Name the failure kinds reported by import and reconciliation runs.

pub mod builtin;
pub mod error;
pub mod provider;
pub mod provider_registry;
