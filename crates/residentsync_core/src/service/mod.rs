//! Use-case services for the import and sync pipeline.
//!
//! # Responsibility
//! - Orchestrate providers and repositories into `collect_data` and `sync` runs.
//! - Turn per-provider and per-property failures into run reports instead of
//!   aborting the whole run.

pub mod notifier;
pub mod reconcile_service;
pub mod staging_service;
