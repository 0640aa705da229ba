//! Resident reconciliation core.
//!
//! Pulls resident snapshots from pluggable backend providers into a staging
//! table, then reconciles each property's residents against today's snapshot.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{load_config, AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::property::{Property, PropertyId};
pub use model::resident::{Resident, ResidentId};
pub use model::staged_record::StagedRecord;
pub use model::validation::ModelValidationError;
pub use repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
pub use repo::resident_repo::{ResidentRepository, SqliteResidentRepository};
pub use repo::staging_repo::{SqliteStagingRepository, StagingRepository};
pub use repo::{RepoError, RepoResult};
pub use service::notifier::{LogNotifier, NotificationError, Notifier};
pub use service::reconcile_service::{
    apply_plan, plan_property, PropertyChanges, PropertyOutcome, PropertyPlan, Reconciler,
    SyncReport,
};
pub use service::staging_service::{
    CollectReport, ProviderImportStats, ProviderOutcome, StagingImporter,
};
pub use sync::builtin::{register_builtin_providers, SnapshotFileProvider, StaticProvider};
pub use sync::error::{SyncError, SyncResult};
pub use sync::provider::{ProviderError, ProviderRecord, ProviderResult, ResidentProvider};
pub use sync::provider_registry::{
    ProviderEntry, ProviderFactory, ProviderRef, ProviderRegistry, ProviderRegistryError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
