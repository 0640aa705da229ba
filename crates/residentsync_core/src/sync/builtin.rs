//! Built-in provider variants and config-driven registration.
//!
//! - `StaticProvider`: fixed in-memory rows (demo data, seed scripts).
//! - `SnapshotFileProvider`: JSON export dropped on disk by a
//!   property-management system, read on every `fetch`.

use crate::config::ProvidersConfig;
use crate::sync::provider::{ProviderError, ProviderRecord, ProviderResult, ResidentProvider};
use crate::sync::provider_registry::{ProviderRegistry, ProviderRegistryError};
use chrono::Local;
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider returning a fixed list of rows.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    provider_id: String,
    records: Vec<ProviderRecord>,
    stamp_today: bool,
}

impl StaticProvider {
    /// Returns `records` exactly as given.
    pub fn new(provider_id: impl Into<String>, records: Vec<ProviderRecord>) -> Self {
        Self {
            provider_id: provider_id.into(),
            records,
            stamp_today: false,
        }
    }

    /// Returns `records` with `date` replaced by the local date at fetch time.
    pub fn dated_today(provider_id: impl Into<String>, records: Vec<ProviderRecord>) -> Self {
        Self {
            stamp_today: true,
            ..Self::new(provider_id, records)
        }
    }
}

impl ResidentProvider for StaticProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn fetch(&self) -> ProviderResult<Vec<ProviderRecord>> {
        if !self.stamp_today {
            return Ok(self.records.clone());
        }

        let today = Local::now().date_naive();
        Ok(self
            .records
            .iter()
            .cloned()
            .map(|record| ProviderRecord {
                date: today,
                ..record
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotPayload {
    records: Vec<ProviderRecord>,
}

/// Provider reading a JSON snapshot file of the form `{"records": [...]}`.
#[derive(Debug, Clone)]
pub struct SnapshotFileProvider {
    provider_id: String,
    path: PathBuf,
}

impl SnapshotFileProvider {
    pub fn new(provider_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            provider_id: provider_id.into(),
            path: path.into(),
        }
    }
}

impl ResidentProvider for SnapshotFileProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn fetch(&self) -> ProviderResult<Vec<ProviderRecord>> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            ProviderError::source_unavailable(
                &self.provider_id,
                format!("cannot read `{}`: {err}", self.path.display()),
            )
        })?;
        let payload: SnapshotPayload = serde_json::from_str(&raw).map_err(|err| {
            ProviderError::invalid_payload(
                &self.provider_id,
                format!("`{}`: {err}", self.path.display()),
            )
        })?;

        debug!(
            "event=provider_fetch module=sync status=ok provider_id={} records={}",
            self.provider_id,
            payload.records.len()
        );
        Ok(payload.records)
    }
}

/// Registers every provider declared in configuration.
///
/// Static providers are registered as direct handles; snapshot providers are
/// registered by name and constructed when the importer resolves them.
pub fn register_builtin_providers(
    registry: &mut ProviderRegistry,
    config: &ProvidersConfig,
) -> Result<(), ProviderRegistryError> {
    for entry in &config.static_providers {
        let records = entry
            .residents
            .iter()
            .map(|resident| ProviderRecord {
                property_external_id: entry.property_external_id.clone(),
                resident_external_id: resident.external_id.clone(),
                date: Local::now().date_naive(),
                email: resident.email.clone(),
            })
            .collect();
        registry.register(Arc::new(StaticProvider::dated_today(
            entry.id.as_str(),
            records,
        )))?;
    }

    for entry in &config.snapshot {
        let factory_name = format!("snapshot:{}", entry.id);
        let provider_id = entry.id.clone();
        let path = entry.path.clone();
        registry.register_factory(
            &factory_name,
            Arc::new(move || {
                Arc::new(SnapshotFileProvider::new(provider_id.as_str(), path.as_path()))
                    as Arc<dyn ResidentProvider>
            }),
        )?;
        registry.register_named(&entry.id, &factory_name)?;
    }

    Ok(())
}
