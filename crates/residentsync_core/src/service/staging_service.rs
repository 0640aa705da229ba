//! Staging importer: registry → providers → staging store.
//!
//! # Responsibility
//! - Run every registered provider once and stage its normalized output.
//! - Keep provider failures isolated and reported.
//!
//! # Invariants
//! - One bulk write per provider; a conflicting row rolls back only that provider.
//! - A provider's batch is staged whole or not at all: one record failing
//!   validation rejects the batch with `InvalidRecord`, so `sync` never sees a
//!   snapshot with a reported resident silently missing.

use crate::model::staged_record::StagedRecord;
use crate::repo::staging_repo::StagingRepository;
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::provider::ProviderRecord;
use crate::sync::provider_registry::{ProviderEntry, ProviderRegistry};
use log::{error, info, warn};
use std::time::Instant;

/// Counters for one successful provider import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderImportStats {
    pub fetched: usize,
    pub staged: usize,
}

/// Result of importing one provider.
#[derive(Debug)]
pub struct ProviderOutcome {
    pub provider_id: String,
    pub result: SyncResult<ProviderImportStats>,
}

/// Summary of one `collect_data` run.
#[derive(Debug, Default)]
pub struct CollectReport {
    pub outcomes: Vec<ProviderOutcome>,
}

impl CollectReport {
    /// Providers that failed, with their error.
    pub fn failures(&self) -> Vec<(&str, &SyncError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(_) => None,
                Err(err) => Some((outcome.provider_id.as_str(), err)),
            })
            .collect()
    }

    pub fn staged_total(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
            .map(|stats| stats.staged)
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }
}

/// Drives registered providers into the staging store.
pub struct StagingImporter<'a, R: StagingRepository> {
    registry: &'a ProviderRegistry,
    repo: R,
}

impl<'a, R: StagingRepository> StagingImporter<'a, R> {
    pub fn new(registry: &'a ProviderRegistry, repo: R) -> Self {
        Self { registry, repo }
    }

    /// Imports every registered provider and reports per-provider outcomes.
    pub fn collect_data(&self) -> CollectReport {
        let started_at = Instant::now();
        info!(
            "event=collect_data module=staging status=start providers={}",
            self.registry.len()
        );

        let outcomes: Vec<ProviderOutcome> = self
            .registry
            .entries()
            .into_iter()
            .map(|entry| {
                let result = self.import_provider(&entry);
                match &result {
                    Ok(stats) => info!(
                        "event=provider_import module=staging status=ok provider_id={} fetched={} staged={}",
                        entry.provider_id, stats.fetched, stats.staged
                    ),
                    Err(err) => error!(
                        "event=provider_import module=staging status=error provider_id={} error_code={} error={}",
                        entry.provider_id,
                        err.code(),
                        err
                    ),
                }
                ProviderOutcome {
                    provider_id: entry.provider_id,
                    result,
                }
            })
            .collect();

        let report = CollectReport { outcomes };
        info!(
            "event=collect_data module=staging status=done duration_ms={} staged={} failed={}",
            started_at.elapsed().as_millis(),
            report.staged_total(),
            report.failures().len()
        );
        report
    }

    fn import_provider(&self, entry: &ProviderEntry) -> SyncResult<ProviderImportStats> {
        let provider = self.registry.resolve(&entry.reference)?;
        let fetched = provider.fetch()?;

        let mut stats = ProviderImportStats {
            fetched: fetched.len(),
            ..ProviderImportStats::default()
        };
        let records = fetched
            .into_iter()
            .map(|raw| {
                let record = normalize_record(&entry.provider_id, raw);
                match record.validate() {
                    Ok(()) => Ok(record),
                    Err(reason) => {
                        warn!(
                            "event=provider_record_invalid module=staging provider_id={} property_external_id={} resident_external_id={} reason={}",
                            entry.provider_id,
                            record.property_external_id,
                            record.resident_external_id,
                            reason
                        );
                        Err(SyncError::InvalidRecord {
                            provider_id: entry.provider_id.clone(),
                            property_external_id: record.property_external_id,
                            resident_external_id: record.resident_external_id,
                            reason,
                        })
                    }
                }
            })
            .collect::<SyncResult<Vec<StagedRecord>>>()?;

        if records.is_empty() {
            return Ok(stats);
        }
        stats.staged = self.repo.insert_batch(&records)?;
        Ok(stats)
    }
}

fn normalize_record(provider_id: &str, raw: ProviderRecord) -> StagedRecord {
    StagedRecord {
        property_external_id: raw.property_external_id.trim().to_string(),
        resident_external_id: raw.resident_external_id.trim().to_string(),
        observed_on: raw.date,
        email: raw.email.trim().to_string(),
        provider_id: provider_id.to_string(),
    }
}
