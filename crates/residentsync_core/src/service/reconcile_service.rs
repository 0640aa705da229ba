//! Reconciler: staged snapshot vs. live residents, per property.
//!
//! # Responsibility
//! - Diff today's staged rows against each property's residents and apply
//!   deactivate / update / create transitions.
//! - Send welcome notifications once every property pass has committed.
//!
//! # Invariants
//! - Steps for one property run in a single transaction over one snapshot.
//! - A failing property is rolled back and reported; other properties proceed.
//! - Re-running on unchanged staging data changes nothing.
//! - A resident that reappears after departing is reactivated in place; a
//!   second row for the same `(property, external_id)` is never inserted.

use crate::model::property::{Property, PropertyId};
use crate::model::resident::Resident;
use crate::model::staged_record::StagedRecord;
use crate::repo::property_repo::{PropertyRepository, SqlitePropertyRepository};
use crate::repo::resident_repo::{ResidentRepository, SqliteResidentRepository};
use crate::repo::staging_repo::{SqliteStagingRepository, StagingRepository};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use crate::service::notifier::Notifier;
use crate::sync::error::{SyncError, SyncResult};
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

/// External id plus the email reported for it today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedResident {
    pub external_id: String,
    pub email: String,
}

/// Transitions computed for one property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyPlan {
    /// Active but missing from today's snapshot.
    pub departed: Vec<String>,
    /// Active and present today; email is overwritten.
    pub retained: Vec<StagedResident>,
    /// Inactive row exists and the id is back in today's snapshot.
    pub reactivated: Vec<StagedResident>,
    /// No row exists yet.
    pub created: Vec<StagedResident>,
}

/// Applied counts for one property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyChanges {
    pub deactivated: usize,
    pub retained: usize,
    /// Retained residents whose stored email actually changed.
    pub updated: usize,
    pub reactivated: usize,
    pub created: usize,
}

impl PropertyChanges {
    pub fn is_noop(&self) -> bool {
        self.deactivated == 0 && self.updated == 0 && self.reactivated == 0 && self.created == 0
    }
}

#[derive(Debug)]
pub struct PropertyOutcome {
    pub property_external_id: String,
    pub result: SyncResult<PropertyChanges>,
}

#[derive(Debug, Default)]
pub struct NotificationSummary {
    pub sent: usize,
    pub failures: Vec<SyncError>,
}

/// Summary of one `sync` run.
#[derive(Debug)]
pub struct SyncReport {
    pub observed_on: NaiveDate,
    pub properties: Vec<PropertyOutcome>,
    pub notifications: NotificationSummary,
}

impl SyncReport {
    pub fn property_failures(&self) -> Vec<(&str, &SyncError)> {
        self.properties
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(_) => None,
                Err(err) => Some((outcome.property_external_id.as_str(), err)),
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.property_failures().is_empty() && self.notifications.failures.is_empty()
    }
}

/// Computes the transitions for one property from loaded snapshots.
///
/// `residents` is every resident of the property, active or not; only active
/// ones take part in the diff, inactive ones decide reactivate vs. create.
///
/// # Errors
/// - `IntegrityViolation` when `staged` holds two rows for one resident.
pub fn plan_property(
    property: &Property,
    residents: &[Resident],
    staged: &[StagedRecord],
) -> SyncResult<PropertyPlan> {
    let mut staged_by_id: BTreeMap<&str, &StagedRecord> = BTreeMap::new();
    for record in staged {
        if staged_by_id
            .insert(record.resident_external_id.as_str(), record)
            .is_some()
        {
            return Err(SyncError::IntegrityViolation {
                property_external_id: property.external_id.clone(),
                resident_external_id: record.resident_external_id.clone(),
                observed_on: record.observed_on,
            });
        }
    }

    let live: BTreeSet<&str> = residents
        .iter()
        .filter(|resident| resident.is_active)
        .map(|resident| resident.external_id.as_str())
        .collect();
    let inactive: BTreeSet<&str> = residents
        .iter()
        .filter(|resident| !resident.is_active)
        .map(|resident| resident.external_id.as_str())
        .collect();
    let staged_ids: BTreeSet<&str> = staged_by_id.keys().copied().collect();

    let to_staged = |external_id: &str| StagedResident {
        external_id: external_id.to_string(),
        email: staged_by_id[external_id].email.clone(),
    };

    let mut plan = PropertyPlan {
        departed: live
            .difference(&staged_ids)
            .map(|external_id| external_id.to_string())
            .collect(),
        retained: live
            .intersection(&staged_ids)
            .map(|external_id| to_staged(external_id))
            .collect(),
        ..PropertyPlan::default()
    };
    for external_id in staged_ids.difference(&live) {
        if inactive.contains(external_id) {
            plan.reactivated.push(to_staged(external_id));
        } else {
            plan.created.push(to_staged(external_id));
        }
    }

    Ok(plan)
}

/// Applies a plan through the repository; callers own the transaction.
pub fn apply_plan(
    repo: &impl ResidentRepository,
    property_uuid: PropertyId,
    plan: &PropertyPlan,
) -> RepoResult<PropertyChanges> {
    let mut changes = PropertyChanges {
        retained: plan.retained.len(),
        ..PropertyChanges::default()
    };

    if !plan.departed.is_empty() {
        changes.deactivated = repo.deactivate_residents(property_uuid, &plan.departed)?;
    }

    for staged in &plan.retained {
        if repo.update_email(property_uuid, &staged.external_id, &staged.email)? {
            changes.updated += 1;
        }
    }

    for staged in &plan.reactivated {
        repo.reactivate_resident(property_uuid, &staged.external_id, &staged.email)?;
        changes.reactivated += 1;
    }

    let new_residents: Vec<Resident> = plan
        .created
        .iter()
        .map(|staged| Resident::new(property_uuid, staged.external_id.as_str(), staged.email.as_str()))
        .collect();
    if !new_residents.is_empty() {
        changes.created = repo.create_residents(&new_residents)?;
    }

    Ok(changes)
}

/// Runs the reconciliation over every property.
pub struct Reconciler<'conn, N: Notifier> {
    conn: &'conn Connection,
    notifier: N,
}

impl<'conn, N: Notifier> Reconciler<'conn, N> {
    pub fn try_new(conn: &'conn Connection, notifier: N) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, notifier })
    }

    /// Reconciles against today's local date.
    pub fn sync(&self) -> SyncResult<SyncReport> {
        self.sync_on(Local::now().date_naive())
    }

    /// Reconciles every property against rows staged for `today`.
    ///
    /// # Errors
    /// Only when the property list itself cannot be loaded. Once property
    /// passes have started, every failure (per property, per resident, or the
    /// pending-notification query itself) is reported inside `SyncReport`.
    pub fn sync_on(&self, today: NaiveDate) -> SyncResult<SyncReport> {
        let started_at = Instant::now();
        let properties = SqlitePropertyRepository::try_new(self.conn)?.list_properties()?;
        info!(
            "event=sync module=reconcile status=start observed_on={} properties={}",
            today,
            properties.len()
        );

        let mut outcomes = Vec::with_capacity(properties.len());
        for property in &properties {
            let result = self.sync_property(property, today);
            match &result {
                Ok(changes) => info!(
                    "event=property_sync module=reconcile status=ok property_external_id={} deactivated={} retained={} updated={} reactivated={} created={}",
                    property.external_id,
                    changes.deactivated,
                    changes.retained,
                    changes.updated,
                    changes.reactivated,
                    changes.created
                ),
                Err(err) => error!(
                    "event=property_sync module=reconcile status=error property_external_id={} error_code={} error={}",
                    property.external_id,
                    err.code(),
                    err
                ),
            }
            outcomes.push(PropertyOutcome {
                property_external_id: property.external_id.clone(),
                result,
            });
        }

        // Runs only after every property pass has committed.
        let by_uuid: BTreeMap<PropertyId, &Property> = properties
            .iter()
            .map(|property| (property.uuid, property))
            .collect();
        let notifications = self.notify_pending(&by_uuid);

        let report = SyncReport {
            observed_on: today,
            properties: outcomes,
            notifications,
        };
        info!(
            "event=sync module=reconcile status=done duration_ms={} failed_properties={} notified={} failed_notifications={}",
            started_at.elapsed().as_millis(),
            report.property_failures().len(),
            report.notifications.sent,
            report.notifications.failures.len()
        );
        Ok(report)
    }

    fn sync_property(&self, property: &Property, today: NaiveDate) -> SyncResult<PropertyChanges> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let residents = SqliteResidentRepository::try_new(&tx)?;
        let staging = SqliteStagingRepository::try_new(&tx)?;

        let snapshot = residents.all_residents(property.uuid)?;
        let staged = staging.list_for_property_on(&property.external_id, today)?;
        let plan = plan_property(property, &snapshot, &staged)?;
        let changes = apply_plan(&residents, property.uuid, &plan)?;

        tx.commit()?;
        Ok(changes)
    }

    fn notify_pending(&self, properties: &BTreeMap<PropertyId, &Property>) -> NotificationSummary {
        let mut summary = NotificationSummary::default();
        let listed = SqliteResidentRepository::try_new(self.conn)
            .and_then(|repo| repo.list_unnotified().map(|pending| (repo, pending)));
        let (repo, pending) = match listed {
            Ok(found) => found,
            Err(err) => {
                error!(
                    "event=resident_notify module=reconcile status=error error_code=pending_list_failed error={}",
                    err
                );
                summary.failures.push(err.into());
                return summary;
            }
        };

        for resident in pending {
            let Some(property) = properties.get(&resident.property_uuid) else {
                summary
                    .failures
                    .push(SyncError::Repo(RepoError::PropertyNotFound(
                        resident.property_uuid.to_string(),
                    )));
                continue;
            };

            if let Err(err) = self.notifier.notify(property, &resident) {
                warn!(
                    "event=resident_notify module=reconcile status=error property_external_id={} resident_external_id={} error_code=notification_failed",
                    property.external_id, resident.external_id
                );
                summary.failures.push(SyncError::NotificationFailed {
                    property_external_id: property.external_id.clone(),
                    resident_external_id: resident.external_id.clone(),
                    message: err.message,
                });
                continue;
            }

            match repo.mark_notified(resident.uuid) {
                Ok(()) => summary.sent += 1,
                Err(err) => summary.failures.push(err.into()),
            }
        }

        summary
    }
}
