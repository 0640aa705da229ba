//! Staging store for per-day backend snapshots.
//!
//! # Responsibility
//! - Buffer normalized provider output between fetch and reconciliation.
//! - Enforce `(property, resident, date)` uniqueness on import.
//!
//! # Invariants
//! - `insert_batch` is all-or-nothing: one conflicting row rolls back the batch.
//! - Staged rows are never updated in place.

use crate::model::staged_record::StagedRecord;
use crate::repo::{ensure_connection_ready, is_unique_violation, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const STAGED_SELECT_SQL: &str = "SELECT
    property_external_id,
    resident_external_id,
    observed_on,
    email,
    provider_id
FROM staged_records";

/// Repository interface for staged backend rows.
pub trait StagingRepository {
    /// Persists one provider's batch in a single transaction.
    fn insert_batch(&self, records: &[StagedRecord]) -> RepoResult<usize>;
    /// Rows reported for one property on one observation date.
    fn list_for_property_on(
        &self,
        property_external_id: &str,
        observed_on: NaiveDate,
    ) -> RepoResult<Vec<StagedRecord>>;
    fn count(&self) -> RepoResult<u64>;
    /// Deletes rows observed strictly before `cutoff`; returns deleted count.
    fn purge_before(&self, cutoff: NaiveDate) -> RepoResult<usize>;
}

/// SQLite-backed staging repository.
pub struct SqliteStagingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStagingRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl StagingRepository for SqliteStagingRepository<'_> {
    fn insert_batch(&self, records: &[StagedRecord]) -> RepoResult<usize> {
        for record in records {
            record.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO staged_records (
                    property_external_id,
                    resident_external_id,
                    observed_on,
                    email,
                    provider_id
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for record in records {
                stmt.execute(params![
                    record.property_external_id.as_str(),
                    record.resident_external_id.as_str(),
                    record.observed_on,
                    record.email.as_str(),
                    record.provider_id.as_str(),
                ])
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        RepoError::DuplicateStagedRecord {
                            property_external_id: record.property_external_id.clone(),
                            resident_external_id: record.resident_external_id.clone(),
                            observed_on: record.observed_on,
                        }
                    } else {
                        err.into()
                    }
                })?;
            }
        }
        tx.commit()?;

        Ok(records.len())
    }

    fn list_for_property_on(
        &self,
        property_external_id: &str,
        observed_on: NaiveDate,
    ) -> RepoResult<Vec<StagedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STAGED_SELECT_SQL}
             WHERE property_external_id = ?1
               AND observed_on = ?2
             ORDER BY resident_external_id ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![property_external_id, observed_on])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_staged_row(row)?);
        }
        Ok(records)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM staged_records;", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn purge_before(&self, cutoff: NaiveDate) -> RepoResult<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM staged_records WHERE observed_on < ?1;",
            [cutoff],
        )?;
        Ok(deleted)
    }
}

fn parse_staged_row(row: &Row<'_>) -> RepoResult<StagedRecord> {
    let observed_on: NaiveDate = row.get("observed_on").map_err(|err| {
        RepoError::InvalidData(format!("invalid date in staged_records.observed_on: {err}"))
    })?;

    let record = StagedRecord {
        property_external_id: row.get("property_external_id")?,
        resident_external_id: row.get("resident_external_id")?,
        observed_on,
        email: row.get("email")?,
        provider_id: row.get("provider_id")?,
    };
    record.validate()?;
    Ok(record)
}
