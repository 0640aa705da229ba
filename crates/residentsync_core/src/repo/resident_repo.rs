//! Resident repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the active-only and full (audit) resident views as two explicit queries.
//! - Provide set-based writes used by the reconciler.
//!
//! # Invariants
//! - Residents are never hard-deleted; departure is `is_active = 0`.
//! - Bulk writes run inside the caller's transaction when one is open.

use crate::model::property::PropertyId;
use crate::model::resident::{Resident, ResidentId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, is_unique_violation, parse_flag, parse_uuid,
    placeholders, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const RESIDENT_SELECT_SQL: &str = "SELECT
    uuid,
    property_uuid,
    external_id,
    email,
    is_active,
    is_notified
FROM residents";

// Keeps `IN (...)` lists well under SQLite's bound-parameter limit.
const MAX_IDS_PER_STATEMENT: usize = 500;

/// Repository interface for residents.
pub trait ResidentRepository {
    /// Inserts one resident.
    fn create_resident(&self, resident: &Resident) -> RepoResult<ResidentId>;
    /// Inserts all residents; returns the inserted count.
    fn create_residents(&self, residents: &[Resident]) -> RepoResult<usize>;
    /// Point lookup by `(property, external_id)`, active or not.
    fn get_resident(
        &self,
        property_uuid: PropertyId,
        external_id: &str,
    ) -> RepoResult<Option<Resident>>;
    /// Visible residents (`is_active = 1`) of one property.
    fn active_residents(&self, property_uuid: PropertyId) -> RepoResult<Vec<Resident>>;
    /// Every resident of one property, including departed ones.
    fn all_residents(&self, property_uuid: PropertyId) -> RepoResult<Vec<Resident>>;
    /// Sets `is_active = 0` for the given external ids; returns changed rows.
    fn deactivate_residents(
        &self,
        property_uuid: PropertyId,
        external_ids: &[String],
    ) -> RepoResult<usize>;
    /// Overwrites the email of an active resident; returns whether the stored value changed.
    fn update_email(
        &self,
        property_uuid: PropertyId,
        external_id: &str,
        email: &str,
    ) -> RepoResult<bool>;
    /// Brings a departed resident back with a fresh email.
    fn reactivate_resident(
        &self,
        property_uuid: PropertyId,
        external_id: &str,
        email: &str,
    ) -> RepoResult<()>;
    /// Active residents still waiting for a welcome notification, across all properties.
    fn list_unnotified(&self) -> RepoResult<Vec<Resident>>;
    fn mark_notified(&self, id: ResidentId) -> RepoResult<()>;
}

/// SQLite-backed resident repository.
pub struct SqliteResidentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResidentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_residents(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Resident>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut residents = Vec::new();
        while let Some(row) = rows.next()? {
            residents.push(parse_resident_row(row)?);
        }
        Ok(residents)
    }
}

impl ResidentRepository for SqliteResidentRepository<'_> {
    fn create_resident(&self, resident: &Resident) -> RepoResult<ResidentId> {
        self.create_residents(std::slice::from_ref(resident))?;
        Ok(resident.uuid)
    }

    fn create_residents(&self, residents: &[Resident]) -> RepoResult<usize> {
        for resident in residents {
            resident.validate()?;
        }

        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO residents (
                uuid,
                property_uuid,
                external_id,
                email,
                is_active,
                is_notified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        )?;
        for resident in residents {
            stmt.execute(params![
                resident.uuid.to_string(),
                resident.property_uuid.to_string(),
                resident.external_id.as_str(),
                resident.email.as_str(),
                bool_to_int(resident.is_active),
                bool_to_int(resident.is_notified),
            ])
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::DuplicateResident {
                        property_uuid: resident.property_uuid,
                        external_id: resident.external_id.clone(),
                    }
                } else {
                    err.into()
                }
            })?;
        }

        Ok(residents.len())
    }

    fn get_resident(
        &self,
        property_uuid: PropertyId,
        external_id: &str,
    ) -> RepoResult<Option<Resident>> {
        let mut residents = self.query_residents(
            &format!("{RESIDENT_SELECT_SQL} WHERE property_uuid = ? AND external_id = ?;"),
            vec![
                Value::Text(property_uuid.to_string()),
                Value::Text(external_id.to_string()),
            ],
        )?;
        Ok(residents.pop())
    }

    fn active_residents(&self, property_uuid: PropertyId) -> RepoResult<Vec<Resident>> {
        self.query_residents(
            &format!(
                "{RESIDENT_SELECT_SQL}
                 WHERE property_uuid = ? AND is_active = 1
                 ORDER BY external_id ASC;"
            ),
            vec![Value::Text(property_uuid.to_string())],
        )
    }

    fn all_residents(&self, property_uuid: PropertyId) -> RepoResult<Vec<Resident>> {
        self.query_residents(
            &format!(
                "{RESIDENT_SELECT_SQL}
                 WHERE property_uuid = ?
                 ORDER BY external_id ASC;"
            ),
            vec![Value::Text(property_uuid.to_string())],
        )
    }

    fn deactivate_residents(
        &self,
        property_uuid: PropertyId,
        external_ids: &[String],
    ) -> RepoResult<usize> {
        let mut changed = 0;
        for chunk in external_ids.chunks(MAX_IDS_PER_STATEMENT) {
            let sql = format!(
                "UPDATE residents
                 SET
                    is_active = 0,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE property_uuid = ?
                   AND is_active = 1
                   AND external_id IN ({});",
                placeholders(chunk.len())
            );
            let mut bind_values = Vec::with_capacity(chunk.len() + 1);
            bind_values.push(Value::Text(property_uuid.to_string()));
            bind_values.extend(chunk.iter().map(|id| Value::Text(id.clone())));
            changed += self.conn.execute(&sql, params_from_iter(bind_values))?;
        }
        Ok(changed)
    }

    fn update_email(
        &self,
        property_uuid: PropertyId,
        external_id: &str,
        email: &str,
    ) -> RepoResult<bool> {
        crate::model::validation::require_email(email)?;

        let changed = self.conn.execute(
            "UPDATE residents
             SET
                email = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE property_uuid = ?1
               AND external_id = ?2
               AND is_active = 1
               AND email <> ?3;",
            params![property_uuid.to_string(), external_id, email],
        )?;
        Ok(changed > 0)
    }

    fn reactivate_resident(
        &self,
        property_uuid: PropertyId,
        external_id: &str,
        email: &str,
    ) -> RepoResult<()> {
        crate::model::validation::require_email(email)?;

        let changed = self.conn.execute(
            "UPDATE residents
             SET
                is_active = 1,
                email = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE property_uuid = ?1
               AND external_id = ?2
               AND is_active = 0;",
            params![property_uuid.to_string(), external_id, email],
        )?;
        if changed == 0 {
            return Err(RepoError::InvalidData(format!(
                "no inactive resident `{external_id}` to reactivate in property {property_uuid}"
            )));
        }
        Ok(())
    }

    fn list_unnotified(&self) -> RepoResult<Vec<Resident>> {
        self.query_residents(
            &format!(
                "{RESIDENT_SELECT_SQL}
                 WHERE is_notified = 0 AND is_active = 1
                 ORDER BY created_at ASC, uuid ASC;"
            ),
            Vec::new(),
        )
    }

    fn mark_notified(&self, id: ResidentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE residents
             SET
                is_notified = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::ResidentNotFound(id));
        }
        Ok(())
    }
}

fn parse_resident_row(row: &Row<'_>) -> RepoResult<Resident> {
    let uuid: String = row.get("uuid")?;
    let property_uuid: String = row.get("property_uuid")?;

    let resident = Resident {
        uuid: parse_uuid(&uuid, "residents.uuid")?,
        property_uuid: parse_uuid(&property_uuid, "residents.property_uuid")?,
        external_id: row.get("external_id")?,
        email: row.get("email")?,
        is_active: parse_flag(row.get("is_active")?, "residents.is_active")?,
        is_notified: parse_flag(row.get("is_notified")?, "residents.is_notified")?,
    };
    resident.validate()?;
    Ok(resident)
}
