//! Post-migration check of the uniqueness keys the pipeline relies on.

use super::{DbError, DbResult};
use rusqlite::Connection;

/// `(table, columns)` pairs that must be covered by a unique index.
pub const REQUIRED_UNIQUE_KEYS: &[(&str, &[&str])] = &[
    ("properties", &["external_id"]),
    ("residents", &["property_uuid", "external_id"]),
    (
        "staged_records",
        &["property_external_id", "resident_external_id", "observed_on"],
    ),
];

/// Column lists of every unique index on `table`, in index order.
pub fn unique_keys(conn: &Connection, table: &str) -> DbResult<Vec<Vec<String>>> {
    let mut index_stmt =
        conn.prepare("SELECT name FROM pragma_index_list(?1) WHERE \"unique\" = 1;")?;
    let index_names = index_stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut column_stmt =
        conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno ASC;")?;
    let mut keys = Vec::with_capacity(index_names.len());
    for index_name in index_names {
        let columns = column_stmt
            .query_map([index_name.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        keys.push(columns);
    }
    Ok(keys)
}

pub(super) fn verify_unique_keys(conn: &Connection) -> DbResult<()> {
    for &(table, columns) in REQUIRED_UNIQUE_KEYS {
        let present = unique_keys(conn, table)?
            .iter()
            .any(|key| key.iter().map(String::as_str).eq(columns.iter().copied()));
        if !present {
            return Err(DbError::MissingUniqueKey { table, columns });
        }
    }
    Ok(())
}
