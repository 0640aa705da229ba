//! Property repository contracts and SQLite implementation.

use crate::model::property::{Property, PropertyId};
use crate::repo::{ensure_connection_ready, is_unique_violation, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROPERTY_SELECT_SQL: &str = "SELECT uuid, external_id FROM properties";

/// Repository interface for properties.
pub trait PropertyRepository {
    fn create_property(&self, property: &Property) -> RepoResult<PropertyId>;
    fn get_property(&self, id: PropertyId) -> RepoResult<Option<Property>>;
    fn get_property_by_external_id(&self, external_id: &str) -> RepoResult<Option<Property>>;
    /// All properties ordered by external id.
    fn list_properties(&self) -> RepoResult<Vec<Property>>;
}

/// SQLite-backed property repository.
pub struct SqlitePropertyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePropertyRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PropertyRepository for SqlitePropertyRepository<'_> {
    fn create_property(&self, property: &Property) -> RepoResult<PropertyId> {
        // Rejects padded ids: the stored value is the staging lookup key.
        property.validate()?;

        let external_id = property.external_id.as_str();
        self.conn
            .execute(
                "INSERT INTO properties (uuid, external_id) VALUES (?1, ?2);",
                params![property.uuid.to_string(), external_id],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::DuplicateProperty(external_id.to_string())
                } else {
                    err.into()
                }
            })?;

        Ok(property.uuid)
    }

    fn get_property(&self, id: PropertyId) -> RepoResult<Option<Property>> {
        let row = self
            .conn
            .query_row(
                &format!("{PROPERTY_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(uuid, external_id)| build_property(&uuid, external_id))
            .transpose()
    }

    fn get_property_by_external_id(&self, external_id: &str) -> RepoResult<Option<Property>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROPERTY_SELECT_SQL} WHERE external_id = ?1;"))?;
        let mut rows = stmt.query([external_id.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_property_row(row)?));
        }
        Ok(None)
    }

    fn list_properties(&self) -> RepoResult<Vec<Property>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROPERTY_SELECT_SQL} ORDER BY external_id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut properties = Vec::new();
        while let Some(row) = rows.next()? {
            properties.push(parse_property_row(row)?);
        }
        Ok(properties)
    }
}

fn parse_property_row(row: &Row<'_>) -> RepoResult<Property> {
    let uuid: String = row.get("uuid")?;
    build_property(&uuid, row.get("external_id")?)
}

fn build_property(uuid: &str, external_id: String) -> RepoResult<Property> {
    let property = Property {
        uuid: parse_uuid(uuid, "properties.uuid")?,
        external_id,
    };
    property.validate()?;
    Ok(property)
}
