use anyhow::{Context, Result};
use msgpackfield_types::Value;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use crate::field::{ModelField, MsgPackField};
use crate::sql::{Packed, StoredColumn};

/// One row of a model table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub value: Option<Value>,
}

/// SQLite table with an integer primary key and one packed column.
///
/// Every write goes through [`ModelField::get_db_prep_value`] and every read
/// through [`ModelField::from_db_value`], so the field's lifecycle hooks run
/// exactly where a model layer would call them.
pub struct ModelStore {
    conn: Connection,
    table: String,
    field: MsgPackField,
}

impl ModelStore {
    pub fn open(db_path: &Path, table: &str, field: MsgPackField) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        Self::with_connection(conn, table, field)
    }

    pub fn open_in_memory(table: &str, field: MsgPackField) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, table, field)
    }

    fn with_connection(conn: Connection, table: &str, field: MsgPackField) -> Result<Self> {
        check_identifier(table)?;
        check_identifier(field.name())?;

        let store = Self {
            conn,
            table: table.to_string(),
            field,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {column} {db_type}
            );
            "#,
            table = self.table,
            column = self.field.name(),
            db_type = self.field.db_type(),
        ))?;

        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn field(&self) -> &MsgPackField {
        &self.field
    }

    /// Insert a row and return its id. A `None` value is stored as NULL.
    pub fn create(&self, value: Option<&Value>) -> Result<i64> {
        let value = self.field.get_prep_value(value.cloned());
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES (?1)",
                    self.table,
                    self.field.name()
                ),
                params![Packed::new(value.as_ref(), self.field.codec())],
            )
            .with_context(|| format!("Failed to insert into {}", self.table))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a row holding the field's resolved default.
    pub fn create_default(&self) -> Result<i64> {
        let value = self.field.get_default();
        self.create(value.as_ref())
    }

    /// Insert or replace the row with the given id.
    pub fn upsert(&self, id: i64, value: Option<&Value>) -> Result<()> {
        let value = self.field.get_prep_value(value.cloned());
        self.conn
            .execute(
                &format!(
                    r#"
                    INSERT INTO {table} (id, {column})
                    VALUES (?1, ?2)
                    ON CONFLICT(id) DO UPDATE SET
                        {column} = ?2
                    "#,
                    table = self.table,
                    column = self.field.name()
                ),
                params![id, Packed::new(value.as_ref(), self.field.codec())],
            )
            .with_context(|| format!("Failed to upsert {} row {}", self.table, id))?;

        Ok(())
    }

    /// Replace the value of an existing row. Returns false if no row matched.
    pub fn update(&self, id: i64, value: Option<&Value>) -> Result<bool> {
        let value = self.field.get_prep_value(value.cloned());
        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {} = ?1 WHERE id = ?2",
                self.table,
                self.field.name()
            ),
            params![Packed::new(value.as_ref(), self.field.codec()), id],
        )?;

        Ok(changed > 0)
    }

    /// Fetch one row. The outer `None` means no such row; an undecodable
    /// column gives a record whose value is `None`.
    pub fn get(&self, id: i64) -> Result<Option<Record>> {
        let stored = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE id = ?1",
                    self.field.name(),
                    self.table
                ),
                [id],
                |row| row.get::<_, StoredColumn>(0),
            )
            .optional()?;

        Ok(stored.map(|StoredColumn(raw)| Record {
            id,
            value: self.field.from_db_value(raw),
        }))
    }

    pub fn list(&self) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, {} FROM {} ORDER BY id",
            self.field.name(),
            self.table
        ))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, StoredColumn>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        Ok(rows
            .into_iter()
            .map(|(id, StoredColumn(raw))| Record {
                id,
                value: self.field.from_db_value(raw),
            })
            .collect())
    }

    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", self.table), [id])?;
        Ok(deleted > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                    row.get(0)
                })?;

        Ok(count as usize)
    }
}

/// Table and column names are interpolated into SQL, so only plain
/// identifiers are accepted.
fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        anyhow::bail!("Invalid SQL identifier '{}'", name);
    }
    Ok(())
}
