// # SQLite Settings Store
//
// Relational implementation of SettingsStore.
//
// ## Schema
//
// ```sql
// CREATE TABLE settings (
//     property TEXT PRIMARY KEY,
//     value    TEXT
// );
// CREATE TABLE settings_history (
//     id         INTEGER PRIMARY KEY AUTOINCREMENT,
//     property   TEXT,
//     value      TEXT,
//     updated_at TEXT
// );
// ```
//
// Table names come from an explicit [`Schema`] handed to the constructor;
// nothing is registered globally.
//
// ## Atomicity
//
// `commit` upserts the setting and inserts the history row inside one
// IMMEDIATE transaction. If either statement fails the transaction is dropped
// and rolled back, so the settings table never holds a value without its
// history row.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::traits::settings_store::{
    HistoryEntry, HistoryLog, Property, PropertyStore, SettingsStore,
};
use crate::{Error, Result};

/// Table layout for the SQLite backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Table holding one live row per property
    pub settings_table: String,
    /// Append-only history table
    pub history_table: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            settings_table: "settings".to_string(),
            history_table: "settings_history".to_string(),
        }
    }
}

impl Schema {
    /// Create a schema with custom table names
    pub fn new(settings_table: impl Into<String>, history_table: impl Into<String>) -> Self {
        Self {
            settings_table: settings_table.into(),
            history_table: history_table.into(),
        }
    }

    /// Validate that both table names are plain SQL identifiers
    ///
    /// Table names are interpolated into statements, so anything other than
    /// ASCII letters, digits and underscores is rejected.
    pub fn validate(&self) -> Result<()> {
        for table in [&self.settings_table, &self.history_table] {
            let valid = !table.is_empty()
                && !table.starts_with(|c: char| c.is_ascii_digit())
                && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(Error::config(format!("Invalid table name: '{}'", table)));
            }
        }
        if self.settings_table == self.history_table {
            return Err(Error::config(
                "Settings and history tables must have different names",
            ));
        }
        Ok(())
    }

    fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {settings} (
                property TEXT PRIMARY KEY,
                value    TEXT
            );
            CREATE TABLE IF NOT EXISTS {history} (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                property   TEXT,
                value      TEXT,
                updated_at TEXT
            );",
            settings = self.settings_table,
            history = self.history_table,
        )
    }
}

/// SQLite-backed settings store
///
/// # Example
///
/// ```rust,no_run
/// use ntfyer_core::store::{Schema, SqliteSettingsStore};
/// use ntfyer_core::traits::{HistoryEntry, PropertyStore, SettingsStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteSettingsStore::open("settings.db", Schema::default())?;
///
///     store.commit(&HistoryEntry::now("TOPIC", "alerts")).await?;
///     assert_eq!(store.get("TOPIC").await?, "alerts");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SqliteSettingsStore {
    path: Option<PathBuf>,
    schema: Schema,
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// Open (or create) the database at `path` and apply the schema
    pub fn open<P: AsRef<Path>>(path: P, schema: Schema) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        schema.validate()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::storage(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| {
            Error::storage(format!(
                "Failed to open settings database {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::with_connection(conn, Some(path), schema)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(schema: Schema) -> Result<Self> {
        schema.validate()?;
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, None, schema)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>, schema: Schema) -> Result<Self> {
        conn.execute_batch(&schema.create_sql())?;

        tracing::debug!(
            path = ?path,
            settings_table = %schema.settings_table,
            history_table = %schema.history_table,
            "Settings database initialized"
        );

        Ok(Self {
            path,
            schema,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Schema this store was opened with
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("Settings database connection lock poisoned"))
    }

    /// Count the live rows for `name`
    fn live_rows(conn: &Connection, schema: &Schema, name: &str) -> Result<usize> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE property = ?1",
            schema.settings_table
        );
        let count: i64 = conn.query_row(&sql, params![name], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert or overwrite the live row for `name`
    ///
    /// Zero rows inserts, one row updates, more than one is a corrupted table.
    fn upsert(conn: &Connection, schema: &Schema, name: &str, value: &str) -> Result<()> {
        match Self::live_rows(conn, schema, name)? {
            0 => {
                tracing::debug!("No setting found for '{}', inserting", name);
                let sql = format!(
                    "INSERT INTO {} (property, value) VALUES (?1, ?2)",
                    schema.settings_table
                );
                conn.execute(&sql, params![name, value])?;
            }
            1 => {
                tracing::debug!("Setting '{}' found, updating", name);
                let sql = format!(
                    "UPDATE {} SET value = ?2 WHERE property = ?1",
                    schema.settings_table
                );
                conn.execute(&sql, params![name, value])?;
            }
            n => {
                return Err(Error::invariant(format!(
                    "{} live rows for property '{}' in table '{}'",
                    n, name, schema.settings_table
                )));
            }
        }
        Ok(())
    }

    fn insert_history(conn: &Connection, schema: &Schema, entry: &HistoryEntry) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (property, value, updated_at) VALUES (?1, ?2, ?3)",
            schema.history_table
        );
        conn.execute(
            &sql,
            params![entry.name, entry.value, entry.updated_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Run `operation` inside a transaction; commit on `Ok`, roll back on `Err`
    fn in_transaction<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Dropping an uncommitted transaction rolls it back
        let result = operation(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}

/// Offset-less layouts found in stores written before timestamps were RFC 3339
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a stored history timestamp; naive values are taken as UTC
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let rfc3339_err = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => return Ok(ts.with_timezone(&Utc)),
        Err(e) => e,
    };

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            Error::storage(format!("Invalid history timestamp '{}': {}", raw, rfc3339_err))
        })
}

#[async_trait]
impl PropertyStore for SqliteSettingsStore {
    async fn get(&self, name: &str) -> Result<String> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT value FROM {} WHERE property = ?1",
            self.schema.settings_table
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map(params![name], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match values.len() {
            0 => Err(Error::not_found(format!("property '{}'", name))),
            1 => Ok(values.into_iter().next().unwrap_or_default()),
            n => Err(Error::invariant(format!(
                "{} live rows for property '{}' in table '{}'",
                n, name, self.schema.settings_table
            ))),
        }
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        let schema = &self.schema;
        self.in_transaction(|tx| Self::upsert(tx, schema, name, value))
    }

    async fn list(&self) -> Result<Vec<Property>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT property, value FROM {} ORDER BY property",
            self.schema.settings_table
        );
        let mut stmt = conn.prepare(&sql)?;
        let properties = stmt
            .query_map([], |row| Ok(Property::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(properties)
    }

    async fn unset(&self, name: &str) -> Result<()> {
        let conn = self.lock()?;
        let sql = format!("DELETE FROM {} WHERE property = ?1", self.schema.settings_table);
        conn.execute(&sql, params![name])?;
        Ok(())
    }
}

#[async_trait]
impl HistoryLog for SqliteSettingsStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let conn = self.lock()?;
        Self::insert_history(&conn, &self.schema, entry)
    }

    async fn entries(&self, name: Option<&str>) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT property, value, updated_at FROM {} \
             WHERE ?1 IS NULL OR property = ?1 ORDER BY id",
            self.schema.history_table
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, value, updated_at)| -> Result<HistoryEntry> {
                Ok(HistoryEntry::new(name, value, parse_timestamp(&updated_at)?))
            })
            .collect()
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn commit(&self, entry: &HistoryEntry) -> Result<()> {
        let schema = &self.schema;
        self.in_transaction(|tx| {
            Self::upsert(tx, schema, &entry.name, &entry.value)?;
            Self::insert_history(tx, schema, entry)
        })?;

        tracing::debug!(
            "Committed '{}' with history row to {}",
            entry.name,
            schema.settings_table
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
