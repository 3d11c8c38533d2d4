// # Settings Store Traits
//
// Defines the storage interfaces behind the configuration facade.
//
// ## Purpose
//
// A settings backend keeps two things:
// - The current value of each named property ([`PropertyStore`])
// - An append-only ledger of every write ([`HistoryLog`])
//
// [`SettingsStore`] ties them together so a single write lands in both or in
// neither.
//
// ## Implementations
//
// - SQLite: two tables, one transaction per write
// - File-based: one JSON document, one atomic file replace per write
// - Memory: tests and embedding
//
// ## Usage
//
// ```rust,ignore
// use ntfyer_core::{HistoryEntry, SettingsStore};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* SettingsStore implementation */;
//
//     store.commit(&HistoryEntry::now("TOPIC", "alerts")).await?;
//     assert_eq!(store.get("TOPIC").await?, "alerts");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, Result};

/// A live configuration property
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Property {
    /// Property name (e.g. `URL`)
    pub name: String,
    /// Current value
    pub value: String,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Immutable audit record of one property write
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    /// Property that was written
    pub name: String,
    /// Value that was written
    pub value: String,
    /// When the write happened
    pub updated_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry with an explicit timestamp
    pub fn new(name: impl Into<String>, value: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            updated_at,
        }
    }

    /// Create an entry stamped with the current time
    pub fn now(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value, Utc::now())
    }
}

/// Current-value storage, one live value per property name
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Get the current value of a property
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The current value
    /// - `Err(Error::NotFound)`: The property was never written
    /// - `Err(Error::InvariantViolation)`: More than one live record exists
    async fn get(&self, name: &str) -> Result<String>;

    /// Create or overwrite the current value of a property
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Value stored
    /// - `Err(Error::InvariantViolation)`: More than one live record exists
    /// - `Err(Error::StorageUnavailable)`: Storage fault
    async fn set(&self, name: &str, value: &str) -> Result<()>;

    /// List all live properties, sorted by name
    async fn list(&self) -> Result<Vec<Property>>;

    /// Remove a live property
    ///
    /// Only used to undo a half-applied [`SettingsStore::commit`]. Properties
    /// are never deleted by the application.
    async fn unset(&self, name: &str) -> Result<()>;
}

/// Append-only ledger of property writes
#[async_trait]
pub trait HistoryLog: Send + Sync {
    /// Append one immutable entry
    ///
    /// Fails only with `Error::StorageUnavailable`.
    async fn append(&self, entry: &HistoryEntry) -> Result<()>;

    /// Entries in insertion order, optionally restricted to one property
    async fn entries(&self, name: Option<&str>) -> Result<Vec<HistoryEntry>>;
}

/// A backend that keeps both current values and their history
///
/// # Atomicity
///
/// [`commit`](SettingsStore::commit) must leave the store either with the new
/// value *and* its history entry, or with neither. The default implementation
/// compensates: it sets the value, appends the entry, and restores the
/// previous value when the append fails. Backends with real transactions
/// should override it.
#[async_trait]
pub trait SettingsStore: PropertyStore + HistoryLog {
    /// Apply one write to the property store and the history log as a unit
    async fn commit(&self, entry: &HistoryEntry) -> Result<()> {
        let previous = match self.get(&entry.name).await {
            Ok(value) => Some(value),
            Err(Error::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        self.set(&entry.name, &entry.value).await?;

        if let Err(append_err) = self.append(entry).await {
            let restored = match previous {
                Some(ref value) => self.set(&entry.name, value).await,
                None => self.unset(&entry.name).await,
            };
            if let Err(restore_err) = restored {
                tracing::error!(
                    "Failed to roll back '{}' after history append failure: {}",
                    entry.name,
                    restore_err
                );
            }
            return Err(append_err);
        }

        Ok(())
    }

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
