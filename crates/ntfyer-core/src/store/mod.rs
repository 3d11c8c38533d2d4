// # Settings Store Implementations
//
// This module provides implementations of the SettingsStore trait for
// different persistence strategies, and the configuration that picks one.

pub mod file;
pub mod memory;
pub mod sqlite;

pub use file::FileSettingsStore;
pub use memory::MemorySettingsStore;
pub use sqlite::{Schema, SqliteSettingsStore};

use std::path::{Path, PathBuf};

use crate::traits::SettingsStore;
use crate::Result;

/// Which backend to open, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// SQLite database with a settings table and a history table
    Sqlite {
        /// Path to the database file
        path: PathBuf,
        /// Table layout
        schema: Schema,
    },

    /// Single JSON document
    File {
        /// Path to the JSON file
        path: PathBuf,
    },

    /// In-memory store (not persistent)
    Memory,
}

impl StoreConfig {
    /// Pick a backend from the file extension: `.json` is a file store,
    /// anything else is a SQLite database
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            StoreConfig::File { path }
        } else {
            StoreConfig::Sqlite {
                path,
                schema: Schema::default(),
            }
        }
    }

    /// Path of the backing file, `None` for the memory store
    pub fn path(&self) -> Option<&Path> {
        match self {
            StoreConfig::Sqlite { path, .. } | StoreConfig::File { path } => Some(path),
            StoreConfig::Memory => None,
        }
    }

    /// Get the backend type name
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreConfig::Sqlite { .. } => "sqlite",
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
        }
    }

    /// Open the configured store, creating it if it doesn't exist
    pub async fn open(&self) -> Result<Box<dyn SettingsStore>> {
        tracing::debug!("Opening {} settings store at {:?}", self.type_name(), self.path());

        match self {
            StoreConfig::Sqlite { path, schema } => {
                Ok(Box::new(SqliteSettingsStore::open(path, schema.clone())?))
            }
            StoreConfig::File { path } => {
                let store = FileSettingsStore::open(path).await?;
                if !path.exists() {
                    store.sync().await?;
                }
                Ok(Box::new(store))
            }
            StoreConfig::Memory => Ok(Box::new(MemorySettingsStore::new())),
        }
    }
}
