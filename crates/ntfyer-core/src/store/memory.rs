// # Memory Settings Store
//
// In-memory implementation of SettingsStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across runs.
// Useful for tests and for embedding the facade in a longer-lived process
// that manages persistence itself.
//
// ## Crash Behavior
//
// - All settings and history are lost when the process exits
// - A fresh store has no properties; callers must initialize defaults

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::traits::settings_store::{
    HistoryEntry, HistoryLog, Property, PropertyStore, SettingsStore,
};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct MemoryState {
    settings: HashMap<String, String>,
    history: Vec<HistoryEntry>,
}

/// In-memory settings store implementation
///
/// Settings live in a HashMap and history in a Vec, both behind one RwLock,
/// so a commit updates them under a single write guard.
///
/// # Example
///
/// ```rust,no_run
/// use ntfyer_core::store::MemorySettingsStore;
/// use ntfyer_core::traits::{HistoryEntry, PropertyStore, SettingsStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySettingsStore::new();
///
///     store.commit(&HistoryEntry::now("TOPIC", "alerts")).await?;
///     assert_eq!(store.get("TOPIC").await?, "alerts");
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemorySettingsStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live properties
    pub async fn len(&self) -> usize {
        self.inner.read().await.settings.len()
    }

    /// Check if no property has been written
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.settings.is_empty()
    }

    /// Number of history entries across all properties
    pub async fn history_len(&self) -> usize {
        self.inner.read().await.history.len()
    }
}

#[async_trait]
impl PropertyStore for MemorySettingsStore {
    async fn get(&self, name: &str) -> Result<String> {
        let guard = self.inner.read().await;
        guard
            .settings
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("property '{}'", name)))
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.settings.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Property>> {
        let guard = self.inner.read().await;
        let mut properties: Vec<Property> = guard
            .settings
            .iter()
            .map(|(name, value)| Property::new(name.clone(), value.clone()))
            .collect();
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(properties)
    }

    async fn unset(&self, name: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.settings.remove(name);
        Ok(())
    }
}

#[async_trait]
impl HistoryLog for MemorySettingsStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.history.push(entry.clone());
        Ok(())
    }

    async fn entries(&self, name: Option<&str>) -> Result<Vec<HistoryEntry>> {
        let guard = self.inner.read().await;
        Ok(guard
            .history
            .iter()
            .filter(|entry| name.is_none_or(|n| entry.name == n))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn commit(&self, entry: &HistoryEntry) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard
            .settings
            .insert(entry.name.clone(), entry.value.clone());
        guard.history.push(entry.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
