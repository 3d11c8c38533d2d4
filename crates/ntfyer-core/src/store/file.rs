// # File Settings Store
//
// JSON-file implementation of SettingsStore with crash recovery.
//
// ## Purpose
//
// Keeps settings and their history in a single human-readable file. Because
// both live in one document, a commit is made durable by a single atomic
// file replace: either the new value and its history entry are on disk, or
// neither is.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good document
// - Recovery: Falls back to backup if corruption detected; fails if neither parses
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "settings": { "URL": "https://ntfy.sh", "TOPIC": "test_topic" },
//   "history": [
//     { "name": "URL", "value": "https://ntfy.sh", "updated_at": "2025-01-09T12:00:00Z" }
//   ]
// }
// ```
//
// A flat object of strings (`{"URL": "https://ntfy.sh", ...}`) is also
// accepted on load. It carries no history and is rewritten in the versioned
// format on the next write.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::traits::settings_store::{
    HistoryEntry, HistoryLog, Property, PropertyStore, SettingsStore,
};
use crate::{Error, Result};

/// Settings file format version
const SETTINGS_FILE_VERSION: &str = "1.0";

/// File-based settings store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use ntfyer_core::store::FileSettingsStore;
/// use ntfyer_core::traits::{HistoryEntry, PropertyStore, SettingsStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSettingsStore::open("settings.json").await?;
///
///     store.commit(&HistoryEntry::now("TOPIC", "alerts")).await?;
///     assert_eq!(store.get("TOPIC").await?, "alerts");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// In-memory mirror of the settings file
#[derive(Debug, Clone, Default)]
struct FileState {
    settings: BTreeMap<String, String>,
    history: Vec<HistoryEntry>,
}

/// Serializable settings file format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SettingsFileFormat {
    version: String,
    settings: BTreeMap<String, String>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

/// Everything the loader accepts
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Versioned(SettingsFileFormat),
    Flat(BTreeMap<String, String>),
}

impl FileSettingsStore {
    /// Open or create a file settings store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing file
    /// 3. If corruption detected, try to load from backup
    /// 4. If there is no file yet, start empty (nothing is written until the first write)
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let state = Self::load_state_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state from file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main file
    /// 2. If JSON parse error, try loading backup
    /// 3. If there is no usable backup, fail with `StorageUnavailable`
    async fn load_state_with_recovery(path: &Path) -> Result<FileState> {
        match Self::load_state(path).await {
            Ok(state) => {
                tracing::debug!(
                    "Loaded settings from {}: {} properties, {} history entries",
                    path.display(),
                    state.settings.len(),
                    state.history.len()
                );
                Ok(state)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Settings file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::error!("No backup file found for {}", path.display());
                    return Err(Error::storage(format!(
                        "Settings file {} is corrupted and has no backup: {}",
                        path.display(),
                        e
                    )));
                }

                match Self::load_state(&backup_path).await {
                    Ok(state) => {
                        tracing::info!(
                            "Recovered settings from backup: {} properties",
                            state.settings.len()
                        );
                        if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await {
                            tracing::error!(
                                "Failed to restore settings file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(state)
                    }
                    Err(backup_err) => {
                        tracing::error!("Backup also corrupted: {}", backup_err);
                        Err(Error::storage(format!(
                            "Settings file {} and its backup are both unreadable: {}",
                            path.display(),
                            backup_err
                        )))
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load state from file
    async fn load_state(path: &Path) -> Result<FileState> {
        if !path.exists() {
            tracing::debug!("Settings file does not exist yet: {}", path.display());
            return Ok(FileState::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        match serde_json::from_str::<OnDisk>(&content)? {
            OnDisk::Versioned(file) => {
                if file.version != SETTINGS_FILE_VERSION {
                    tracing::warn!(
                        "Settings file version mismatch: expected {}, got {}. \
                        Attempting to load anyway.",
                        SETTINGS_FILE_VERSION,
                        file.version
                    );
                }
                Ok(FileState {
                    settings: file.settings,
                    history: file.history,
                })
            }
            OnDisk::Flat(settings) => {
                tracing::info!(
                    "Loaded flat settings file {} without history; it will be upgraded on next write",
                    path.display()
                );
                Ok(FileState {
                    settings,
                    history: Vec::new(),
                })
            }
        }
    }

    /// Write state to file atomically
    async fn write_state(&self, state: &FileState) -> Result<()> {
        let file = SettingsFileFormat {
            version: SETTINGS_FILE_VERSION.to_string(),
            settings: state.settings.clone(),
            history: state.history.clone(),
        };

        let json = serde_json::to_string_pretty(&file)?;

        let temp_path = self.temp_path();
        {
            let mut handle = fs::File::create(&temp_path).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.write_all(json.as_bytes()).await.map_err(|e| {
                Error::storage(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.flush().await.map_err(|e| {
                Error::storage(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Settings written to file: {}", self.path.display());
        Ok(())
    }

    /// Apply `change` to a copy of the state and swap it in only once it is on disk
    async fn apply<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut FileState) + Send,
    {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();
        change(&mut next);
        self.write_state(&next).await?;
        *guard = next;
        Ok(())
    }

    /// Restore settings file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<()> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::storage(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored settings file from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Force immediate write to disk
    ///
    /// Used by bootstrap so a freshly created store exists on disk even
    /// before its first write.
    pub async fn sync(&self) -> Result<()> {
        let guard = self.state.read().await;
        self.write_state(&guard).await
    }
}

#[async_trait]
impl PropertyStore for FileSettingsStore {
    async fn get(&self, name: &str) -> Result<String> {
        let guard = self.state.read().await;
        guard
            .settings
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("property '{}'", name)))
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        let (name, value) = (name.to_string(), value.to_string());
        self.apply(move |state| {
            state.settings.insert(name, value);
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Property>> {
        let guard = self.state.read().await;
        Ok(guard
            .settings
            .iter()
            .map(|(name, value)| Property::new(name.clone(), value.clone()))
            .collect())
    }

    async fn unset(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.apply(move |state| {
            state.settings.remove(&name);
        })
        .await
    }
}

#[async_trait]
impl HistoryLog for FileSettingsStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let entry = entry.clone();
        self.apply(move |state| state.history.push(entry)).await
    }

    async fn entries(&self, name: Option<&str>) -> Result<Vec<HistoryEntry>> {
        let guard = self.state.read().await;
        Ok(guard
            .history
            .iter()
            .filter(|entry| name.is_none_or(|n| entry.name == n))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn commit(&self, entry: &HistoryEntry) -> Result<()> {
        let entry = entry.clone();
        self.apply(move |state| {
            state
                .settings
                .insert(entry.name.clone(), entry.value.clone());
            state.history.push(entry);
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
