//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that let the contract tests
//! inject storage failures and observe notifier calls.

#![allow(dead_code)]

use ntfyer_core::error::{Error, Result};
use ntfyer_core::traits::{
    HistoryEntry, HistoryLog, Notifier, Property, PropertyStore, SettingsStore,
};
use ntfyer_core::MemorySettingsStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A settings store whose history appends can be made to fail
///
/// It uses the default, compensating `SettingsStore::commit`, so it
/// exercises the rollback path that backends without transactions rely on.
#[derive(Clone)]
pub struct FlakyHistoryStore {
    inner: MemorySettingsStore,
    fail_appends: Arc<AtomicBool>,
    fail_sets: Arc<AtomicBool>,
    append_calls: Arc<AtomicUsize>,
}

impl FlakyHistoryStore {
    pub fn new() -> Self {
        Self {
            inner: MemorySettingsStore::new(),
            fail_appends: Arc::new(AtomicBool::new(false)),
            fail_sets: Arc::new(AtomicBool::new(false)),
            append_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every following `append` fail (or succeed again)
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make every following `set` fail (or succeed again)
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Number of times `append` was called, including failed calls
    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PropertyStore for FlakyHistoryStore {
    async fn get(&self, name: &str) -> Result<String> {
        self.inner.get(name).await
    }

    async fn set(&self, name: &str, value: &str) -> Result<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(Error::storage("injected set failure"));
        }
        self.inner.set(name, value).await
    }

    async fn list(&self) -> Result<Vec<Property>> {
        self.inner.list().await
    }

    async fn unset(&self, name: &str) -> Result<()> {
        self.inner.unset(name).await
    }
}

#[async_trait::async_trait]
impl HistoryLog for FlakyHistoryStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(Error::storage("injected append failure"));
        }
        self.inner.append(entry).await
    }

    async fn entries(&self, name: Option<&str>) -> Result<Vec<HistoryEntry>> {
        self.inner.entries(name).await
    }
}

#[async_trait::async_trait]
impl SettingsStore for FlakyHistoryStore {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// A notifier that records what it was asked to send
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(notifier_url, text)` pairs in call order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notifier_url: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((notifier_url.to_string(), text.to_string()));
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}
