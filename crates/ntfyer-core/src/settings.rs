//! Configuration facade
//!
//! [`Settings`] is the only way the application writes configuration. It
//! owns a [`SettingsStore`] and is responsible for:
//! - Committing every write together with its history entry
//! - Reading current values
//! - Writing the default configuration
//! - Keeping the derived notifier URL (`{URL}/{TOPIC}`) current
//!
//! ## Derived State
//!
//! The notifier URL is computed once on construction and again after every
//! write to `URL` or `TOPIC`. It is cached on the instance and is not
//! refreshed if another process changes the store; a `Settings` value is
//! meant to live for one command.

use crate::error::{Error, Result};
use crate::traits::{HistoryEntry, Notifier, Property, SettingsStore};
use tracing::{debug, info};

/// Recognized property names
pub mod keys {
    /// Base URL of the notification server
    pub const URL: &str = "URL";
    /// Message format
    pub const FMT: &str = "FMT";
    /// Topic appended to the base URL
    pub const TOPIC: &str = "TOPIC";
}

/// Default configuration, written in this order by [`Settings::initialize_defaults`]
pub const DEFAULTS: [(&str, &str); 3] = [
    (keys::URL, "https://ntfy.sh"),
    (keys::FMT, "md"),
    (keys::TOPIC, "test_topic"),
];

/// Configuration facade over a settings store
pub struct Settings {
    store: Box<dyn SettingsStore>,
    notifier_url: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("store", &self.store.backend_name())
            .field("notifier_url", &self.notifier_url)
            .finish()
    }
}

impl Settings {
    /// Wrap a store and compute the notifier URL from its current contents
    pub async fn new(store: Box<dyn SettingsStore>) -> Result<Self> {
        let mut settings = Self {
            store,
            notifier_url: None,
        };
        settings.refresh_notifier_url().await?;
        Ok(settings)
    }

    /// Write a property and its history entry as one unit
    ///
    /// On failure the store keeps its previous value and no history entry is
    /// added; the error is reported as [`Error::ConfigWriteFailed`].
    pub async fn write_config_value(&mut self, name: &str, value: &str) -> Result<()> {
        let entry = HistoryEntry::now(name, value);

        self.store
            .commit(&entry)
            .await
            .map_err(|e| Error::config_write_failed(name, e))?;

        info!("Setting '{}' updated to '{}'", name, value);

        if name == keys::URL || name == keys::TOPIC {
            self.refresh_notifier_url().await?;
        }

        Ok(())
    }

    /// Read the current value of a property
    ///
    /// # Returns
    ///
    /// - `Err(Error::NotFound)`: The property was never written
    /// - `Err(Error::InvariantViolation)`: The store holds more than one live value
    pub async fn read_config_value(&self, name: &str) -> Result<String> {
        self.store.get(name).await
    }

    /// Write the default configuration
    ///
    /// Every default goes through [`write_config_value`](Self::write_config_value),
    /// so each one also produces a history entry.
    pub async fn initialize_defaults(&mut self) -> Result<()> {
        for (name, value) in DEFAULTS {
            self.write_config_value(name, value).await?;
        }
        info!("Settings initialized to default values");
        Ok(())
    }

    /// The cached `{URL}/{TOPIC}` endpoint, if both properties are set
    pub fn notifier_url(&self) -> Option<&str> {
        self.notifier_url.as_deref()
    }

    /// The cached endpoint, or `NotFound` if `URL` or `TOPIC` is missing
    pub fn require_notifier_url(&self) -> Result<&str> {
        self.notifier_url()
            .ok_or_else(|| Error::not_found("notifier URL (URL and TOPIC must both be set)"))
    }

    /// Send `text` to the current notifier URL
    ///
    /// Fails with `NotFound` before any request is made when the notifier
    /// URL cannot be built.
    pub async fn send_notification(&self, notifier: &dyn Notifier, text: &str) -> Result<()> {
        let url = self.require_notifier_url()?;
        info!("Sending notification via {} to {}", notifier.notifier_name(), url);
        notifier.send(url, text).await
    }

    /// All live properties, sorted by name
    pub async fn properties(&self) -> Result<Vec<Property>> {
        self.store.list().await
    }

    /// History entries in write order, optionally for one property
    pub async fn history(&self, name: Option<&str>) -> Result<Vec<HistoryEntry>> {
        self.store.entries(name).await
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    async fn refresh_notifier_url(&mut self) -> Result<()> {
        let url = self.optional_value(keys::URL).await?;
        let topic = self.optional_value(keys::TOPIC).await?;

        self.notifier_url = match (url, topic) {
            (Some(url), Some(topic)) => Some(format!("{}/{}", url, topic)),
            _ => None,
        };

        debug!("Notifier URL is now {:?}", self.notifier_url);
        Ok(())
    }

    async fn optional_value(&self, name: &str) -> Result<Option<String>> {
        match self.store.get(name).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySettingsStore;

    async fn memory_settings() -> Settings {
        Settings::new(Box::new(MemorySettingsStore::new())).await.unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let mut settings = memory_settings().await;
        assert_eq!(settings.notifier_url(), None);

        settings.initialize_defaults().await.unwrap();

        assert_eq!(settings.read_config_value(keys::URL).await.unwrap(), "https://ntfy.sh");
        assert_eq!(settings.read_config_value(keys::FMT).await.unwrap(), "md");
        assert_eq!(settings.read_config_value(keys::TOPIC).await.unwrap(), "test_topic");
        assert_eq!(settings.notifier_url(), Some("https://ntfy.sh/test_topic"));
        assert_eq!(settings.history(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_url_change_recomputes_notifier_url() {
        let mut settings = memory_settings().await;
        settings.initialize_defaults().await.unwrap();

        settings
            .write_config_value(keys::URL, "https://ntfy.sh/test_topic")
            .await
            .unwrap();

        assert_eq!(
            settings.notifier_url(),
            Some("https://ntfy.sh/test_topic/test_topic")
        );
    }

    #[tokio::test]
    async fn test_fmt_change_keeps_notifier_url() {
        let mut settings = memory_settings().await;
        settings.initialize_defaults().await.unwrap();

        settings.write_config_value(keys::FMT, "plain").await.unwrap();

        assert_eq!(settings.notifier_url(), Some("https://ntfy.sh/test_topic"));
    }

    #[tokio::test]
    async fn test_unwritten_property_is_not_found() {
        let settings = memory_settings().await;

        let err = settings.read_config_value("MISSING").await.unwrap_err();
        assert!(err.is_not_found(), "got {err}");
        assert!(settings.require_notifier_url().unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_new_reads_existing_notifier_url() {
        let store = MemorySettingsStore::new();
        store.commit(&HistoryEntry::now(keys::URL, "https://example.com")).await.unwrap();
        store.commit(&HistoryEntry::now(keys::TOPIC, "ops")).await.unwrap();

        let settings = Settings::new(Box::new(store)).await.unwrap();
        assert_eq!(settings.notifier_url(), Some("https://example.com/ops"));
    }
}
