//! Store bootstrap
//!
//! Every command starts here: check whether the backing store exists, and if
//! it doesn't, create it and write the default configuration. Whether this
//! run created the store is reported through [`BootstrapOutcome`].

use std::path::Path;

use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::store::StoreConfig;

/// What [`bootstrap`] found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The store was missing; it was created and filled with defaults
    Created,
    /// The store already existed and was opened as-is
    Existing,
}

impl BootstrapOutcome {
    /// True on the run that created the store
    pub fn is_first_run(&self) -> bool {
        matches!(self, BootstrapOutcome::Created)
    }
}

/// An opened facade plus how it was obtained
#[derive(Debug)]
pub struct Bootstrapped {
    /// Ready-to-use configuration facade
    pub settings: Settings,
    /// Whether the store was created by this call
    pub outcome: BootstrapOutcome,
}

/// Fail with `NotFound` if there is no store at `path`
pub fn ensure_store_exists(path: &Path) -> Result<()> {
    match path.try_exists() {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::not_found(format!(
            "settings store {}",
            path.display()
        ))),
        Err(e) => Err(Error::storage(format!(
            "Failed to check settings store {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Open the configured store, creating it with defaults on first use
///
/// Only a missing store is recovered from. Any other failure is returned to
/// the caller untouched.
pub async fn bootstrap(config: &StoreConfig) -> Result<Bootstrapped> {
    // A memory store never exists before it is opened
    let missing = match config.path() {
        Some(path) => match ensure_store_exists(path) {
            Ok(()) => false,
            Err(Error::NotFound(_)) => true,
            Err(e) => return Err(e),
        },
        None => true,
    };

    let store = config.open().await?;
    let mut settings = Settings::new(store).await?;

    let outcome = if missing {
        tracing::info!(
            "Settings store not found, creating {} store with defaults",
            config.type_name()
        );
        settings.initialize_defaults().await?;
        BootstrapOutcome::Created
    } else {
        tracing::debug!("Settings store found, proceeding");
        BootstrapOutcome::Existing
    };

    Ok(Bootstrapped { settings, outcome })
}
