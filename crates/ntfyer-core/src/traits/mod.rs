//! Core traits for ntfyer
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PropertyStore`]: Current value per property
//! - [`HistoryLog`]: Append-only record of writes
//! - [`SettingsStore`]: Both of the above, committed together
//! - [`Notifier`]: Deliver a text notification

pub mod notifier;
pub mod settings_store;

pub use notifier::Notifier;
pub use settings_store::{HistoryEntry, HistoryLog, Property, PropertyStore, SettingsStore};
