// # ntfyer-core
//
// Core library for ntfyer, a local settings store paired with a
// notification sender.
//
// ## Architecture Overview
//
// - **PropertyStore**: Current value per named property
// - **HistoryLog**: Append-only audit record of every write
// - **SettingsStore**: Backend implementing both, with an atomic `commit`
// - **Settings**: Facade that writes through `commit`, reads values, writes
//   defaults and derives the notifier URL (`{URL}/{TOPIC}`)
// - **Notifier**: Trait for delivering a notification (HTTP implementation
//   lives in `ntfyer-notifier-http`)
// - **bootstrap**: Create the store with defaults on first use
//
// ## Design Principles
//
// 1. **History never loses a write**: a value and its history entry are
//    committed together or not at all
// 2. **Reads follow the last commit**: no caching of property values
// 3. **No hidden globals**: schemas and HTTP clients are passed in explicitly

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod settings;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use bootstrap::{BootstrapOutcome, Bootstrapped, bootstrap, ensure_store_exists};
pub use config::{AppConfig, Environ};
pub use error::{Error, Result};
pub use settings::{DEFAULTS, Settings, keys};
pub use store::{FileSettingsStore, MemorySettingsStore, Schema, SqliteSettingsStore, StoreConfig};
pub use traits::{HistoryEntry, HistoryLog, Notifier, Property, PropertyStore, SettingsStore};
