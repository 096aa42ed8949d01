//! # Storage Module
//!
//! Local persistence for the camp manager: a uniform CRUD facade over named
//! record collections, each keyed by record `id` and, for everything scoped to
//! a camp session, indexed by `sessionId`.
//!
//! ## Current Implementation
//!
//! - **Primary Storage**: one SQLite file, accessed through a SQLx pool
//! - **Collections**: one table per collection, the record kept as JSON text
//! - **Preferences**: a small key/value table (current session, migration flag)
//! - **Schema**: versioned, additive-only upgrades on open
//!
//! The store enforces no referential integrity between collections. Session
//! references are checked one level up, in the domain services.

pub mod collection;
pub mod connection;
pub mod error;
pub mod migration;
pub mod record;
pub mod repositories;
pub mod traits;

// Re-export the main types that other modules need
pub use collection::Collection;
pub use connection::{DbConnection, SCHEMA_VERSION};
pub use error::{StoreError, StoreResult};
pub use migration::{run_legacy_migration, LegacyKeySpace, MigrationReport};
pub use record::Record;
pub use repositories::{PreferenceRepository, RecordRepository, CURRENT_SESSION_KEY};
pub use traits::{PreferenceStorage, RecordStorage};
