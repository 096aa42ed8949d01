//! # Storage Traits
//!
//! Storage abstractions the domain layer works against, so services never
//! depend on SQLite directly.

use async_trait::async_trait;

use super::collection::Collection;
use super::error::StoreResult;
use super::record::Record;

/// Uniform CRUD facade over the record collections
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Insert the record, or fully replace the one with the same id
    async fn save(&self, collection: Collection, record: &Record) -> StoreResult<()>;

    /// Save records one after the other.
    ///
    /// Not atomic: when a record fails, the ones before it stay committed and
    /// the ones after it are never written. Returns the number saved.
    async fn save_many(&self, collection: Collection, records: &[Record]) -> StoreResult<usize> {
        for record in records {
            self.save(collection, record).await?;
        }
        Ok(records.len())
    }

    /// Save records inside a single transaction: all of them or none
    async fn save_all_atomic(&self, collection: Collection, records: &[Record]) -> StoreResult<usize>;

    /// Empty each listed collection and insert its records, all batches in
    /// one transaction. Returns the total number of records written.
    async fn replace_all(&self, batches: &[(Collection, &[Record])]) -> StoreResult<usize>;

    /// Every record in insertion order. With `session_id` on a session-indexed
    /// collection, only the records whose `sessionId` matches exactly.
    async fn get_all(&self, collection: Collection, session_id: Option<&str>) -> StoreResult<Vec<Record>>;

    /// The record with this id, if any
    async fn get_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Record>>;

    /// Remove by id. Returns false when nothing had that id.
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool>;

    /// Remove every record of the collection. Returns how many were removed.
    async fn clear(&self, collection: Collection) -> StoreResult<u64>;

    /// Record count, filtered the same way as `get_all`
    async fn count(&self, collection: Collection, session_id: Option<&str>) -> StoreResult<u64>;
}

/// Small string key/value side channel for user preferences
#[async_trait]
pub trait PreferenceStorage: Send + Sync {
    async fn get_preference(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_preference(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn remove_preference(&self, key: &str) -> StoreResult<()>;
}
