//! Generic access to record collections with session references checked on
//! write.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::SessionContext;
use crate::storage::record::{record_session_id, set_record_session_id};
use crate::storage::{Collection, Record, RecordStorage, StoreError};

/// Service for reading and writing records of any collection
#[derive(Clone)]
pub struct RecordService {
    records: Arc<dyn RecordStorage>,
}

impl RecordService {
    pub fn new(records: Arc<dyn RecordStorage>) -> Self {
        Self { records }
    }

    /// All records of `collection`, or only those of `session_id` when the
    /// collection is session-scoped and an id is given
    pub async fn list(&self, collection: Collection, session_id: Option<&str>) -> Result<Vec<Record>> {
        info!("Listing {} (session: {:?})", collection, session_id);

        let records = self
            .records
            .get_all(collection, session_id)
            .await
            .with_context(|| format!("Failed to list {}", collection))?;

        info!("Found {} records in {}", records.len(), collection);
        Ok(records)
    }

    pub async fn list_in_session(&self, ctx: &SessionContext, collection: Collection) -> Result<Vec<Record>> {
        self.list(collection, Some(ctx.session_id())).await
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let record = self.records.get_by_id(collection, id).await?;
        if record.is_none() {
            warn!("Record not found: {}/{}", collection, id);
        }
        Ok(record)
    }

    /// Upsert one record after checking its session reference
    pub async fn save(&self, collection: Collection, record: &Record) -> Result<()> {
        Self::check_writable(collection)?;
        self.check_session_reference(collection, record).await?;
        self.records.save(collection, record).await?;
        Ok(())
    }

    /// Stamp `record` with the context's session, then save it
    pub async fn save_in_session(
        &self,
        ctx: &SessionContext,
        collection: Collection,
        mut record: Record,
    ) -> Result<Record> {
        if collection.has_session_index() {
            set_record_session_id(&mut record, ctx.session_id());
        }
        self.save(collection, &record).await?;
        Ok(record)
    }

    /// Upsert a batch one record at a time. Not atomic: records saved before
    /// a failing one stay saved.
    pub async fn save_many(&self, collection: Collection, records: &[Record]) -> Result<usize> {
        info!("Saving {} records into {}", records.len(), collection);
        Self::check_writable(collection)?;
        for record in records {
            self.check_session_reference(collection, record).await?;
            self.records.save(collection, record).await?;
        }
        Ok(records.len())
    }

    pub async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        info!("Deleting {}/{}", collection, id);
        Self::check_writable(collection)?;
        let removed = self.records.delete(collection, id).await?;
        if !removed {
            warn!("Nothing to delete at {}/{}", collection, id);
        }
        Ok(removed)
    }

    pub async fn clear(&self, collection: Collection) -> Result<u64> {
        Self::check_writable(collection)?;
        let removed = self.records.clear(collection).await?;
        info!("Cleared {} records from {}", removed, collection);
        Ok(removed)
    }

    /// The session list is owned by the session registry
    fn check_writable(collection: Collection) -> Result<()> {
        if matches!(collection, Collection::Sessions) {
            return Err(anyhow::anyhow!("Sessions can only be changed through the session endpoints"));
        }
        Ok(())
    }

    /// Reject a `sessionId` naming no known session. A session-scoped record
    /// without one is accepted with a warning.
    pub async fn check_session_reference(&self, collection: Collection, record: &Record) -> Result<()> {
        if !collection.has_session_index() {
            return Ok(());
        }
        match record_session_id(record) {
            Some(session_id) => {
                if self.records.get_by_id(Collection::Sessions, &session_id).await?.is_none() {
                    return Err(StoreError::UnknownSession(session_id).into());
                }
            }
            None => warn!("Record written to {} without a session", collection),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DbConnection, RecordRepository};
    use serde_json::json;
    use shared::Session;

    async fn setup_test() -> (RecordService, Arc<RecordRepository>) {
        let db = DbConnection::open_in_memory().await.expect("Failed to open test database");
        let records = Arc::new(RecordRepository::new(db));
        for id in ["session::1", "session::2"] {
            records
                .save(Collection::Sessions, &json!({"id": id, "name": id, "createdAt": ""}))
                .await
                .unwrap();
        }
        (RecordService::new(records.clone()), records)
    }

    fn ctx(id: &str) -> SessionContext {
        SessionContext::new(Session {
            id: id.to_string(),
            name: id.to_string(),
            created_at: String::new(),
        })
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_session() {
        let (service, records) = setup_test().await;
        let record = json!({"id": "evt::1", "sessionId": "session::9"});

        let err = service.save(Collection::Events, &record).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::UnknownSession(_))));
        assert_eq!(records.get_by_id(Collection::Events, "evt::1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_without_session_is_accepted() {
        let (service, _) = setup_test().await;
        service.save(Collection::Events, &json!({"id": "evt::1"})).await.unwrap();
        assert!(service.get(Collection::Events, "evt::1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_switching_context_filters_lists() {
        let (service, _) = setup_test().await;
        let summer = ctx("session::1");
        let autumn = ctx("session::2");

        service.save_in_session(&summer, Collection::Staff, json!({"id": "a"})).await.unwrap();
        service.save_in_session(&summer, Collection::Staff, json!({"id": "b"})).await.unwrap();
        service.save_in_session(&autumn, Collection::Staff, json!({"id": "c"})).await.unwrap();

        let listed = service.list_in_session(&summer, Collection::Staff).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r["sessionId"] == "session::1"));
        assert_eq!(service.list(Collection::Staff, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_save_many_stops_at_first_bad_record() {
        let (service, _) = setup_test().await;
        let batch = vec![
            json!({"id": "a", "sessionId": "session::1"}),
            json!({"id": "b", "sessionId": "session::404"}),
            json!({"id": "c", "sessionId": "session::1"}),
        ];

        assert!(service.save_many(Collection::Rooms, &batch).await.is_err());
        assert!(service.get(Collection::Rooms, "a").await.unwrap().is_some());
        assert!(service.get(Collection::Rooms, "c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (service, _) = setup_test().await;
        service.save(Collection::Signatures, &json!({"id": "s1"})).await.unwrap();
        service.save(Collection::Signatures, &json!({"id": "s2"})).await.unwrap();

        assert!(service.delete(Collection::Signatures, "s1").await.unwrap());
        assert!(!service.delete(Collection::Signatures, "s1").await.unwrap());
        assert_eq!(service.clear(Collection::Signatures).await.unwrap(), 1);
        assert!(service.list(Collection::Signatures, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_collection_is_read_only_here() {
        let (service, _) = setup_test().await;
        let session = json!({"id": "session::3", "name": "x", "createdAt": ""});

        assert!(service.save(Collection::Sessions, &session).await.is_err());
        assert!(service.delete(Collection::Sessions, "session::1").await.is_err());
        assert!(service.clear(Collection::Sessions).await.is_err());
        assert_eq!(service.list(Collection::Sessions, None).await.unwrap().len(), 2);
    }
}
