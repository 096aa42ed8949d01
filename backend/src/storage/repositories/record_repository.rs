use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, warn};

use crate::storage::collection::Collection;
use crate::storage::connection::DbConnection;
use crate::storage::error::StoreResult;
use crate::storage::record::{record_key, record_session_id, Record};
use crate::storage::traits::RecordStorage;

/// SQLite-backed local store: one table per collection, the record kept as
/// its JSON text next to its key and session id
#[derive(Clone)]
pub struct RecordRepository {
    db: DbConnection,
}

impl RecordRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Key, indexed session id and JSON text for one record
    fn prepare(collection: Collection, record: &Record) -> StoreResult<(String, Option<String>, String)> {
        let key = record_key(collection, record)?;
        let session_id = if collection.has_session_index() {
            record_session_id(record)
        } else {
            None
        };
        let data = serde_json::to_string(record)?;
        Ok((key, session_id, data))
    }

    fn upsert_sql(collection: Collection) -> String {
        format!(
            "INSERT INTO {} (id, session_id, data) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET session_id = excluded.session_id, data = excluded.data",
            collection.table_name()
        )
    }

    /// Upsert each batch inside one shared transaction, emptying a batch's
    /// table first when `clear_first` is set. Every record of every batch is
    /// validated before the transaction opens.
    async fn write_batches(&self, batches: &[(Collection, &[Record])], clear_first: bool) -> StoreResult<usize> {
        let prepared = batches
            .iter()
            .map(|(collection, records)| {
                records
                    .iter()
                    .map(|record| Self::prepare(*collection, record))
                    .collect::<StoreResult<Vec<_>>>()
                    .map(|rows| (*collection, rows))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let mut tx = self.db.pool().begin().await?;
        let mut written = 0;
        for (collection, rows) in &prepared {
            if clear_first {
                let clear = format!("DELETE FROM {}", collection.table_name());
                sqlx::query(&clear).execute(&mut *tx).await?;
            }
            let sql = Self::upsert_sql(*collection);
            for (key, session_id, data) in rows {
                sqlx::query(&sql)
                    .bind(key.as_str())
                    .bind(session_id.as_deref())
                    .bind(data.as_str())
                    .execute(&mut *tx)
                    .await?;
            }
            debug!("Wrote {} {} records in one transaction", rows.len(), collection);
            written += rows.len();
        }
        tx.commit().await?;

        Ok(written)
    }

    fn decode(rows: Vec<sqlx::sqlite::SqliteRow>) -> StoreResult<Vec<Record>> {
        rows.iter()
            .map(|row| -> StoreResult<Record> {
                let data: String = row.get("data");
                Ok(serde_json::from_str(&data)?)
            })
            .collect()
    }
}

#[async_trait]
impl RecordStorage for RecordRepository {
    async fn save(&self, collection: Collection, record: &Record) -> StoreResult<()> {
        let (key, session_id, data) = Self::prepare(collection, record)?;
        let sql = Self::upsert_sql(collection);

        sqlx::query(&sql)
            .bind(key.as_str())
            .bind(session_id)
            .bind(data)
            .execute(self.db.pool())
            .await?;

        debug!("Saved {} record {}", collection, key);
        Ok(())
    }

    async fn save_all_atomic(&self, collection: Collection, records: &[Record]) -> StoreResult<usize> {
        self.write_batches(&[(collection, records)], false).await
    }

    async fn replace_all(&self, batches: &[(Collection, &[Record])]) -> StoreResult<usize> {
        self.write_batches(batches, true).await
    }

    async fn get_all(&self, collection: Collection, session_id: Option<&str>) -> StoreResult<Vec<Record>> {
        let table = collection.table_name();
        let rows = match session_id {
            Some(session_id) if collection.has_session_index() => {
                let sql = format!("SELECT data FROM {table} WHERE session_id = ? ORDER BY rowid");
                sqlx::query(&sql)
                    .bind(session_id)
                    .fetch_all(self.db.pool())
                    .await?
            }
            _ => {
                if session_id.is_some() {
                    warn!("Collection '{}' has no session index, returning every record", collection);
                }
                let sql = format!("SELECT data FROM {table} ORDER BY rowid");
                sqlx::query(&sql).fetch_all(self.db.pool()).await?
            }
        };

        Self::decode(rows)
    }

    async fn get_by_id(&self, collection: Collection, id: &str) -> StoreResult<Option<Record>> {
        let sql = format!("SELECT data FROM {} WHERE id = ?", collection.table_name());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => {
                let data: String = row.get("data");
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", collection.table_name());
        let result = sqlx::query(&sql).bind(id).execute(self.db.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, collection: Collection) -> StoreResult<u64> {
        let sql = format!("DELETE FROM {}", collection.table_name());
        let result = sqlx::query(&sql).execute(self.db.pool()).await?;
        debug!("Cleared {} records from {}", result.rows_affected(), collection);
        Ok(result.rows_affected())
    }

    async fn count(&self, collection: Collection, session_id: Option<&str>) -> StoreResult<u64> {
        let table = collection.table_name();
        let row = match session_id {
            Some(session_id) if collection.has_session_index() => {
                let sql = format!("SELECT COUNT(*) AS n FROM {table} WHERE session_id = ?");
                sqlx::query(&sql)
                    .bind(session_id)
                    .fetch_one(self.db.pool())
                    .await?
            }
            _ => {
                let sql = format!("SELECT COUNT(*) AS n FROM {table}");
                sqlx::query(&sql).fetch_one(self.db.pool()).await?
            }
        };
        Ok(row.get::<i64, _>("n") as u64)
    }
}
