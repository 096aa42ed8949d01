use async_trait::async_trait;
use sqlx::Row;

use crate::storage::connection::DbConnection;
use crate::storage::error::StoreResult;
use crate::storage::traits::PreferenceStorage;

/// Preference holding the id of the current session
pub const CURRENT_SESSION_KEY: &str = "currentSessionId";

/// Repository for the preferences key/value table
#[derive(Clone)]
pub struct PreferenceRepository {
    db: DbConnection,
}

impl PreferenceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PreferenceStorage for PreferenceRepository {
    async fn get_preference(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set_preference(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn remove_preference(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preference_lifecycle() {
        let db = DbConnection::open_in_memory().await.unwrap();
        let prefs = PreferenceRepository::new(db);

        assert_eq!(prefs.get_preference(CURRENT_SESSION_KEY).await.unwrap(), None);

        prefs.set_preference(CURRENT_SESSION_KEY, "session::1").await.unwrap();
        prefs.set_preference(CURRENT_SESSION_KEY, "session::2").await.unwrap();
        assert_eq!(
            prefs.get_preference(CURRENT_SESSION_KEY).await.unwrap(),
            Some("session::2".to_string())
        );

        prefs.remove_preference(CURRENT_SESSION_KEY).await.unwrap();
        prefs.remove_preference(CURRENT_SESSION_KEY).await.unwrap();
        assert_eq!(prefs.get_preference(CURRENT_SESSION_KEY).await.unwrap(), None);
    }
}
