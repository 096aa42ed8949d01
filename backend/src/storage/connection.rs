use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::collection::Collection;
use super::error::StoreResult;

/// Current on-disk schema version. Upgrades are additive only.
pub const SCHEMA_VERSION: i64 = 2;

/// DbConnection owns the SQLite pool shared by every repository
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
    initialized: Arc<Mutex<bool>>,
}

impl DbConnection {
    /// Open (creating on first run) the database file and bring its schema
    /// up to date
    pub async fn open(path: &Path) -> StoreResult<Self> {
        info!("Opening database at {:?}", path);
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let conn = Self::from_pool(pool);
        conn.init().await?;
        Ok(conn)
    }

    /// Open a private in-memory database. A single pooled connection is kept
    /// alive for the lifetime of the pool, otherwise the data would vanish.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let conn = Self::from_pool(pool);
        conn.init().await?;
        Ok(conn)
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
            initialized: Arc::new(Mutex::new(false)),
        }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Ensure the schema is at `SCHEMA_VERSION`. Safe to call repeatedly;
    /// concurrent callers wait for the first one to finish.
    pub async fn init(&self) -> StoreResult<()> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }
        self.upgrade_to(SCHEMA_VERSION).await?;
        *initialized = true;
        Ok(())
    }

    /// Version currently recorded in the database (0 for a blank file)
    pub async fn schema_version(&self) -> StoreResult<i64> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )
        .execute(self.pool())
        .await?;

        let row = sqlx::query("SELECT version FROM schema_meta WHERE id = 1")
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("version")).unwrap_or(0))
    }

    /// Create every collection introduced after the recorded version, up to
    /// `target`, inside one transaction
    pub(crate) async fn upgrade_to(&self, target: i64) -> StoreResult<()> {
        let current = self.schema_version().await?;
        if current >= target {
            debug!("Schema already at version {}", current);
            return Ok(());
        }

        info!("Upgrading schema from version {} to {}", current, target);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *tx)
        .await?;

        for collection in Collection::ALL {
            if collection.since_version() > target {
                continue;
            }

            let table = collection.table_name();
            let create = format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    session_id TEXT,
                    data TEXT NOT NULL
                )"
            );
            sqlx::query(&create).execute(&mut *tx).await?;

            if collection.has_session_index() {
                let index = format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_session_id ON {table}(session_id)"
                );
                sqlx::query(&index).execute(&mut *tx).await?;
            }

            if collection.since_version() > current {
                debug!("Created collection '{}'", collection);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO schema_meta (id, version) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET version = excluded.version
            "#,
        )
        .bind(target)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Schema now at version {}", target);
        Ok(())
    }

    /// Whether the table backing `collection` exists
    pub async fn has_collection(&self, collection: Collection) -> StoreResult<bool> {
        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(collection.table_name())
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }
}
