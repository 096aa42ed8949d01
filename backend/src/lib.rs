//! # Camp Manager Backend
//!
//! Local backend for managing youth-camp sessions: participants, staff,
//! schedules, medical follow-up, accounting and the incident log.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (sessions, records, participants, import, export)
//!     ↓
//! Storage Layer (SQLite collections, preferences, legacy migration)
//! ```
//!
//! The backend owns no UI. A browser frontend talks to it over `/api`.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::import::ImportLayout;
use crate::domain::{ExportService, ParticipantService, RecordService, SessionService};
use crate::storage::{
    run_legacy_migration, DbConnection, LegacyKeySpace, PreferenceRepository, PreferenceStorage,
    RecordRepository, RecordStorage,
};

/// Spreadsheets can be larger than axum's default body limit
const IMPORT_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub session_service: SessionService,
    pub record_service: RecordService,
    pub participant_service: ParticipantService,
    pub export_service: ExportService,
}

/// Wire the services on top of an open database and load the session
/// registry
pub async fn build_state(db: DbConnection, layout: ImportLayout) -> Result<AppState> {
    let records: Arc<dyn RecordStorage> = Arc::new(RecordRepository::new(db.clone()));
    let preferences: Arc<dyn PreferenceStorage> = Arc::new(PreferenceRepository::new(db));

    let session_service = SessionService::new(records.clone(), preferences);
    session_service.load().await?;

    Ok(AppState {
        record_service: RecordService::new(records.clone()),
        participant_service: ParticipantService::new(records.clone(), layout),
        export_service: ExportService::new(records, session_service.clone()),
        session_service,
    })
}

/// Open the database described by `config`, run the one-time legacy
/// migration and build the application state
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    config.ensure_data_directory()?;
    let db = DbConnection::open(&config.database_path())
        .await
        .context("Failed to open database")?;

    migrate_legacy_data(&db, config).await?;

    info!("Setting up domain model");
    build_state(db, config.import.clone()).await
}

async fn migrate_legacy_data(db: &DbConnection, config: &AppConfig) -> Result<()> {
    let legacy = match &config.legacy_dump {
        Some(path) => match LegacyKeySpace::load(path) {
            Ok(space) => Some(space),
            Err(e) => {
                // Leave the flag unset so a fixed dump is picked up next start
                warn!("Legacy dump {:?} unreadable, migration postponed: {:#}", path, e);
                return Ok(());
            }
        },
        None => None,
    };

    let records = RecordRepository::new(db.clone());
    let preferences = PreferenceRepository::new(db.clone());
    let report = run_legacy_migration(&records, &preferences, legacy.as_ref()).await?;
    if !report.skipped {
        info!(
            "Legacy migration done: {:?} migrated, {} keys failed",
            report.migrated,
            report.failed_keys.len()
        );
    }
    Ok(())
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, allowed_origin: &str) -> Router {
    // CORS setup to allow the frontend to make requests
    let cors = match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => {
            warn!("Invalid allowed origin '{}', accepting any origin", allowed_origin);
            CorsLayer::new().allow_origin(Any)
        }
    }
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers(Any);

    let api_routes = Router::new()
        .route("/sessions", get(io::list_sessions).post(io::create_session))
        .route(
            "/sessions/current",
            get(io::get_current_session).put(io::switch_session),
        )
        .route("/sessions/:id", delete(io::delete_session))
        .route(
            "/collections/:collection",
            get(io::list_records)
                .put(io::save_record)
                .delete(io::clear_collection),
        )
        .route("/collections/:collection/batch", post(io::save_records_batch))
        .route(
            "/collections/:collection/:id",
            get(io::get_record).delete(io::delete_record),
        )
        .route("/participants", get(io::list_participants))
        .route(
            "/participants/import",
            post(io::import_participants).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/export", get(io::export_data))
        .route("/export/restore", post(io::restore_data));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CURRENT_SESSION_KEY;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> AppConfig {
        AppConfig {
            data_directory: temp_dir.path().join("data"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_backend_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let state = initialize_backend(&config).await.unwrap();
        assert!(config.database_path().exists());
        assert!(state.session_service.list_sessions().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_backend_migrates_legacy_dump_once() {
        let temp_dir = TempDir::new().unwrap();
        let dump = temp_dir.path().join("localStorage.json");
        fs::write(
            &dump,
            serde_json::json!({
                "sessions": r#"[{"id": "session::1", "name": "Été 2023", "createdAt": ""}]"#,
                "staff": r#"[{"nom": "Karim", "sessionId": "session::1"}]"#,
                "currentSessionId": "session::1"
            })
            .to_string(),
        )
        .unwrap();
        let mut config = test_config(&temp_dir);
        config.legacy_dump = Some(dump.clone());

        let state = initialize_backend(&config).await.unwrap();
        assert_eq!(state.session_service.current_session().unwrap().name, "Été 2023");
        let staff = state.record_service.list(storage::Collection::Staff, Some("session::1")).await.unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0]["id"], "legacy-staff-0");

        // Second start: the flag is set, edits made since are not overwritten
        state.record_service.clear(storage::Collection::Staff).await.unwrap();
        drop(state);
        let state = initialize_backend(&config).await.unwrap();
        assert!(state.record_service.list(storage::Collection::Staff, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_dump_postpones_migration() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.legacy_dump = Some(temp_dir.path().join("missing.json"));

        initialize_backend(&config).await.unwrap();

        let db = DbConnection::open(&config.database_path()).await.unwrap();
        let preferences = PreferenceRepository::new(db);
        assert_eq!(preferences.get_preference(storage::migration::MIGRATION_FLAG).await.unwrap(), None);
        assert_eq!(preferences.get_preference(CURRENT_SESSION_KEY).await.unwrap(), None);
    }
}
