//! # REST API for Data Export
//!
//! Full-database JSON export and restore.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::Value;
use tracing::info;

use super::error_response;
use crate::AppState;

/// Export every collection as one JSON document
pub async fn export_data(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/export");

    match state.export_service.export_all().await {
        Ok(document) => (StatusCode::OK, Json(document)).into_response(),
        Err(e) => error_response("export data", e),
    }
}

/// Replace the database content with a previous export
pub async fn restore_data(State(state): State<AppState>, Json(document): Json<Value>) -> impl IntoResponse {
    info!("POST /api/export/restore");

    match state.export_service.restore(&document).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("restore data", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, send_json, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_export_and_restore() {
        let (app, _) = test_app().await;
        send(&app, "PUT", "/api/collections/comptabilite", Some(json!({"id": "c1", "montant": 12.5}))).await;

        let (status, document) = send_json(&app, "GET", "/api/export", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(document["collections"]["comptabilite"][0]["montant"], 12.5);

        send(&app, "DELETE", "/api/collections/comptabilite", None).await;

        let (status, body) = send_json(&app, "POST", "/api/export/restore", Some(document)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collections"]["comptabilite"], 1);

        let (status, _) = send(&app, "GET", "/api/collections/comptabilite/c1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_restore_rejects_document_without_collections() {
        let (app, _) = test_app().await;
        let (status, _) = send(&app, "POST", "/api/export/restore", Some(json!({"version": 2}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
