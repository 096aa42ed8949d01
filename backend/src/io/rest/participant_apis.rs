//! # REST API for Participants
//!
//! Participants of the current session and roster spreadsheet import. The
//! uploaded file is sent as the raw request body; its name (for format
//! detection) goes in the `file_name` query parameter.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use super::error_response;
use crate::domain::SessionContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub file_name: String,
}

fn require_context(state: &AppState) -> Result<SessionContext, Response> {
    state.session_service.current_context().ok_or_else(|| {
        warn!("No current session selected");
        (StatusCode::BAD_REQUEST, "No current session selected").into_response()
    })
}

/// List participants of the current session
pub async fn list_participants(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/participants");

    let ctx = match require_context(&state) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    match state.participant_service.list_participants(&ctx).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("list participants", e),
    }
}

/// Import a roster spreadsheet into the current session
pub async fn import_participants(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> impl IntoResponse {
    info!("POST /api/participants/import - file: {} ({} bytes)", query.file_name, body.len());

    let ctx = match require_context(&state) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    match state
        .participant_service
        .import_spreadsheet(&ctx, &body, &query.file_name)
        .await
    {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("import participants", e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{send, send_json, test_app};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use shared::CreateSessionRequest;
    use tower::ServiceExt;

    async fn upload(app: &axum::Router, file_name: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/participants/import?file_name={}", file_name))
            .header("content-type", "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_import_requires_current_session() {
        let (app, _) = test_app().await;
        let (status, _) = upload(&app, "roster.csv", b"x".to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "GET", "/api/participants", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_import_then_list() {
        let (app, state) = test_app().await;
        state
            .session_service
            .create_session(CreateSessionRequest { name: "Été".into() })
            .await
            .unwrap();

        let mut csv = "entête;;;\n".repeat(6);
        csv.push_str("MOREAU Jade;04/07/13;;F;;Portable: 06.11.22.33.44\n");
        csv.push_str("FAURE Tom;bientôt;;M\n");
        let (status, body) = upload(&app, "roster.csv", csv.into_bytes()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["imported"].as_array().unwrap().len(), 1);
        assert_eq!(body["rejected"][0]["row"], 8);

        let (status, body) = send_json(&app, "GET", "/api/participants", None).await;
        assert_eq!(status, StatusCode::OK);
        let participants = body["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0]["phone"], "0611223344");
        assert_eq!(participants[0]["gender"], "F");
    }

    #[tokio::test]
    async fn test_unreadable_upload_is_unprocessable() {
        let (app, state) = test_app().await;
        state
            .session_service
            .create_session(CreateSessionRequest { name: "Été".into() })
            .await
            .unwrap();

        let (status, _) = upload(&app, "roster.xlsx", b"not a workbook".to_vec()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (_, body) = send_json(&app, "GET", "/api/participants", None).await;
        assert!(body["participants"].as_array().unwrap().is_empty());
    }
}
