//! # REST API for Session Management
//!
//! Endpoints for listing, creating, deleting and switching camp sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::error_response;
use crate::AppState;
use shared::{CreateSessionRequest, CurrentSessionResponse, SessionResponse, SwitchSessionRequest};

/// List all sessions and the current one
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/sessions");
    (StatusCode::OK, Json(state.session_service.list_sessions()))
}

/// Create a session; it becomes the current one
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    info!("POST /api/sessions - request: {:?}", request);

    match state.session_service.create_session(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("create session", e),
    }
}

/// Delete a session. Records that belong to it are kept.
pub async fn delete_session(State(state): State<AppState>, Path(session_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/sessions/{}", session_id);

    match state.session_service.delete_session(&session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete session", e),
    }
}

pub async fn get_current_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/sessions/current");
    let current_session = state.session_service.current_session();
    (StatusCode::OK, Json(CurrentSessionResponse { current_session }))
}

/// Switch the current session
pub async fn switch_session(
    State(state): State<AppState>,
    Json(request): Json<SwitchSessionRequest>,
) -> impl IntoResponse {
    info!("PUT /api/sessions/current - request: {:?}", request);

    match state.session_service.switch_session(&request.session_id).await {
        Ok(ctx) => (
            StatusCode::OK,
            Json(SessionResponse {
                session: ctx.session().clone(),
                success_message: "Session switched successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response("switch session", e),
    }
}
