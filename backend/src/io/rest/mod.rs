//! # REST API Interface Layer
//!
//! HTTP endpoints for the camp manager. Handlers are a pure translation layer:
//! they extract the request, call one domain service and map the outcome to a
//! status code.
//!
//! ## Error mapping
//!
//! - storage failures (`StoreError::Database`, `Serialization`) → 500
//! - bad input (unknown collection or session, malformed record) → 400
//! - unreadable import files (`ImportError`) → 422
//! - anything reported as "not found" → 404
//! - other validation failures → 400

pub mod export_apis;
pub mod participant_apis;
pub mod record_apis;
pub mod session_apis;

pub use export_apis::*;
pub use participant_apis::*;
pub use record_apis::*;
pub use session_apis::*;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::domain::import::ImportError;
use crate::storage::StoreError;

/// Status code for a failed domain call
pub fn error_status(error: &anyhow::Error) -> StatusCode {
    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        return match store_error {
            StoreError::Database(_) | StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
    }
    if error.downcast_ref::<ImportError>().is_some() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    if error.to_string().contains("not found") {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_REQUEST
    }
}

/// Log a failed action and turn it into a response
pub(crate) fn error_response(action: &str, error: anyhow::Error) -> Response {
    error!("Failed to {}: {:#}", action, error);
    (error_status(&error), format!("{:#}", error)).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::domain::import::ImportLayout;
    use crate::storage::DbConnection;
    use crate::{build_state, create_router, AppState};

    pub async fn test_app() -> (Router, AppState) {
        let db = DbConnection::open_in_memory().await.expect("Failed to open test database");
        let state = build_state(db, ImportLayout::default()).await.expect("Failed to build state");
        (create_router(state.clone(), "http://localhost:8080"), state)
    }

    pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send(app, method, uri, body).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::ImportError;

    #[test]
    fn test_error_status_mapping() {
        let unknown: anyhow::Error = StoreError::UnknownSession("session::1".into()).into();
        assert_eq!(error_status(&unknown), StatusCode::BAD_REQUEST);

        let wrapped = anyhow::Error::from(StoreError::Database(sqlx::Error::PoolClosed)).context("Failed to list staff");
        assert_eq!(error_status(&wrapped), StatusCode::INTERNAL_SERVER_ERROR);

        let import: anyhow::Error = ImportError::NoSheet.into();
        assert_eq!(error_status(&import), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(error_status(&anyhow::anyhow!("Session not found: x")), StatusCode::NOT_FOUND);
        assert_eq!(error_status(&anyhow::anyhow!("Session name cannot be empty")), StatusCode::BAD_REQUEST);
    }
}
