//! # REST API for Record Collections
//!
//! Generic CRUD over any named collection (`staff`, `groups`, `plannings`,
//! `mainCourante`, ...). Records are opaque JSON objects keyed by `id`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::error_response;
use crate::storage::{Collection, StoreError};
use crate::AppState;
use shared::BatchSaveResponse;

#[derive(Debug, Deserialize)]
pub struct ListRecordsQuery {
    pub session_id: Option<String>,
}

fn parse_collection(name: &str) -> Result<Collection, axum::response::Response> {
    name.parse::<Collection>()
        .map_err(|e: StoreError| error_response("resolve collection", e.into()))
}

/// List a collection, optionally filtered by session
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListRecordsQuery>,
) -> impl IntoResponse {
    info!("GET /api/collections/{} - query: {:?}", collection, query);

    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.record_service.list(collection, query.session_id.as_deref()).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("list records", e),
    }
}

/// Insert or fully replace one record
pub async fn save_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(record): Json<Value>,
) -> impl IntoResponse {
    info!("PUT /api/collections/{}", collection);

    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.record_service.save(collection, &record).await {
        Ok(()) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response("save record", e),
    }
}

/// Save several records one after the other. Not atomic.
pub async fn save_records_batch(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(records): Json<Vec<Value>>,
) -> impl IntoResponse {
    info!("POST /api/collections/{}/batch - {} records", collection, records.len());

    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.record_service.save_many(collection, &records).await {
        Ok(saved) => (
            StatusCode::OK,
            Json(BatchSaveResponse {
                saved,
                success_message: format!("{} records saved", saved),
            }),
        )
            .into_response(),
        Err(e) => error_response("save records", e),
    }
}

pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, record_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("GET /api/collections/{}/{}", collection, record_id);

    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.record_service.get(collection, &record_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        Err(e) => error_response("get record", e),
    }
}

/// Delete one record; deleting a missing record is not an error
pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, record_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/collections/{}/{}", collection, record_id);

    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.record_service.delete(collection, &record_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete record", e),
    }
}

/// Remove every record of a collection
pub async fn clear_collection(State(state): State<AppState>, Path(collection): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/collections/{}", collection);

    let collection = match parse_collection(&collection) {
        Ok(collection) => collection,
        Err(response) => return response,
    };

    match state.record_service.clear(collection).await {
        Ok(removed) => (StatusCode::OK, Json(json!({ "removed": removed }))).into_response(),
        Err(e) => error_response("clear collection", e),
    }
}
