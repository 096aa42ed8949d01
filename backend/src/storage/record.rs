//! Schema-less records and the two fields the store cares about.

use serde_json::Value;

use super::collection::Collection;
use super::error::{StoreError, StoreResult};

/// A stored record: any JSON object carrying an `id`
pub type Record = Value;

pub const ID_FIELD: &str = "id";
pub const SESSION_FIELD: &str = "sessionId";

/// Primary key of a record. Numeric ids are keyed by their decimal text, so
/// `{"id": 1}` and `{"id": "1"}` name the same record: legacy data stored
/// timestamp ids as numbers that clients now send back as strings.
pub fn record_key(collection: Collection, record: &Record) -> StoreResult<String> {
    let object = record.as_object().ok_or(StoreError::NotAnObject {
        collection: collection.name(),
    })?;

    match object.get(ID_FIELD) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(StoreError::MissingKey {
            collection: collection.name(),
        }),
    }
}

/// The `sessionId` a record belongs to, if it declares one. Numeric values
/// are normalised like ids so they match sessions with legacy numeric ids.
pub fn record_session_id(record: &Record) -> Option<String> {
    match record.get(SESSION_FIELD) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Stamp `sessionId` onto a record object
pub fn set_record_session_id(record: &mut Record, session_id: &str) {
    if let Some(object) = record.as_object_mut() {
        object.insert(SESSION_FIELD.to_string(), Value::String(session_id.to_string()));
    }
}
