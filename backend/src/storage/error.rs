use thiserror::Error;

/// Failures surfaced by the local store.
///
/// Absence of a record is never an error; lookups return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Record in '{collection}' is not a JSON object")]
    NotAnObject { collection: &'static str },
    #[error("Record in '{collection}' has no usable id")]
    MissingKey { collection: &'static str },
    #[error("Session not found: {0}")]
    UnknownSession(String),
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
