//! Whole-database JSON export and restore.
//!
//! The export document keys every collection by its store name:
//!
//! ```json
//! { "version": 2, "exportedAt": "2024-07-01T10:00:00+00:00",
//!   "collections": { "sessions": [...], "jeunes": [...] } }
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::session_service::SessionService;
use crate::storage::{Collection, RecordStorage, SCHEMA_VERSION};
use shared::RestoreResponse;

/// Export service that dumps and restores every collection
#[derive(Clone)]
pub struct ExportService {
    records: Arc<dyn RecordStorage>,
    session_service: SessionService,
}

impl ExportService {
    pub fn new(records: Arc<dyn RecordStorage>, session_service: SessionService) -> Self {
        Self {
            records,
            session_service,
        }
    }

    /// Every record of every collection as one JSON document
    pub async fn export_all(&self) -> Result<Value> {
        info!("Exporting all collections");

        let mut collections = Map::new();
        for collection in Collection::ALL {
            let records = self
                .records
                .get_all(collection, None)
                .await
                .with_context(|| format!("Failed to export {}", collection))?;
            collections.insert(collection.name().to_string(), Value::Array(records));
        }

        Ok(json!({
            "version": SCHEMA_VERSION,
            "exportedAt": Utc::now().to_rfc3339(),
            "collections": collections,
        }))
    }

    /// Replace the content of every collection present in `document`, all
    /// collections in one transaction; unknown names are ignored.
    pub async fn restore(&self, document: &Value) -> Result<RestoreResponse> {
        let collections = document
            .get("collections")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow::anyhow!("Export document has no 'collections' object"))?;

        let mut plan: Vec<(Collection, &[Value])> = Vec::new();
        for (name, records) in collections {
            let Some(collection) = Collection::from_name(name) else {
                warn!("Ignoring unknown collection '{}' in export document", name);
                continue;
            };
            let records = records
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("Collection '{}' is not an array", name))?;
            plan.push((collection, records.as_slice()));
        }

        let restored = self
            .records
            .replace_all(&plan)
            .await
            .context("Failed to restore export document")?;

        let counts: BTreeMap<String, usize> = plan
            .iter()
            .map(|(collection, records)| (collection.name().to_string(), records.len()))
            .collect();
        info!("Restored {} records into {} collections", restored, counts.len());

        self.session_service.load().await?;

        Ok(RestoreResponse {
            success_message: format!("{} collections restored", counts.len()),
            collections: counts,
        })
    }
}
