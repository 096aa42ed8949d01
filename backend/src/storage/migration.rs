//! One-time import of the legacy flat key space.
//!
//! Older installs kept every list as a JSON string under a fixed key (the
//! shape of a browser `localStorage` dump). On first run those lists are
//! copied into the structured collections and a flag is set so this never
//! runs again. The copy is best-effort: a key that fails is logged and
//! skipped, and the flag is set regardless.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::collection::Collection;
use super::error::StoreResult;
use super::record::{record_key, Record, ID_FIELD};
use super::repositories::CURRENT_SESSION_KEY;
use super::traits::{PreferenceStorage, RecordStorage};

/// Preference set once the legacy key space has been migrated
pub const MIGRATION_FLAG: &str = "migration.v1.done";

/// Legacy key holding the current session id
pub const LEGACY_CURRENT_SESSION_KEY: &str = "currentSessionId";

/// Fixed legacy keys and the collection each one feeds
pub const LEGACY_KEYS: [(&str, Collection); 13] = [
    ("sessions", Collection::Sessions),
    ("staff", Collection::Staff),
    ("jeunes", Collection::Participants),
    ("groups", Collection::Groups),
    ("events", Collection::Events),
    ("rooms", Collection::Rooms),
    ("roomConfigs", Collection::RoomConfigs),
    ("plannings", Collection::Plannings),
    ("traitements", Collection::Treatments),
    ("soins", Collection::CareEntries),
    ("signatures", Collection::Signatures),
    ("comptabilite", Collection::Accounting),
    ("mainCourante", Collection::MainCourante),
];

/// The legacy flat key space: key to raw string value
#[derive(Debug, Clone, Default)]
pub struct LegacyKeySpace {
    entries: HashMap<String, String>,
}

impl LegacyKeySpace {
    /// Parse a dump: a JSON object whose values are JSON-encoded strings.
    /// Values that are already structured JSON are accepted too.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let object: Map<String, Value> =
            serde_json::from_str(content).context("Legacy dump is not a JSON object")?;

        let entries = object
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(raw) => (key, raw),
                other => (key, other.to_string()),
            })
            .collect();

        Ok(Self { entries })
    }

    /// Load a dump file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read legacy dump {:?}", path))?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// What the migration did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// True when the flag was already set and nothing ran
    pub skipped: bool,
    pub migrated: BTreeMap<&'static str, usize>,
    pub failed_keys: Vec<String>,
}

/// Copy the legacy key space into the structured store, once
pub async fn run_legacy_migration(
    records: &dyn RecordStorage,
    preferences: &dyn PreferenceStorage,
    legacy: Option<&LegacyKeySpace>,
) -> StoreResult<MigrationReport> {
    if preferences.get_preference(MIGRATION_FLAG).await?.is_some() {
        return Ok(MigrationReport {
            skipped: true,
            ..Default::default()
        });
    }

    let mut report = MigrationReport::default();

    if let Some(legacy) = legacy {
        info!("Migrating legacy key space");
        for (key, collection) in LEGACY_KEYS {
            let Some(raw) = legacy.get(key) else {
                continue;
            };

            let result = match legacy_records(key, collection, raw) {
                Ok(converted) => records
                    .save_many(collection, &converted)
                    .await
                    .map_err(anyhow::Error::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(count) => {
                    info!("Migrated {} records from legacy key '{}'", count, key);
                    report.migrated.insert(collection.name(), count);
                }
                Err(e) => {
                    warn!("Skipping legacy key '{}': {:#}", key, e);
                    report.failed_keys.push(key.to_string());
                }
            }
        }

        if let Some(current) = legacy.get(LEGACY_CURRENT_SESSION_KEY) {
            // Stored either as a bare id or as a JSON string literal
            let current = serde_json::from_str::<String>(current).unwrap_or_else(|_| current.to_string());
            if !current.is_empty() {
                preferences.set_preference(CURRENT_SESSION_KEY, &current).await?;
            }
        }
    }

    preferences.set_preference(MIGRATION_FLAG, "true").await?;
    Ok(report)
}

/// Turn one legacy JSON array into storable records. Items without an id get
/// `legacy-<key>-<index>`; items that are not objects are dropped.
fn legacy_records(key: &str, collection: Collection, raw: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(raw).with_context(|| format!("'{}' is not valid JSON", key))?;
    let Value::Array(items) = value else {
        anyhow::bail!("'{}' does not hold a list", key);
    };

    let mut converted = Vec::with_capacity(items.len());
    for (index, mut item) in items.into_iter().enumerate() {
        if !item.is_object() {
            warn!("Dropping non-object item {} under legacy key '{}'", index, key);
            continue;
        }
        if record_key(collection, &item).is_err() {
            if let Some(object) = item.as_object_mut() {
                object.insert(ID_FIELD.to_string(), Value::String(format!("legacy-{}-{}", key, index)));
            }
        }
        converted.push(item);
    }
    Ok(converted)
}
