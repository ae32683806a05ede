use crate::error::{AppError, Result};
use crate::models::{ContentType, RawRecord, SearchEvent, SearchPreferences};
use crate::state::{AnalyticsStore, ContentStore, EventCriteria, PreferencesStore};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Fields a record id may be stored under
const ID_FIELDS: &[&str] = &["id", "uid", "_id"];

/// In-memory content store keyed by `(type, id)`
#[derive(Default)]
pub struct InMemoryContentStore {
    records: DashMap<(ContentType, String), RawRecord>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record; returns the key it is stored under.
    ///
    /// Records without an id are kept under a generated key so that they
    /// still reach the normalizer.
    pub fn insert(&self, content_type: ContentType, record: RawRecord) -> String {
        let id = record
            .str_field(ID_FIELDS)
            .unwrap_or_else(|| format!("__missing_id_{}", Uuid::new_v4()));
        self.records.insert((content_type, id.clone()), record);
        tracing::debug!(content_type = %content_type, id = %id, "Content record stored");
        id
    }

    /// Delete a record; returns whether it existed
    pub fn remove(&self, content_type: ContentType, id: &str) -> bool {
        self.records
            .remove(&(content_type, id.to_string()))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a seed file of the form `{ "jobs": [ {...} ], "events": [ ... ] }`
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            records = store.len(),
            "Content seed loaded"
        );
        Ok(store)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let collections: HashMap<String, Vec<Value>> = serde_json::from_str(raw)?;
        let store = Self::new();

        for (collection, records) in collections {
            let content_type = ContentType::from_str(&collection).map_err(|_| {
                AppError::Validation(format!("unknown content collection '{}'", collection))
            })?;
            for value in records {
                match RawRecord::from_value(value) {
                    Some(record) => {
                        store.insert(content_type, record);
                    }
                    None => tracing::warn!(
                        content_type = %content_type,
                        "Skipping seed entry that is not a JSON object"
                    ),
                }
            }
        }

        Ok(store)
    }
}

fn is_active(record: &RawRecord) -> bool {
    record
        .bool_field(&["isActive", "is_active", "active"])
        .unwrap_or(true)
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn list_active(&self, content_type: ContentType) -> Result<Vec<RawRecord>> {
        let mut records: Vec<(String, RawRecord)> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == content_type && is_active(entry.value()))
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    async fn get_by_id(&self, content_type: ContentType, id: &str) -> Result<Option<RawRecord>> {
        Ok(self
            .records
            .get(&(content_type, id.to_string()))
            .map(|entry| entry.value().clone()))
    }
}

/// Append-only in-memory event log
#[derive(Default)]
pub struct InMemoryAnalyticsStore {
    events: RwLock<Vec<SearchEvent>>,
}

impl InMemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryAnalyticsStore {
    async fn append(&self, event: &SearchEvent) -> Result<()> {
        self.events.write().push(event.clone());
        Ok(())
    }

    async fn query(&self, criteria: &EventCriteria) -> Result<Vec<SearchEvent>> {
        let mut events: Vec<SearchEvent> = self
            .events
            .read()
            .iter()
            .filter(|event| criteria.matches(event))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.timestamp);
        Ok(events)
    }
}

/// In-memory preferences keyed by user or session
#[derive(Default)]
pub struct InMemoryPreferencesStore {
    preferences: DashMap<String, SearchPreferences>,
}

impl InMemoryPreferencesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesStore for InMemoryPreferencesStore {
    async fn get(&self, key: &str) -> Result<Option<SearchPreferences>> {
        Ok(self.preferences.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, preferences: &SearchPreferences) -> Result<()> {
        self.preferences
            .insert(key.to_string(), preferences.clone());
        Ok(())
    }
}
