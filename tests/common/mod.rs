//! Shared fixtures for the integration tests

#![allow(dead_code)]

use alumni_search::config::Config;
use alumni_search::error::{AppError, Result};
use alumni_search::models::{ContentType, RawRecord};
use alumni_search::state::{ContentStore, InMemoryContentStore};
use alumni_search::SearchPlatform;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub fn job(id: &str, title: &str, company: &str) -> RawRecord {
    RawRecord::new()
        .with("id", id)
        .with("title", title)
        .with("company", company)
        .with("isActive", true)
}

/// The three jobs used throughout: two mention "data" in the title, one does not
pub fn scenario_jobs() -> InMemoryContentStore {
    let store = InMemoryContentStore::new();
    store.insert(
        ContentType::Jobs,
        job("job-1", "Senior Data Scientist", "TechCorp")
            .with("description", "Lead the analytics team and mentor juniors")
            .with("location", "CDMX")
            .with("category", "Tecnología")
            .with("tags", json!(["python", "ml"]))
            .with("applicants", 12)
            .with("createdAt", "2024-03-01T09:00:00Z"),
    );
    store.insert(
        ContentType::Jobs,
        job("job-2", "Data Analyst Junior", "Startup Fintech")
            .with("description", "Dashboards and reporting for the finance team")
            .with("location", "Guadalajara")
            .with("category", "Finanzas")
            .with("tags", json!(["sql", "excel"]))
            .with("applicants", 30)
            .with("createdAt", "2024-04-15T09:00:00Z"),
    );
    store.insert(
        ContentType::Jobs,
        job("job-3", "ML Engineer", "AI Solutions")
            .with("description", "Deploy models to production")
            .with("location", "Monterrey")
            .with("category", "Tecnología")
            .with("tags", json!(["python", "mlops"]))
            .with("applicants", 5)
            .with("createdAt", "2024-02-10T09:00:00Z"),
    );
    store
}

/// Scenario jobs plus one record of most other content types
pub fn catalog_store() -> InMemoryContentStore {
    let store = scenario_jobs();
    store.insert(
        ContentType::Events,
        RawRecord::new()
            .with("id", "evt-1")
            .with("name", "Hackathon de Inteligencia Artificial")
            .with("description", "Fin de semana construyendo prototipos")
            .with("venue", "Campus Monterrey")
            .with("eventType", "hackathon")
            .with("tags", json!(["ai", "hackathon"]))
            .with("startDate", "2024-05-20T16:00:00Z")
            .with("createdAt", "2024-04-01T12:00:00Z"),
    );
    store.insert(
        ContentType::Forums,
        RawRecord::new()
            .with("id", "post-1")
            .with("title", "Consejos para entrevistas técnicas")
            .with("body", "Practiquen algoritmos y expliquen su razonamiento en voz alta")
            .with("author", json!({ "id": "u-7", "name": "Carla Méndez" }))
            .with("tags", json!(["entrevistas", "carrera"]))
            .with("createdAt", "2024-04-20T08:30:00Z"),
    );
    store.insert(
        ContentType::Members,
        RawRecord::new()
            .with("id", "mem-1")
            .with("firstName", "Ana")
            .with("lastName", "López")
            .with("position", "Product Manager")
            .with("company", "TechCorp")
            .with("skills", json!(["liderazgo", "producto"]))
            .with("campus", "Guadalajara")
            .with("registeredAt", "2023-11-02T10:00:00Z"),
    );
    store.insert(
        ContentType::Resources,
        RawRecord::new()
            .with("id", "res-1")
            .with("title", "Guía de Python para principiantes")
            .with("summary", "Primeros pasos con el lenguaje")
            .with("category", "programacion")
            .with("tags", json!(["python"]))
            .with("createdAt", "2024-01-05T10:00:00Z"),
    );
    store
}

/// Config with fast retries and short source timeouts
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.indexer.source_timeout_ms = 100;
    config.indexer.retry_backoff_ms = 5;
    config
}

pub fn platform(store: impl ContentStore + 'static) -> Arc<SearchPlatform> {
    Arc::new(SearchPlatform::in_memory(fast_config(), Arc::new(store)))
}

/// A platform whose index has already been built
pub async fn ready_platform(store: impl ContentStore + 'static) -> Arc<SearchPlatform> {
    let platform = platform(store);
    platform.index_all_content().await;
    platform
}

/// How a [`ScriptedContentStore`] misbehaves for one content type
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Transient failure on the first `n` listings, then success
    Transient(usize),
    /// Non-transient failure on every listing
    Permanent,
    /// Answer after a delay
    Slow(Duration),
}

/// Content store wrapper with per-type injected faults and call counting
pub struct ScriptedContentStore {
    inner: InMemoryContentStore,
    faults: HashMap<ContentType, Fault>,
    calls: Mutex<HashMap<ContentType, usize>>,
}

impl ScriptedContentStore {
    pub fn new(inner: InMemoryContentStore) -> Self {
        Self {
            inner,
            faults: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_fault(mut self, content_type: ContentType, fault: Fault) -> Self {
        self.faults.insert(content_type, fault);
        self
    }

    pub fn listings(&self, content_type: ContentType) -> usize {
        self.calls.lock().get(&content_type).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ContentStore for ScriptedContentStore {
    async fn list_active(&self, content_type: ContentType) -> Result<Vec<RawRecord>> {
        let call = {
            let mut calls = self.calls.lock();
            let count = calls.entry(content_type).or_insert(0);
            *count += 1;
            *count
        };

        match self.faults.get(&content_type) {
            Some(Fault::Transient(failures)) if call <= *failures => Err(AppError::ContentSource {
                content_source: content_type.to_string(),
                message: "connection reset".to_string(),
            }),
            Some(Fault::Permanent) => Err(AppError::Internal(format!(
                "collection {} is not readable",
                content_type
            ))),
            Some(Fault::Slow(delay)) => {
                tokio::time::sleep(*delay).await;
                self.inner.list_active(content_type).await
            }
            _ => self.inner.list_active(content_type).await,
        }
    }

    async fn get_by_id(&self, content_type: ContentType, id: &str) -> Result<Option<RawRecord>> {
        self.inner.get_by_id(content_type, id).await
    }
}
