//! Full and incremental index builds from the content store

use crate::indexer::config::IndexerConfig;
use crate::indexer::error::{IndexerError, IndexerResult};
use crate::indexer::normalizer::ContentNormalizer;
use crate::metrics::{INDEXING_SOURCE_FAILURES_TOTAL, INDEX_DOCUMENTS};
use crate::models::{ContentType, RawRecord};
use crate::search::SearchIndex;
use crate::state::ContentStore;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// A source failure recorded by the last full pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingError {
    pub content_type: ContentType,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub is_ready: bool,
}

/// Snapshot returned by [`Indexer::get_indexing_status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub engine_status: EngineStatus,
    /// Stored documents, inactive ones included
    pub index_size: usize,
    pub last_index_update: Option<DateTime<Utc>>,
    /// Active documents per content type
    pub indexed_content_counts: BTreeMap<ContentType, usize>,
    /// Non-empty when the last pass ran degraded
    pub errors: Vec<IndexingError>,
}

/// Outcome of one full pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexingReport {
    /// Documents upserted per content type
    pub indexed: BTreeMap<ContentType, usize>,
    /// Records rejected by the normalizer
    pub skipped: usize,
    /// Documents no longer listed by their source
    pub pruned: usize,
    pub errors: Vec<IndexingError>,
    pub duration_ms: u64,
}

/// What an incremental refresh did to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    Indexed,
    /// Kept for lookups but excluded from queries
    Deactivated,
    Removed,
}

/// Pulls content from the store, normalizes it and feeds the search index
pub struct Indexer {
    store: Arc<dyn ContentStore>,
    index: Arc<SearchIndex>,
    normalizer: ContentNormalizer,
    config: IndexerConfig,
    ready: AtomicBool,
    last_update: RwLock<Option<DateTime<Utc>>>,
    errors: RwLock<Vec<IndexingError>>,
    rebuild: Mutex<()>,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn ContentStore>,
        index: Arc<SearchIndex>,
        normalizer: ContentNormalizer,
        config: IndexerConfig,
    ) -> Self {
        Self {
            store,
            index,
            normalizer,
            config,
            ready: AtomicBool::new(false),
            last_update: RwLock::new(None),
            errors: RwLock::new(Vec::new()),
            rebuild: Mutex::new(()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Pull every configured content type and rebuild the index.
    ///
    /// Source failures are recorded and the pass continues; readiness is
    /// reached even when some sources failed.
    pub async fn index_all_content(&self) -> IndexingReport {
        let _guard = self.rebuild.lock().await;
        self.run_pass().await
    }

    /// Run a full pass unless one has already completed
    pub async fn ensure_ready(&self) -> Option<IndexingReport> {
        if self.is_ready() {
            return None;
        }
        let _guard = self.rebuild.lock().await;
        if self.is_ready() {
            return None;
        }
        Some(self.run_pass().await)
    }

    /// Force the next [`ensure_ready`](Self::ensure_ready) to rebuild
    pub fn reset(&self) {
        self.ready.store(false, Ordering::Release);
        info!("Search index marked for rebuild");
    }

    async fn run_pass(&self) -> IndexingReport {
        let start = Instant::now();
        info!(
            content_types = self.config.content_types.len(),
            "Starting full index pass"
        );

        let pulls = self.config.content_types.iter().map(|content_type| async move {
            let records = self
                .with_retries(*content_type, || self.store.list_active(*content_type))
                .await;
            (*content_type, records)
        });

        let mut report = IndexingReport::default();
        for (content_type, pulled) in join_all(pulls).await {
            match pulled {
                Ok(records) => self.apply_source(content_type, records, &mut report).await,
                Err(e) => {
                    warn!(content_type = %content_type, error = %e, "Content source failed");
                    INDEXING_SOURCE_FAILURES_TOTAL
                        .with_label_values(&[&content_type.to_string()])
                        .inc();
                    report.errors.push(IndexingError {
                        content_type,
                        message: e.to_string(),
                        occurred_at: Utc::now(),
                    });
                }
            }
        }

        self.publish_counts();
        *self.errors.write() = report.errors.clone();
        *self.last_update.write() = Some(Utc::now());
        self.ready.store(true, Ordering::Release);

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            indexed = report.indexed.values().sum::<usize>(),
            skipped = report.skipped,
            pruned = report.pruned,
            failed_sources = report.errors.len(),
            duration_ms = report.duration_ms,
            "Index pass completed"
        );
        report
    }

    /// Upsert one source's records and prune what it no longer lists
    async fn apply_source(
        &self,
        content_type: ContentType,
        records: Vec<RawRecord>,
        report: &mut IndexingReport,
    ) {
        let mut seen = HashSet::new();
        let mut indexed = 0;

        for record in &records {
            match self.normalizer.normalize(record, content_type) {
                Ok(doc) => {
                    seen.insert(doc.id.clone());
                    self.index.upsert(doc);
                    indexed += 1;
                }
                Err(e) => {
                    warn!(content_type = %content_type, error = %e, "Skipping malformed record");
                    report.skipped += 1;
                }
            }
        }
        report.indexed.insert(content_type, indexed);

        let stale: Vec<String> = self
            .index
            .keys_of_type(content_type)
            .into_iter()
            .map(|key| key.id)
            .filter(|id| !seen.contains(id))
            .collect();
        for id in stale {
            match self.refresh_record(content_type, &id).await {
                Ok(outcome) => {
                    debug!(content_type = %content_type, id = %id, ?outcome, "Pruned stale document");
                    report.pruned += 1;
                }
                Err(e) => {
                    // The active listing no longer has it; drop it rather than serve it
                    warn!(content_type = %content_type, id = %id, error = %e, "Removing unrefreshable document");
                    self.index.remove(&id, content_type);
                    report.pruned += 1;
                }
            }
        }
    }

    /// Re-read one record and replace, deactivate or remove its document
    pub async fn refresh_record(
        &self,
        content_type: ContentType,
        id: &str,
    ) -> IndexerResult<RefreshOutcome> {
        let record = self
            .with_retries(content_type, || self.store.get_by_id(content_type, id))
            .await?;

        let outcome = match record {
            None => {
                self.index.remove(id, content_type);
                RefreshOutcome::Removed
            }
            Some(record) => {
                let doc = self.normalizer.normalize(&record, content_type)?;
                let outcome = if doc.is_active {
                    RefreshOutcome::Indexed
                } else {
                    RefreshOutcome::Deactivated
                };
                self.index.upsert(doc);
                outcome
            }
        };

        self.publish_counts();
        Ok(outcome)
    }

    /// Drop a document, e.g. after its source record was deleted
    pub fn remove_record(&self, content_type: ContentType, id: &str) -> bool {
        let removed = self.index.remove(id, content_type);
        if removed {
            self.publish_counts();
        }
        removed
    }

    pub fn get_indexing_status(&self) -> IndexingStatus {
        IndexingStatus {
            engine_status: EngineStatus {
                is_ready: self.is_ready(),
            },
            index_size: self.index.len(),
            last_index_update: *self.last_update.read(),
            indexed_content_counts: self.index.active_counts(),
            errors: self.errors.read().clone(),
        }
    }

    /// Run a store call with a per-attempt timeout and exponential backoff between
    /// transient failures
    async fn with_retries<T, F, Fut>(&self, content_type: ContentType, op: F) -> IndexerResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = crate::error::Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempts: u32 = 0;

        loop {
            if attempts > 0 {
                let delay = self.config.backoff(attempts);
                debug!(
                    content_type = %content_type,
                    attempt = attempts + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying content source"
                );
                sleep(delay).await;
            }

            let error = match timeout(self.config.source_timeout(), op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    let transient = e.is_transient();
                    let error = IndexerError::SourceFailed {
                        content_type,
                        message: e.to_string(),
                    };
                    if !transient {
                        return Err(error);
                    }
                    error
                }
                Err(_) => IndexerError::SourceTimeout {
                    content_type,
                    timeout_ms: self.config.source_timeout_ms,
                },
            };

            attempts += 1;
            if attempts > max_retries {
                return Err(error);
            }
            debug!(content_type = %content_type, error = %error, "Content source attempt failed");
        }
    }

    fn publish_counts(&self) {
        let counts = self.index.active_counts();
        for content_type in &self.config.content_types {
            INDEX_DOCUMENTS
                .with_label_values(&[&content_type.to_string()])
                .set(counts.get(content_type).copied().unwrap_or(0) as i64);
        }
    }
}
