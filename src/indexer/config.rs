//! Indexer configuration

use crate::models::ContentType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Content pull settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Content types pulled by a full pass
    pub content_types: Vec<ContentType>,

    /// Per-attempt timeout for one content source
    pub source_timeout_ms: u64,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Base delay, doubled on every retry
    pub retry_backoff_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            content_types: ContentType::ALL.to_vec(),
            source_timeout_ms: 5000,
            max_retries: 2,
            retry_backoff_ms: 100,
        }
    }
}

impl IndexerConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms * 2_u64.pow(attempt.saturating_sub(1)))
    }
}
