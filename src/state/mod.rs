pub mod store;

pub use store::*;

use crate::error::Result;
use crate::models::{ContentType, RawRecord, SearchEvent, SearchEventKind, SearchPreferences};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read access to the document store holding platform content
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Every active record of a content type
    async fn list_active(&self, content_type: ContentType) -> Result<Vec<RawRecord>>;

    /// A single record, active or not
    async fn get_by_id(&self, content_type: ContentType, id: &str) -> Result<Option<RawRecord>>;
}

/// Selection criteria for stored analytics events
#[derive(Debug, Clone, Default)]
pub struct EventCriteria {
    /// Inclusive lower bound
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub until: Option<DateTime<Utc>>,
    /// Empty means every kind
    pub kinds: Vec<SearchEventKind>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl EventCriteria {
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn kind(mut self, kind: SearchEventKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn matches(&self, event: &SearchEvent) -> bool {
        self.since.map_or(true, |since| event.timestamp >= since)
            && self.until.map_or(true, |until| event.timestamp < until)
            && (self.kinds.is_empty() || self.kinds.contains(&event.kind()))
            && self
                .session_id
                .as_ref()
                .map_or(true, |session| &event.session_id == session)
            && self
                .user_id
                .as_ref()
                .map_or(true, |user| event.user_id.as_ref() == Some(user))
    }
}

/// Append-only analytics persistence
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn append(&self, event: &SearchEvent) -> Result<()>;

    /// Matching events in occurrence order
    async fn query(&self, criteria: &EventCriteria) -> Result<Vec<SearchEvent>>;
}

/// Per user (or session) search preferences
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SearchPreferences>>;

    async fn set(&self, key: &str, preferences: &SearchPreferences) -> Result<()>;
}
