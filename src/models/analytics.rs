use crate::models::Language;
use crate::search::{SearchFilters, SearchSort};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Kind of analytics event
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchEventKind {
    Search,
    ResultClick,
    FilterApply,
    SuggestionClick,
    VoiceSearch,
}

/// Event payload, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEventData {
    Search {
        query: String,
        filters: SearchFilters,
        result_count: usize,
        took_ms: u64,
    },
    ResultClick {
        query: String,
        result_id: String,
        position: usize,
    },
    FilterApply {
        query: String,
        filters: SearchFilters,
    },
    SuggestionClick {
        query: String,
        suggestion: String,
        position: usize,
    },
    VoiceSearch {
        query: String,
        confidence: Option<f32>,
    },
}

impl SearchEventData {
    pub fn kind(&self) -> SearchEventKind {
        match self {
            SearchEventData::Search { .. } => SearchEventKind::Search,
            SearchEventData::ResultClick { .. } => SearchEventKind::ResultClick,
            SearchEventData::FilterApply { .. } => SearchEventKind::FilterApply,
            SearchEventData::SuggestionClick { .. } => SearchEventKind::SuggestionClick,
            SearchEventData::VoiceSearch { .. } => SearchEventKind::VoiceSearch,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            SearchEventData::Search { query, .. }
            | SearchEventData::ResultClick { query, .. }
            | SearchEventData::FilterApply { query, .. }
            | SearchEventData::SuggestionClick { query, .. }
            | SearchEventData::VoiceSearch { query, .. } => query,
        }
    }
}

/// Identity of the session an event or history entry belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub user_agent: Option<String>,
    pub language: Language,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Key under which history and preferences are stored: the user when known, else the session
    pub fn storage_key(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.session_id)
    }
}

/// An analytics event. Append-only: never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    pub id: Uuid,

    #[serde(flatten)]
    pub data: SearchEventData,

    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub session_id: String,
    pub user_agent: Option<String>,
    pub language: Language,
}

impl SearchEvent {
    pub fn new(data: SearchEventData, context: &SessionContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            timestamp: Utc::now(),
            user_id: context.user_id.clone(),
            session_id: context.session_id.clone(),
            user_agent: context.user_agent.clone(),
            language: context.language,
        }
    }

    /// Override the timestamp (imports and tests)
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind(&self) -> SearchEventKind {
        self.data.kind()
    }
}

/// One entry of a session's search history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryItem {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub query: String,
    /// Filters in effect when the search ran
    pub filters: SearchFilters,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
    /// Result ids clicked afterwards, in click order
    pub clicked_results: Vec<String>,
    pub session_id: String,
}

impl SearchHistoryItem {
    pub fn new(
        query: impl Into<String>,
        filters: SearchFilters,
        result_count: usize,
        context: &SessionContext,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: context.user_id.clone(),
            query: query.into(),
            filters,
            timestamp: Utc::now(),
            result_count,
            clicked_results: Vec::new(),
            session_id: context.session_id.clone(),
        }
    }
}

/// Aggregation window for popular searches
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PopularityPeriod {
    Day,
    #[default]
    Week,
    Month,
    All,
}

impl PopularityPeriod {
    /// Window length; `None` means unbounded
    pub fn duration(&self) -> Option<Duration> {
        match self {
            PopularityPeriod::Day => Some(Duration::days(1)),
            PopularityPeriod::Week => Some(Duration::weeks(1)),
            PopularityPeriod::Month => Some(Duration::days(30)),
            PopularityPeriod::All => None,
        }
    }

    /// Window compared for the trending flag. Unbounded periods use the last month.
    pub fn trend_window(&self) -> Duration {
        self.duration().unwrap_or_else(|| Duration::days(30))
    }
}

/// A query and how often it was searched within a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularSearch {
    pub query: String,
    pub count: usize,
    pub period: PopularityPeriod,
    pub trending: bool,
}

/// Per-user search defaults, persisted across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPreferences {
    pub default_filters: SearchFilters,
    pub default_sort: SearchSort,
    pub results_per_page: usize,
    pub enable_suggestions: bool,
    pub save_history: bool,
    pub language: Language,
}

impl Default for SearchPreferences {
    fn default() -> Self {
        Self {
            default_filters: SearchFilters::default().with_content_types(vec!["all"]),
            default_sort: SearchSort::default(),
            results_per_page: 20,
            enable_suggestions: true,
            save_history: true,
            language: Language::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let context = SessionContext::new("s1").with_user("u1");
        let event = SearchEvent::new(
            SearchEventData::ResultClick {
                query: "data".to_string(),
                result_id: "job-1".to_string(),
                position: 2,
            },
            &context,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "result_click");
        assert_eq!(json["result_id"], "job-1");
        assert_eq!(json["session_id"], "s1");
        assert_eq!(event.kind(), SearchEventKind::ResultClick);

        let back: SearchEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_storage_key_prefers_user() {
        assert_eq!(SessionContext::new("s1").storage_key(), "s1");
        assert_eq!(SessionContext::new("s1").with_user("u1").storage_key(), "u1");
    }

    #[test]
    fn test_default_preferences() {
        let prefs = SearchPreferences::default();
        assert_eq!(prefs.default_filters.content_types, vec!["all".to_string()]);
        assert_eq!(prefs.results_per_page, 20);
    }
}
