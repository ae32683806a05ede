//! Session controller behaviour over a full platform

mod common;

use alumni_search::error::{AppError, Result};
use alumni_search::models::*;
use alumni_search::search::{SearchError, SearchFilters, SuggestionKind};
use alumni_search::session::*;
use alumni_search::state::{
    AnalyticsStore, EventCriteria, InMemoryAnalyticsStore, InMemoryPreferencesStore,
};
use alumni_search::SearchPlatform;
use async_trait::async_trait;
use common::*;
use std::sync::Arc;
use std::time::Duration;

/// Analytics store that stalls while recording one particular query
struct DelayedAnalyticsStore {
    inner: InMemoryAnalyticsStore,
    slow_query: String,
    delay: Duration,
}

#[async_trait]
impl AnalyticsStore for DelayedAnalyticsStore {
    async fn append(&self, event: &SearchEvent) -> Result<()> {
        if event.data.query() == self.slow_query {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.append(event).await
    }

    async fn query(&self, criteria: &EventCriteria) -> Result<Vec<SearchEvent>> {
        self.inner.query(criteria).await
    }
}

struct UnavailableAnalyticsStore;

#[async_trait]
impl AnalyticsStore for UnavailableAnalyticsStore {
    async fn append(&self, _event: &SearchEvent) -> Result<()> {
        Err(AppError::Internal("analytics unavailable".to_string()))
    }

    async fn query(&self, _criteria: &EventCriteria) -> Result<Vec<SearchEvent>> {
        Err(AppError::Internal("analytics unavailable".to_string()))
    }
}

fn platform_with(analytics: Arc<dyn AnalyticsStore>) -> Arc<SearchPlatform> {
    Arc::new(SearchPlatform::new(
        fast_config(),
        Arc::new(catalog_store()),
        analytics,
        Arc::new(InMemoryPreferencesStore::new()),
    ))
}

async fn mounted(platform: &Arc<SearchPlatform>, context: SessionContext) -> SearchSession {
    let session = SearchSession::new(platform.clone(), context);
    session.mount().await;
    session
}

#[tokio::test]
async fn test_mount_warms_index_and_loads_defaults() {
    let platform = platform(catalog_store());
    let session = SearchSession::new(platform.clone(), SessionContext::new("s1"));
    assert_eq!(session.state(), SessionState::Uninitialized);
    assert!(!platform.is_ready());

    session.mount().await;

    let view = session.view();
    assert_eq!(view.state, SessionState::Ready);
    assert!(view.index_ready);
    assert!(platform.is_ready());
    assert!(view.history.is_empty());
    assert_eq!(view.preferences, SearchPreferences::default());
    assert_eq!(view.filters.content_types, vec!["all".to_string()]);

    // second mount is a no-op
    session.mount().await;
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_search_requires_mount() {
    let platform = ready_platform(catalog_store()).await;
    let session = SearchSession::new(platform, SessionContext::new("s1"));

    assert!(matches!(
        session.search("data", None).await,
        Err(SessionError::NotMounted)
    ));
}

#[tokio::test]
async fn test_search_records_analytics_and_history() {
    let analytics = Arc::new(InMemoryAnalyticsStore::new());
    let platform = platform_with(analytics.clone());
    let session = mounted(&platform, SessionContext::new("s1")).await;

    let outcome = session.search("data", None).await.unwrap();
    assert!(outcome.is_displayed());
    assert_eq!(outcome.response().unwrap().total, 2);

    let view = session.view();
    assert_eq!(view.state, SessionState::Ready);
    assert!(!view.is_loading);
    assert_eq!(view.query, "data");
    assert_eq!(view.response.as_ref().unwrap().total, 2);
    assert_eq!(view.history.len(), 1);
    assert_eq!(view.history[0].result_count, 2);

    let events = analytics
        .query(&EventCriteria::default().kind(SearchEventKind::Search))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].session_id, "s1");
}

#[tokio::test]
async fn test_blank_query_clears_without_searching() {
    let analytics = Arc::new(InMemoryAnalyticsStore::new());
    let platform = platform_with(analytics.clone());
    let session = mounted(&platform, SessionContext::new("s1")).await;

    session.search("python", None).await.unwrap();
    let reads = platform.index().stats().reads;

    let outcome = session.search("   ", None).await.unwrap();
    assert!(matches!(outcome, SearchOutcome::Cleared));
    assert_eq!(platform.index().stats().reads, reads);

    let view = session.view();
    assert!(view.response.is_none());
    assert!(view.query.is_empty());
    assert_eq!(analytics.len(), 1);
    assert_eq!(session.get_history(None).len(), 1);
}

#[tokio::test]
async fn test_stale_response_does_not_overwrite_newer_one() {
    let analytics = Arc::new(DelayedAnalyticsStore {
        inner: InMemoryAnalyticsStore::new(),
        slow_query: "python".to_string(),
        delay: Duration::from_millis(50),
    });
    let platform = platform_with(analytics.clone());
    let session = mounted(&platform, SessionContext::new("s1")).await;

    let (slow, fast) = tokio::join!(session.search("python", None), session.search("data", None));

    assert!(matches!(slow.unwrap(), SearchOutcome::Superseded(_)));
    assert!(fast.unwrap().is_displayed());

    let view = session.view();
    assert_eq!(view.query, "data");
    assert_eq!(view.response.as_ref().unwrap().query, "data");
    assert_eq!(view.state, SessionState::Ready);
    assert!(!view.is_loading);

    // both searches are still recorded
    let recorded = analytics.inner.query(&EventCriteria::default()).await.unwrap();
    assert_eq!(recorded.len(), 2);
    let history: Vec<String> = session.get_history(None).into_iter().map(|h| h.query).collect();
    assert_eq!(history, vec!["python".to_string(), "data".to_string()]);
}

#[tokio::test]
async fn test_failed_search_surfaces_generic_error() {
    let platform = ready_platform(catalog_store()).await;
    let session = mounted(&platform, SessionContext::new("s1")).await;
    session.search("data", None).await.unwrap();

    let result = session
        .apply_filters(SearchFilters::default().with_content_types(vec!["podcasts"]))
        .await;
    assert!(matches!(
        result,
        Err(SessionError::SearchFailed(SearchError::InvalidFilter(_)))
    ));

    let view = session.view();
    assert_eq!(view.state, SessionState::Ready);
    assert_eq!(view.error.as_deref(), Some(SEARCH_FAILED_MESSAGE));
    assert!(view.response.is_none());

    session
        .apply_filters(SearchFilters::default().with_content_types(vec!["jobs"]))
        .await
        .unwrap();
    let view = session.view();
    assert!(view.error.is_none());
    assert_eq!(view.response.as_ref().unwrap().total, 2);
}

#[tokio::test]
async fn test_analytics_outage_never_fails_search() {
    let platform = platform_with(Arc::new(UnavailableAnalyticsStore));
    let session = mounted(&platform, SessionContext::new("s1")).await;
    assert!(session.view().popular.is_empty());

    let outcome = session.search("hackathon", None).await.unwrap();
    assert_eq!(outcome.response().unwrap().total, 1);
    assert_eq!(session.get_history(None).len(), 1);
}

#[tokio::test]
async fn test_result_click_attaches_to_latest_search() {
    let analytics = Arc::new(InMemoryAnalyticsStore::new());
    let platform = platform_with(analytics.clone());
    let session = mounted(&platform, SessionContext::new("s1")).await;

    assert!(!session.record_click("job-1", 0).await);

    session.search("data", None).await.unwrap();
    assert!(session.record_click("job-1", 0).await);
    assert!(session.record_click("job-2", 1).await);

    assert_eq!(session.view().history[0].clicked_results, vec!["job-1", "job-2"]);
    let clicks = analytics
        .query(&EventCriteria::default().kind(SearchEventKind::ResultClick))
        .await
        .unwrap();
    assert_eq!(clicks.len(), 3);
}

#[tokio::test]
async fn test_voice_and_suggestion_searches_track_their_own_events() {
    let analytics = Arc::new(InMemoryAnalyticsStore::new());
    let platform = platform_with(analytics.clone());
    let session = mounted(&platform, SessionContext::new("s1")).await;

    session.voice_search("hackathon", Some(0.9)).await.unwrap();
    session.select_suggestion("Data Analyst Junior", 0).await.unwrap();

    let kinds: Vec<SearchEventKind> = analytics
        .query(&EventCriteria::default())
        .await
        .unwrap()
        .iter()
        .map(|e| e.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            SearchEventKind::VoiceSearch,
            SearchEventKind::SuggestionClick,
            SearchEventKind::Search,
        ]
    );
    assert_eq!(session.view().query, "Data Analyst Junior");
}

#[tokio::test]
async fn test_suggestions_merge_history_and_deduplicate() {
    let platform = ready_platform(catalog_store()).await;
    let session = mounted(&platform, SessionContext::new("s1")).await;

    assert!(session.get_suggestions("d").await.is_empty());

    session.search("data scientist", None).await.unwrap();
    session.search("data analyst junior", None).await.unwrap();

    let suggestions = session.get_suggestions("data").await;
    let texts: Vec<String> = suggestions.iter().map(|s| s.text.to_lowercase()).collect();

    assert!(suggestions
        .iter()
        .any(|s| s.kind == SuggestionKind::History && s.text == "data scientist"));
    assert_eq!(
        texts.iter().filter(|t| t.as_str() == "data analyst junior").count(),
        1
    );
    assert!(suggestions.len() <= platform.config().search.suggestion_limit);
}

#[tokio::test]
async fn test_saved_preferences_drive_later_sessions() {
    let platform = ready_platform(catalog_store()).await;
    let context = SessionContext::new("s1").with_user("u1");
    let session = mounted(&platform, context.clone()).await;

    let preferences = SearchPreferences {
        default_filters: SearchFilters::default().with_content_types(vec!["resources"]),
        results_per_page: 5,
        save_history: false,
        ..Default::default()
    };
    session.save_preferences(preferences.clone()).await.unwrap();

    let outcome = session.search("python", None).await.unwrap();
    let response = outcome.response().unwrap();
    assert_eq!(response.limit, 5);
    assert!(response.results.iter().all(|r| r.content_type == ContentType::Resources));
    assert!(session.get_history(None).is_empty());

    let later = mounted(&platform, SessionContext::new("s2").with_user("u1")).await;
    assert_eq!(later.view().preferences, preferences);
    assert_eq!(later.view().filters.content_types, vec!["resources".to_string()]);
}

#[tokio::test]
async fn test_view_updates_are_published() {
    let platform = ready_platform(catalog_store()).await;
    let session = mounted(&platform, SessionContext::new("s1")).await;
    let mut updates = session.subscribe();
    let _ = updates.borrow_and_update();

    session.search("mentor", None).await.unwrap();

    assert!(updates.has_changed().unwrap());
    let view = updates.borrow_and_update().clone();
    assert_eq!(view.query, "mentor");
    assert!(view.response.is_some());
}

#[tokio::test]
async fn test_clear_history() {
    let platform = ready_platform(catalog_store()).await;
    let session = mounted(&platform, SessionContext::new("s1")).await;

    session.search("python", None).await.unwrap();
    session.search("becas", None).await.unwrap();
    assert_eq!(session.get_history(Some(1))[0].query, "becas");

    session.clear_history();
    assert!(session.get_history(None).is_empty());
    assert!(session.view().history.is_empty());
}
