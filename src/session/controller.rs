//! Per-user search session
//!
//! The controller is a small state machine: commands (`mount`, `search`,
//! `apply_filters`, ...) run async work and the resulting events are folded
//! into a [`SessionView`] published on a `watch` channel. Searches carry a
//! sequence number so a slow response can never overwrite a newer one.

use crate::analytics::normalize_query;
use crate::models::{
    PopularSearch, PopularityPeriod, SearchHistoryItem, SearchPreferences, SessionContext,
};
use crate::platform::SearchPlatform;
use crate::search::{SearchFilters, SearchQuery, SearchSuggestion, SuggestionKind};
use crate::session::error::{SessionError, SessionResult};
use crate::session::state::{SearchOutcome, SessionState, SessionView};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Message shown when a search fails for any reason
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed, please try again";

const HISTORY_SUGGESTION_SCORE: f32 = 1.0;
const POPULAR_SUGGESTION_SCORE: f32 = 0.5;
const TRENDING_SUGGESTION_SCORE: f32 = 0.75;

/// How a search was started; decides which analytics event it records
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Typed,
    Voice { confidence: Option<f32> },
}

pub struct SearchSession {
    platform: Arc<SearchPlatform>,
    context: SessionContext,
    /// Sequence number of the most recently started search
    latest_seq: AtomicU64,
    in_flight: AtomicUsize,
    view: watch::Sender<SessionView>,
}

impl SearchSession {
    pub fn new(platform: Arc<SearchPlatform>, context: SessionContext) -> Self {
        let (view, _) = watch::channel(SessionView::default());
        Self {
            platform,
            context,
            latest_seq: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            view,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Receiver notified on every view change
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Snapshot of the current view
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.view.borrow().state
    }

    /// Load history, popular searches and preferences, then wait for the index.
    ///
    /// Only the first call does any work.
    pub async fn mount(&self) {
        let claimed = self.view.send_if_modified(|view| {
            if view.state == SessionState::Uninitialized {
                view.state = SessionState::Initializing;
                true
            } else {
                false
            }
        });
        if !claimed {
            debug!(session_id = %self.context.session_id, "Session already mounted");
            return;
        }
        self.log_transition(SessionState::Uninitialized, SessionState::Initializing, "mount");

        let key = self.context.storage_key();
        let (history, popular, preferences) = tokio::join!(
            async { self.platform.history().get(key, None) },
            self.platform
                .analytics()
                .get_popular_searches(PopularityPeriod::Week, None),
            self.platform.preferences().get_preferences(key),
        );
        let popular = popular.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load popular searches");
            Vec::new()
        });

        self.view.send_modify(|view| {
            view.history = history;
            view.popular = popular;
            view.filters = preferences.default_filters.clone();
            view.preferences = preferences;
        });

        if let Some(report) = self.platform.ensure_ready().await {
            info!(
                session_id = %self.context.session_id,
                errors = report.errors.len(),
                duration_ms = report.duration_ms,
                "Index built during session mount"
            );
        }

        let index_ready = self.platform.is_ready();
        self.view.send_modify(|view| {
            view.index_ready = index_ready;
            view.state = SessionState::Ready;
        });
        self.log_transition(SessionState::Initializing, SessionState::Ready, "mounted");
    }

    /// Run a typed search. A blank query clears the results instead.
    ///
    /// `filters` defaults to the filters currently shown.
    pub async fn search(
        &self,
        query: &str,
        filters: Option<SearchFilters>,
    ) -> SessionResult<SearchOutcome> {
        self.run(query, filters, Trigger::Typed).await
    }

    /// Run a search from a voice transcript
    pub async fn voice_search(
        &self,
        transcript: &str,
        confidence: Option<f32>,
    ) -> SessionResult<SearchOutcome> {
        self.run(transcript, None, Trigger::Voice { confidence }).await
    }

    /// Replace the filters and rerun the current query
    pub async fn apply_filters(&self, filters: SearchFilters) -> SessionResult<SearchOutcome> {
        if !self.state().accepts_searches() {
            return Err(SessionError::NotMounted);
        }
        let query = self.view.borrow().query.clone();
        self.platform
            .analytics()
            .track_filter_apply(&query, &filters, &self.context)
            .await;
        self.run(&query, Some(filters), Trigger::Typed).await
    }

    /// Search for a suggestion the user picked
    pub async fn select_suggestion(
        &self,
        suggestion: &str,
        position: usize,
    ) -> SessionResult<SearchOutcome> {
        if !self.state().accepts_searches() {
            return Err(SessionError::NotMounted);
        }
        let query = self.view.borrow().query.clone();
        self.platform
            .analytics()
            .track_suggestion_click(&query, suggestion, position, &self.context)
            .await;
        self.run(suggestion, None, Trigger::Typed).await
    }

    /// Record a click on a displayed result; false when there is no history entry to attach it to
    pub async fn record_click(&self, result_id: &str, position: usize) -> bool {
        let query = self.view.borrow().query.clone();
        let key = self.context.storage_key();

        let attached = self.platform.history().record_click(key, result_id);
        self.platform
            .analytics()
            .track_result_click(&query, result_id, position, &self.context)
            .await;

        if attached {
            let history = self.platform.history().get(key, None);
            self.view.send_modify(|view| view.history = history);
        }
        attached
    }

    /// Live title suggestions merged with matching history and popular queries.
    ///
    /// Duplicates are dropped case-insensitively, keeping the first source.
    pub async fn get_suggestions(&self, partial: &str) -> Vec<SearchSuggestion> {
        let (enabled, history, popular) = {
            let view = self.view.borrow();
            (
                view.preferences.enable_suggestions,
                view.history.clone(),
                view.popular.clone(),
            )
        };
        let search_config = &self.platform.config().search;
        let partial = partial.trim();
        if !enabled || partial.chars().count() < search_config.min_suggestion_chars {
            return Vec::new();
        }

        let live = self
            .platform
            .get_suggestions(partial)
            .await
            .unwrap_or_else(|e| {
                warn!(partial = %partial, error = %e, "Live suggestions unavailable");
                Vec::new()
            });

        let needle = normalize_query(partial);
        let from_history = history
            .iter()
            .filter(|item| normalize_query(&item.query).contains(&needle))
            .map(|item| SearchSuggestion {
                text: item.query.clone(),
                kind: SuggestionKind::History,
                score: HISTORY_SUGGESTION_SCORE,
                content_type: None,
            });
        let from_popular = popular
            .iter()
            .filter(|search| search.query.contains(&needle))
            .map(|search| SearchSuggestion {
                text: search.query.clone(),
                kind: SuggestionKind::Popular,
                score: if search.trending {
                    TRENDING_SUGGESTION_SCORE
                } else {
                    POPULAR_SUGGESTION_SCORE
                },
                content_type: None,
            });

        let mut seen = HashSet::new();
        live.into_iter()
            .chain(from_history)
            .chain(from_popular)
            .filter(|suggestion| seen.insert(suggestion.text.to_lowercase()))
            .take(search_config.suggestion_limit)
            .collect()
    }

    /// Most recent searches first
    pub fn get_history(&self, limit: Option<usize>) -> Vec<SearchHistoryItem> {
        self.platform
            .history()
            .get(self.context.storage_key(), limit)
    }

    pub fn clear_history(&self) {
        self.platform.history().clear(self.context.storage_key());
        self.view.send_modify(|view| view.history.clear());
    }

    /// Reload popular searches for `period`; keeps the previous list on failure
    pub async fn refresh_popular(&self, period: PopularityPeriod) -> Vec<PopularSearch> {
        match self
            .platform
            .analytics()
            .get_popular_searches(period, None)
            .await
        {
            Ok(popular) => {
                self.view.send_modify(|view| view.popular = popular.clone());
                popular
            }
            Err(e) => {
                warn!(period = %period, error = %e, "Failed to refresh popular searches");
                self.view.borrow().popular.clone()
            }
        }
    }

    /// Persist preferences and adopt their default filters
    pub async fn save_preferences(&self, preferences: SearchPreferences) -> SessionResult<()> {
        self.platform
            .preferences()
            .save_preferences(self.context.storage_key(), &preferences)
            .await?;
        self.view.send_modify(|view| {
            view.filters = preferences.default_filters.clone();
            view.preferences = preferences;
        });
        Ok(())
    }

    async fn run(
        &self,
        query: &str,
        filters: Option<SearchFilters>,
        trigger: Trigger,
    ) -> SessionResult<SearchOutcome> {
        if !self.state().accepts_searches() {
            return Err(SessionError::NotMounted);
        }

        let text = query.trim().to_string();
        let (filters, preferences) = {
            let view = self.view.borrow();
            (
                filters.unwrap_or_else(|| view.filters.clone()),
                view.preferences.clone(),
            )
        };
        let seq = self.latest_seq.fetch_add(1, Ordering::AcqRel) + 1;

        if text.is_empty() {
            self.view.send_modify(|view| {
                view.query.clear();
                view.filters = filters;
                view.response = None;
                view.error = None;
                view.is_loading = false;
                view.displayed_seq = seq;
            });
            debug!(seq, "Blank query, results cleared");
            return Ok(SearchOutcome::Cleared);
        }

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.view.send_modify(|view| {
            view.state = SessionState::Searching;
            view.query = text.clone();
            view.filters = filters.clone();
            view.is_loading = true;
        });

        let mut search_query = SearchQuery::new(text.clone())
            .with_filters(filters.clone())
            .with_sort(preferences.default_sort.field, preferences.default_sort.direction)
            .with_limit(preferences.results_per_page.clamp(1, 100));
        search_query.options.include_suggestions = preferences.enable_suggestions;

        let started = Instant::now();
        let result = self.platform.search(&search_query).await;
        let took_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let analytics = self.platform.analytics();
                match trigger {
                    Trigger::Typed => {
                        analytics
                            .track_search(&text, &filters, response.total, took_ms, &self.context)
                            .await
                    }
                    Trigger::Voice { confidence } => {
                        analytics
                            .track_voice_search(&text, confidence, &self.context)
                            .await
                    }
                };

                let history = preferences.save_history.then(|| {
                    let key = self.context.storage_key();
                    self.platform.history().add(
                        key,
                        SearchHistoryItem::new(&text, filters, response.total, &self.context),
                    );
                    self.platform.history().get(key, None)
                });

                let shown = response.clone();
                let displayed = self.complete(seq, history, move |view| {
                    view.response = Some(shown);
                    view.error = None;
                });
                debug!(seq, query = %text, took_ms, total = response.total, displayed, "Search completed");

                if displayed {
                    Ok(SearchOutcome::Displayed(response))
                } else {
                    debug!(seq, "Discarding superseded search response");
                    Ok(SearchOutcome::Superseded(response))
                }
            }
            Err(e) => {
                warn!(seq, query = %text, error = %e, "Search failed");
                self.complete(seq, None, |view| {
                    view.response = None;
                    view.error = Some(SEARCH_FAILED_MESSAGE.to_string());
                });
                Err(SessionError::SearchFailed(e))
            }
        }
    }

    /// Fold a finished search into the view; only the latest search publishes
    fn complete<F>(&self, seq: u64, history: Option<Vec<SearchHistoryItem>>, publish: F) -> bool
    where
        F: FnOnce(&mut SessionView),
    {
        let remaining = self.in_flight.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        let mut displayed = false;

        self.view.send_modify(|view| {
            if let Some(history) = history {
                view.history = history;
            }
            if seq == self.latest_seq.load(Ordering::Acquire) {
                publish(view);
                view.displayed_seq = seq;
                view.is_loading = false;
                displayed = true;
            }
            if remaining == 0 {
                view.state = SessionState::Ready;
                view.is_loading = false;
            }
        });

        displayed
    }

    fn log_transition(&self, from: SessionState, to: SessionState, reason: &str) {
        info!(
            session_id = %self.context.session_id,
            from = %from,
            to = %to,
            reason = %reason,
            "Search session state transition"
        );
    }
}
