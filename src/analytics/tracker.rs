//! Best-effort analytics event recording and popular search queries

use crate::analytics::config::AnalyticsConfig;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::popular::{rank_popular, TrendRule, COUNTED_KINDS};
use crate::metrics::{ANALYTICS_EVENTS_TOTAL, ANALYTICS_FAILURES_TOTAL};
use crate::models::{
    PopularSearch, PopularityPeriod, SearchEvent, SearchEventData, SessionContext,
};
use crate::search::SearchFilters;
use crate::state::{AnalyticsStore, EventCriteria};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Records search analytics events.
///
/// Tracking never fails the caller: persistence errors are logged, counted
/// and dropped.
pub struct SearchAnalytics {
    store: Arc<dyn AnalyticsStore>,
    config: AnalyticsConfig,
}

impl SearchAnalytics {
    pub fn new(store: Arc<dyn AnalyticsStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    /// Append an event; returns whether it was persisted
    pub async fn track(&self, data: SearchEventData, context: &SessionContext) -> bool {
        let event = SearchEvent::new(data, context);
        let kind = event.kind().to_string();

        match self.store.append(&event).await {
            Ok(()) => {
                ANALYTICS_EVENTS_TOTAL.with_label_values(&[&kind]).inc();
                debug!(kind = %kind, session_id = %context.session_id, "Analytics event recorded");
                true
            }
            Err(e) => {
                ANALYTICS_FAILURES_TOTAL.inc();
                warn!(kind = %kind, error = %e, "Dropping analytics event");
                false
            }
        }
    }

    pub async fn track_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        result_count: usize,
        took_ms: u64,
        context: &SessionContext,
    ) -> bool {
        self.track(
            SearchEventData::Search {
                query: query.to_string(),
                filters: filters.clone(),
                result_count,
                took_ms,
            },
            context,
        )
        .await
    }

    pub async fn track_result_click(
        &self,
        query: &str,
        result_id: &str,
        position: usize,
        context: &SessionContext,
    ) -> bool {
        self.track(
            SearchEventData::ResultClick {
                query: query.to_string(),
                result_id: result_id.to_string(),
                position,
            },
            context,
        )
        .await
    }

    pub async fn track_filter_apply(
        &self,
        query: &str,
        filters: &SearchFilters,
        context: &SessionContext,
    ) -> bool {
        self.track(
            SearchEventData::FilterApply {
                query: query.to_string(),
                filters: filters.clone(),
            },
            context,
        )
        .await
    }

    pub async fn track_suggestion_click(
        &self,
        query: &str,
        suggestion: &str,
        position: usize,
        context: &SessionContext,
    ) -> bool {
        self.track(
            SearchEventData::SuggestionClick {
                query: query.to_string(),
                suggestion: suggestion.to_string(),
                position,
            },
            context,
        )
        .await
    }

    pub async fn track_voice_search(
        &self,
        query: &str,
        confidence: Option<f32>,
        context: &SessionContext,
    ) -> bool {
        self.track(
            SearchEventData::VoiceSearch {
                query: query.to_string(),
                confidence,
            },
            context,
        )
        .await
    }

    /// Most searched queries within `period`; `limit` defaults to the configured one
    pub async fn get_popular_searches(
        &self,
        period: PopularityPeriod,
        limit: Option<usize>,
    ) -> AnalyticsResult<Vec<PopularSearch>> {
        let limit = limit.unwrap_or(self.config.popular_limit);
        if limit == 0 {
            return Err(AnalyticsError::InvalidArgument(
                "limit must be greater than zero".to_string(),
            ));
        }

        let now = Utc::now();
        let lookback = period
            .duration()
            .map(|duration| duration.max(period.trend_window()));
        let mut criteria = COUNTED_KINDS
            .iter()
            .fold(EventCriteria::default(), |criteria, kind| criteria.kind(*kind))
            .until(now + chrono::Duration::seconds(1));
        if let Some(lookback) = lookback {
            criteria = criteria.since(now - lookback);
        }

        let events = self.store.query(&criteria).await?;
        Ok(rank_popular(
            &events,
            period,
            now,
            TrendRule {
                ratio: self.config.trending_ratio,
                min_count: self.config.trending_min_count,
            },
            limit,
        ))
    }
}
