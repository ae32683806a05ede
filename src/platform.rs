//! Composition root owning every search service
//!
//! One [`SearchPlatform`] is built per process (or per test) and shared behind
//! an `Arc`; sessions borrow its services instead of reaching for globals.

use crate::analytics::{PreferencesService, SearchAnalytics, SearchHistory};
use crate::config::Config;
use crate::indexer::{ContentNormalizer, Indexer, IndexingReport, IndexingStatus};
use crate::search::{
    ExportConfig, ResultExporter, SearchEngine, SearchError, SearchIndex, SearchQuery,
    SearchResponse, SearchResult, SearchSuggestion,
};
use crate::state::{
    AnalyticsStore, ContentStore, InMemoryAnalyticsStore, InMemoryPreferencesStore,
    PreferencesStore,
};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SearchPlatform {
    config: Config,
    engine: SearchEngine,
    indexer: Indexer,
    analytics: SearchAnalytics,
    history: SearchHistory,
    preferences: PreferencesService,
}

impl SearchPlatform {
    pub fn new(
        config: Config,
        content: Arc<dyn ContentStore>,
        analytics_store: Arc<dyn AnalyticsStore>,
        preferences_store: Arc<dyn PreferencesStore>,
    ) -> Self {
        let index = Arc::new(SearchIndex::new(&config.search));
        let engine = SearchEngine::new(index.clone(), config.search.clone());
        let indexer = Indexer::new(
            content,
            index,
            ContentNormalizer::new(&config.search),
            config.indexer.clone(),
        );
        let analytics = SearchAnalytics::new(analytics_store, config.analytics.clone());
        let history = SearchHistory::new(config.analytics.history_limit);
        let preferences = PreferencesService::new(preferences_store);

        Self {
            config,
            engine,
            indexer,
            analytics,
            history,
            preferences,
        }
    }

    /// Platform with in-memory analytics and preferences stores
    pub fn in_memory(config: Config, content: Arc<dyn ContentStore>) -> Self {
        Self::new(
            config,
            content,
            Arc::new(InMemoryAnalyticsStore::new()),
            Arc::new(InMemoryPreferencesStore::new()),
        )
    }

    /// Run a query against the index.
    ///
    /// Fails with [`SearchError::IndexNotReady`] until the first full index
    /// pass has completed.
    pub async fn search(&self, query: &SearchQuery) -> SearchResult<SearchResponse> {
        self.require_ready()?;
        self.engine.search(query)
    }

    /// Title suggestions for a partial query.
    ///
    /// Input shorter than the configured minimum returns nothing and never
    /// touches the index.
    pub async fn get_suggestions(&self, partial: &str) -> SearchResult<Vec<SearchSuggestion>> {
        if partial.trim().chars().count() < self.config.search.min_suggestion_chars {
            debug!(partial = %partial, "Suggestion input below minimum length");
            return Ok(Vec::new());
        }
        self.require_ready()?;
        Ok(self.engine.get_suggestions(partial))
    }

    pub async fn index_all_content(&self) -> IndexingReport {
        let report = self.indexer.index_all_content().await;
        info!(
            documents = self.engine.index().len(),
            errors = report.errors.len(),
            "Search platform index rebuilt"
        );
        report
    }

    /// Build the index unless a full pass already completed
    pub async fn ensure_ready(&self) -> Option<IndexingReport> {
        self.indexer.ensure_ready().await
    }

    pub fn get_indexing_status(&self) -> IndexingStatus {
        self.indexer.get_indexing_status()
    }

    /// Export the results of `config.query` as a byte payload
    pub async fn export_results(&self, config: &ExportConfig) -> SearchResult<Vec<u8>> {
        ResultExporter::check_format(config.format)?;
        self.require_ready()?;
        ResultExporter::export(&self.engine, config)
    }

    pub fn is_ready(&self) -> bool {
        self.indexer.is_ready()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        self.engine.index()
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn analytics(&self) -> &SearchAnalytics {
        &self.analytics
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn preferences(&self) -> &PreferencesService {
        &self.preferences
    }

    fn require_ready(&self) -> SearchResult<()> {
        if self.indexer.is_ready() {
            Ok(())
        } else {
            Err(SearchError::IndexNotReady)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, RawRecord};
    use crate::search::ExportFormat;
    use crate::state::InMemoryContentStore;
    use serde_json::json;

    fn platform() -> SearchPlatform {
        let store = InMemoryContentStore::new();
        store.insert(
            ContentType::Jobs,
            RawRecord::from_value(json!({
                "id": "job-1",
                "title": "Senior Data Scientist",
                "company": "TechCorp",
                "isActive": true
            }))
            .unwrap(),
        );
        SearchPlatform::in_memory(Config::default(), Arc::new(store))
    }

    #[tokio::test]
    async fn test_search_before_first_build_is_rejected() {
        let platform = platform();
        assert!(matches!(
            platform.search(&SearchQuery::new("data")).await,
            Err(SearchError::IndexNotReady)
        ));
        assert!(matches!(
            platform.get_suggestions("data").await,
            Err(SearchError::IndexNotReady)
        ));

        platform.index_all_content().await;
        let response = platform.search(&SearchQuery::new("data")).await.unwrap();
        assert_eq!(response.total, 1);
    }

    #[tokio::test]
    async fn test_short_suggestion_input_skips_index() {
        let platform = platform();
        platform.index_all_content().await;
        let reads = platform.index().stats().reads;

        assert!(platform.get_suggestions("a").await.unwrap().is_empty());
        assert_eq!(platform.index().stats().reads, reads);
    }

    #[tokio::test]
    async fn test_unsupported_export_fails_before_readiness() {
        let platform = platform();
        let result = platform
            .export_results(&ExportConfig::new(ExportFormat::Pdf))
            .await;
        assert!(matches!(result, Err(SearchError::UnsupportedFormat(_))));
    }
}
