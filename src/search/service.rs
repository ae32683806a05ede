//! Query processing: filtering, sorting, pagination, highlighting, facets and suggestions

use crate::metrics::{SEARCH_DURATION_SECONDS, SEARCH_ERRORS_TOTAL, SEARCH_REQUESTS_TOTAL};
use crate::models::ContentType;
use crate::search::config::SearchConfig;
use crate::search::document::{Author, IndexedDocument};
use crate::search::error::{SearchError, SearchResult};
use crate::search::facets::SearchFacets;
use crate::search::highlight::{highlight, Highlight};
use crate::search::index::{IndexQueryOptions, ScoredDocument, SearchIndex};
use crate::search::query::{SearchQuery, SortDirection, SortField};
use crate::search::text::{allowed_edits, bounded_edit_distance, normalize_text, tokenize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use validator::Validate;

/// Metadata block of a result item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub popularity: u64,
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,

    #[serde(rename = "type")]
    pub content_type: ContentType,

    pub title: String,
    pub description: String,

    /// Full body; empty when `include_content` is off
    pub content: String,

    pub url: String,
    pub tags: Vec<String>,
    pub author: Option<Author>,
    pub metadata: ResultMetadata,

    /// Relevance score, computed even when another field drives the sort
    pub score: f32,

    pub highlights: Vec<Highlight>,
}

impl SearchResultItem {
    fn from_scored(scored: &ScoredDocument, query: &SearchQuery, context_chars: usize) -> Self {
        let doc = &scored.document;
        Self {
            id: doc.id.clone(),
            content_type: doc.content_type,
            title: doc.title.clone(),
            description: doc.description.clone(),
            content: if query.options.include_content {
                doc.content.clone()
            } else {
                String::new()
            },
            url: doc.url.clone(),
            tags: doc.tags.clone(),
            author: doc.author.clone(),
            metadata: ResultMetadata {
                created_at: doc.created_at,
                updated_at: doc.updated_at,
                category: doc.metadata.category.clone(),
                location: doc.metadata.location.clone(),
                company: doc.metadata.company.clone(),
                level: doc.metadata.level.clone(),
                status: doc.metadata.status.clone(),
                popularity: doc.metadata.popularity,
            },
            score: scored.score,
            highlights: if query.options.highlight_results {
                highlight(scored, context_chars)
            } else {
                Vec::new()
            },
        }
    }
}

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Prefix or fuzzy match against an indexed title
    Title,
    /// Title of a top-scoring match
    Result,
    /// Earlier query from the session history
    History,
    /// Popular query across users
    Popular,
}

/// Search suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSuggestion {
    pub text: String,
    pub kind: SuggestionKind,
    pub score: f32,
    pub content_type: Option<ContentType>,
}

/// Search response with results and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,

    /// The requested page
    pub results: Vec<SearchResultItem>,

    /// Matching documents before pagination
    pub total: usize,

    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_more: bool,

    /// Counts over the full filtered set (if requested)
    pub facets: Option<SearchFacets>,

    pub suggestions: Vec<SearchSuggestion>,

    /// Query execution time in milliseconds
    pub took_ms: u64,
}

impl SearchResponse {
    /// A response with no results, used for cleared/browse-empty states
    pub fn empty(query: &SearchQuery) -> Self {
        Self {
            query: query.query.clone(),
            results: Vec::new(),
            total: 0,
            page: query.pagination.page,
            limit: query.pagination.limit,
            total_pages: 0,
            has_more: false,
            facets: None,
            suggestions: Vec::new(),
            took_ms: 0,
        }
    }
}

/// Query processor over a shared [`SearchIndex`].
///
/// Every operation is synchronous: it reads the index under its read lock and
/// never suspends.
pub struct SearchEngine {
    index: Arc<SearchIndex>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(index: Arc<SearchIndex>, config: SearchConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Execute a search query
    pub fn search(&self, query: &SearchQuery) -> SearchResult<SearchResponse> {
        let mode = if query.is_browse() { "browse" } else { "text" };
        SEARCH_REQUESTS_TOTAL.with_label_values(&[mode]).inc();
        let _timer = SEARCH_DURATION_SECONDS.start_timer();

        let result = self.execute(query);
        if let Err(ref e) = result {
            let kind = match e {
                SearchError::InvalidFilter(_) => "invalid_filter",
                SearchError::InvalidQuery(_) => "invalid_query",
                SearchError::IndexNotReady => "index_not_ready",
                SearchError::UnsupportedFormat(_) | SearchError::ExportFailed(_) => "export",
            };
            SEARCH_ERRORS_TOTAL.with_label_values(&[kind]).inc();
        }
        result
    }

    fn execute(&self, query: &SearchQuery) -> SearchResult<SearchResponse> {
        let start = Instant::now();

        query.validate()?;
        let filters = query.filters.resolve()?;

        let pagination = query.pagination;
        let offset = pagination.effective_offset();
        if let Some(requested) = pagination.offset {
            if requested != offset {
                debug!(
                    requested_offset = requested,
                    effective_offset = offset,
                    "Ignoring offset that disagrees with page * limit"
                );
            }
        }

        let mut candidates = self.candidates(query)?;
        candidates.retain(|candidate| filters.matches(&candidate.document));

        let cap = query
            .options
            .max_results
            .unwrap_or(self.config.max_results)
            .min(self.config.max_results);
        candidates.truncate(cap);

        let total = candidates.len();

        let facets = (query.options.include_facets && self.config.enable_facets).then(|| {
            SearchFacets::compute(candidates.iter().map(|c| c.document.as_ref()), Utc::now())
        });

        let suggestions = if query.options.include_suggestions
            && self.config.enable_suggestions
            && !query.is_browse()
        {
            self.suggestions_for(&query.query, &candidates)
        } else {
            Vec::new()
        };

        sort_candidates(&mut candidates, query.sort.field, query.sort.direction);

        let results: Vec<SearchResultItem> = candidates
            .iter()
            .skip(offset)
            .take(pagination.limit)
            .map(|c| SearchResultItem::from_scored(c, query, self.config.highlight_context_chars))
            .collect();

        let took_ms = start.elapsed().as_millis() as u64;
        debug!(
            query = %query.query,
            total,
            returned = results.len(),
            took_ms,
            "Search completed"
        );

        Ok(SearchResponse {
            query: query.query.clone(),
            results,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: total.div_ceil(pagination.limit),
            has_more: offset.saturating_add(pagination.limit) < total,
            facets,
            suggestions,
            took_ms,
        })
    }

    /// Ranked candidates before filtering; browse mode ranks the whole active set by boost
    fn candidates(&self, query: &SearchQuery) -> SearchResult<Vec<ScoredDocument>> {
        if query.is_browse() {
            let mut all: Vec<ScoredDocument> = self
                .index
                .active_documents()
                .into_iter()
                .map(|document| ScoredDocument {
                    score: document.boost,
                    document,
                    matches: Vec::new(),
                    phrase_match: false,
                })
                .filter(|c| query.options.min_score.map_or(true, |min| c.score >= min))
                .collect();
            all.sort_by(ScoredDocument::ranking_cmp);
            return Ok(all);
        }

        let edit_distance = query.options.edit_distance(self.config.max_edit_distance);
        let options = IndexQueryOptions {
            fuzzy: edit_distance.is_some(),
            max_edit_distance: edit_distance.unwrap_or(0),
            min_score: query.options.min_score,
            max_results: None,
        };
        self.index.query(&query.query, &options)
    }

    /// Suggestions for a partial query.
    ///
    /// Input shorter than the configured minimum returns nothing without
    /// touching the index.
    pub fn get_suggestions(&self, partial: &str) -> Vec<SearchSuggestion> {
        let partial = partial.trim();
        if partial.chars().count() < self.config.min_suggestion_chars {
            return Vec::new();
        }

        let options = IndexQueryOptions {
            max_edit_distance: self.config.max_edit_distance,
            max_results: Some(self.config.suggestion_limit.max(1)),
            ..Default::default()
        };
        let top = self.index.query(partial, &options).unwrap_or_default();
        self.suggestions_for(partial, &top)
    }

    /// Title prefix/fuzzy matches merged with the titles of the best candidates
    fn suggestions_for(&self, partial: &str, ranked: &[ScoredDocument]) -> Vec<SearchSuggestion> {
        let normalized = normalize_text(partial);
        let Some(last_token) = tokenize(partial).pop() else {
            return Vec::new();
        };
        let max_edits = allowed_edits(&last_token, self.config.max_edit_distance.min(1));

        let mut merged: HashMap<String, SearchSuggestion> = HashMap::new();
        let mut offer = |suggestion: SearchSuggestion| {
            let key = suggestion.text.to_lowercase();
            match merged.get(&key) {
                Some(existing) if existing.score >= suggestion.score => {}
                _ => {
                    merged.insert(key, suggestion);
                }
            }
        };

        for doc in self.index.active_documents() {
            if let Some(score) = title_match_score(&doc, &normalized, &last_token, max_edits) {
                offer(SearchSuggestion {
                    text: doc.title.clone(),
                    kind: SuggestionKind::Title,
                    score,
                    content_type: Some(doc.content_type),
                });
            }
        }

        if let Some(best) = ranked.first().map(|c| c.score).filter(|s| *s > 0.0) {
            for candidate in ranked.iter().take(self.config.suggestion_limit) {
                offer(SearchSuggestion {
                    text: candidate.document.title.clone(),
                    kind: SuggestionKind::Result,
                    score: 1.0 + candidate.score / best,
                    content_type: Some(candidate.document.content_type),
                });
            }
        }

        let mut suggestions: Vec<SearchSuggestion> = merged.into_values().collect();
        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.text.cmp(&b.text)));
        suggestions.truncate(self.config.suggestion_limit);
        suggestions
    }
}

/// 3.0 for a whole-title prefix, 2.5 for a word prefix, 1.5 for a word within the edit bound
fn title_match_score(
    doc: &IndexedDocument,
    normalized_partial: &str,
    last_token: &str,
    max_edits: usize,
) -> Option<f32> {
    let title = normalize_text(&doc.title);
    if title.starts_with(normalized_partial) {
        return Some(3.0);
    }
    let words = tokenize(&doc.title);
    if words.iter().any(|word| word.starts_with(last_token)) {
        return Some(2.5);
    }
    if max_edits > 0
        && words
            .iter()
            .any(|word| bounded_edit_distance(last_token, word, max_edits).is_some())
    {
        return Some(1.5);
    }
    None
}

fn sort_candidates(candidates: &mut [ScoredDocument], field: SortField, direction: SortDirection) {
    let apply = |ordering: Ordering| match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    match field {
        SortField::Relevance => match direction {
            SortDirection::Desc => candidates.sort_by(ScoredDocument::ranking_cmp),
            SortDirection::Asc => candidates
                .sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.tie_break_cmp(b))),
        },
        SortField::Date => candidates.sort_by(|a, b| {
            apply(a.document.created_at.cmp(&b.document.created_at)).then_with(|| a.ranking_cmp(b))
        }),
        SortField::Title => candidates.sort_by(|a, b| {
            apply(
                a.document
                    .title
                    .to_lowercase()
                    .cmp(&b.document.title.to_lowercase()),
            )
            .then_with(|| a.ranking_cmp(b))
        }),
        SortField::Author => candidates.sort_by(|a, b| {
            let name = |c: &ScoredDocument| {
                c.document
                    .author
                    .as_ref()
                    .map(|author| author.name.to_lowercase())
                    .unwrap_or_default()
            };
            apply(name(a).cmp(&name(b))).then_with(|| a.ranking_cmp(b))
        }),
        SortField::Popularity => candidates.sort_by(|a, b| {
            apply(
                a.document
                    .metadata
                    .popularity
                    .cmp(&b.document.metadata.popularity),
            )
            .then_with(|| a.ranking_cmp(b))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;
    use crate::search::document::DocumentMetadata;
    use crate::search::query::SearchFilters;
    use crate::search::text::extract_keywords;
    use chrono::TimeZone;

    fn job(id: &str, title: &str, company: &str, popularity: u64) -> IndexedDocument {
        let searchable_text = normalize_text(title);
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::days(popularity as i64);
        IndexedDocument {
            id: id.to_string(),
            content_type: ContentType::Jobs,
            title: title.to_string(),
            content: format!("{} at {}", title, company),
            description: String::new(),
            url: format!("/jobs/{}", id),
            tags: vec![],
            keywords: extract_keywords(&searchable_text, 10),
            searchable_text,
            language: Language::Es,
            boost: 1.0,
            created_at: created,
            updated_at: created,
            is_active: true,
            author: None,
            metadata: DocumentMetadata {
                company: Some(company.to_string()),
                popularity,
                ..Default::default()
            },
        }
    }

    fn engine() -> SearchEngine {
        let config = SearchConfig::default();
        let index = Arc::new(SearchIndex::new(&config));
        index.upsert(job("1", "Senior Data Scientist", "TechCorp", 30));
        index.upsert(job("2", "Data Analyst Junior", "Startup Fintech", 10));
        index.upsert(job("3", "ML Engineer", "AI Solutions", 20));
        SearchEngine::new(index, config)
    }

    #[test]
    fn test_text_search_with_pagination() {
        let engine = engine();
        let response = engine
            .search(&SearchQuery::new("data").with_limit(2))
            .unwrap();

        assert_eq!(response.total, 2);
        assert_eq!(response.results.len(), 2);
        assert!(!response.has_more);
        assert_eq!(response.total_pages, 1);
        assert!(response.results.iter().all(|r| r.title.contains("Data")));
    }

    #[test]
    fn test_browse_mode_returns_all_active() {
        let engine = engine();
        let response = engine
            .search(&SearchQuery::browse().with_limit(2).with_page(1))
            .unwrap();

        assert_eq!(response.total, 3);
        assert_eq!(response.total_pages, 2);
        assert_eq!(response.results.len(), 1);
        assert!(!response.has_more);
    }

    #[test]
    fn test_sort_by_popularity_ascending() {
        let engine = engine();
        let response = engine
            .search(&SearchQuery::browse().with_sort(SortField::Popularity, SortDirection::Asc))
            .unwrap();

        let ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
        assert!(response.results.iter().all(|r| r.score > 0.0));
    }

    #[test]
    fn test_company_filter() {
        let engine = engine();
        let query = SearchQuery::browse()
            .with_filters(SearchFilters::default().with_company("techcorp"));
        let response = engine.search(&query).unwrap();

        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].id, "1");
    }

    #[test]
    fn test_invalid_content_type_filter() {
        let engine = engine();
        let query = SearchQuery::new("data").with_content_types(vec!["nonexistent-type"]);
        assert!(matches!(
            engine.search(&query),
            Err(SearchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let engine = engine();
        let query = SearchQuery::new("data").with_content_types(vec!["events"]);
        let response = engine.search(&query).unwrap();
        assert_eq!(response.total, 0);
        assert!(response.results.is_empty());
        assert_eq!(response.total_pages, 0);
    }

    #[test]
    fn test_include_content_and_highlight_flags() {
        let engine = engine();
        let mut query = SearchQuery::new("scientist").with_highlight(false);
        query.options.include_content = false;

        let response = engine.search(&query).unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].content.is_empty());
        assert!(response.results[0].highlights.is_empty());

        let response = engine.search(&SearchQuery::new("scientist")).unwrap();
        assert!(!response.results[0].highlights.is_empty());
    }

    #[test]
    fn test_short_suggestion_input_skips_index() {
        let engine = engine();
        let before = engine.index().stats().reads;
        assert!(engine.get_suggestions("a").is_empty());
        assert_eq!(engine.index().stats().reads, before);
    }

    #[test]
    fn test_suggestions_prefer_title_prefix() {
        let engine = engine();
        let suggestions = engine.get_suggestions("sen");
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].text, "Senior Data Scientist");
        assert!(suggestions.len() <= engine.config().suggestion_limit);
    }
}
