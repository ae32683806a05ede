//! In-memory full-text search over alumni platform content
//!
//! This module provides the query-time half of the platform:
//!
//! - **Search Index**: inverted index over titles, tags, keywords, descriptions
//!   and bodies with per-field weights and typo-tolerant term expansion
//! - **Query Processor**: conjunctive filters, relevance or field sorting,
//!   pagination, highlighting, facets and suggestions
//! - **Export**: CSV and JSON renditions of a result set
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           SearchEngine                           │
//! ├─────────────────────────────────────────────────┤
//! │  - search()          - get_suggestions()        │
//! │  - facets            - highlights               │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           SearchIndex (RwLock)                   │
//! ├─────────────────────────────────────────────────┤
//! │  - upsert()  - remove()  - query()              │
//! │  - postings: term -> active document keys       │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use alumni_search::search::{SearchConfig, SearchEngine, SearchIndex, SearchQuery};
//! use std::sync::Arc;
//!
//! let config = SearchConfig::default();
//! let index = Arc::new(SearchIndex::new(&config));
//! let engine = SearchEngine::new(index, config);
//!
//! let query = SearchQuery::new("data scientist")
//!     .with_content_types(vec!["jobs"])
//!     .with_limit(20);
//!
//! let response = engine.search(&query).unwrap();
//! println!("Found {} results", response.total);
//! ```

mod config;
mod document;
mod error;
mod export;
mod facets;
mod highlight;
mod index;
mod query;
mod service;
pub mod text;

pub use config::{FieldWeights, SearchConfig, SearchConfigBuilder};
pub use document::{Author, DocumentKey, DocumentMetadata, IndexedDocument};
pub use error::{SearchError, SearchResult};
pub use export::{ExportConfig, ExportField, ExportFormat, ResultExporter};
pub use facets::{DateBucket, FacetCount, SearchFacets};
pub use highlight::{Highlight, HighlightMatch};
pub use index::{
    IndexQueryOptions, IndexStats, ScoredDocument, SearchField, SearchIndex, TermMatch,
};
pub use query::{
    DateRange, Pagination, ResolvedFilters, SearchFilters, SearchOptions, SearchQuery, SearchSort,
    SortDirection, SortField,
};
pub use service::{
    ResultMetadata, SearchEngine, SearchResponse, SearchResultItem, SearchSuggestion,
    SuggestionKind,
};
