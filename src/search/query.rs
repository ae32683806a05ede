//! Search query structures, filter resolution and validation

use crate::models::{ContentType, Language};
use crate::search::document::IndexedDocument;
use crate::search::error::{SearchError, SearchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use strum::{Display, EnumString};
use validator::Validate;

/// Field to sort by
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    Relevance,
    Date,
    Title,
    Author,
    Popularity,
}

/// Sort order for search results
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Sorting criteria
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SearchSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Inclusive creation date range
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Search filter options. All filters combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchFilters {
    /// Content type names; empty or `"all"` means every type
    pub content_types: Vec<String>,

    /// Filter by creation date
    pub date_range: Option<DateRange>,

    /// Case-insensitive substring of the document location
    pub location: Option<String>,

    /// Every listed tag must be present
    pub tags: Vec<String>,

    /// Author id, or a substring of the author name
    pub author: Option<String>,

    pub category: Option<String>,
    pub level: Option<String>,

    /// Case-insensitive substring of the company name
    pub company: Option<String>,

    pub status: Option<String>,

    /// Language code (`es` | `en`)
    pub language: Option<String>,
}

impl SearchFilters {
    /// Filter to a set of content types
    pub fn with_content_types(mut self, types: Vec<impl Into<String>>) -> Self {
        self.content_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by tags
    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_range = Some(DateRange { from, to });
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Check values against their domains and compile the predicate
    pub fn resolve(&self) -> SearchResult<ResolvedFilters> {
        let mut content_types = BTreeSet::new();
        let mut all_types = self.content_types.is_empty();
        for name in &self.content_types {
            let name = name.trim();
            if name.eq_ignore_ascii_case("all") {
                all_types = true;
                continue;
            }
            let content_type = ContentType::from_str(name).map_err(|_| {
                SearchError::InvalidFilter(format!("unsupported content type '{}'", name))
            })?;
            content_types.insert(content_type);
        }

        let language = match self.language.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(Language::from_str(code).map_err(|_| {
                SearchError::InvalidFilter(format!("unsupported language '{}'", code))
            })?),
        };

        if let Some(DateRange {
            from: Some(from),
            to: Some(to),
        }) = self.date_range
        {
            if from > to {
                return Err(SearchError::InvalidFilter(format!(
                    "date range starts after it ends ({} > {})",
                    from, to
                )));
            }
        }

        Ok(ResolvedFilters {
            content_types: (!all_types).then_some(content_types),
            date_range: self.date_range,
            location: normalized(&self.location),
            tags: self
                .tags
                .iter()
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
            author: normalized(&self.author),
            category: normalized(&self.category),
            level: normalized(&self.level),
            company: normalized(&self.company),
            status: normalized(&self.status),
            language,
        })
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn eq_ignore_case(value: &Option<String>, expected: &str) -> bool {
    value
        .as_deref()
        .is_some_and(|v| v.trim().to_lowercase() == expected)
}

fn contains_ignore_case(value: &Option<String>, needle: &str) -> bool {
    value
        .as_deref()
        .is_some_and(|v| v.to_lowercase().contains(needle))
}

/// Validated filters, ready to test documents against
#[derive(Debug, Clone, Default)]
pub struct ResolvedFilters {
    /// `None` means every type
    pub content_types: Option<BTreeSet<ContentType>>,
    date_range: Option<DateRange>,
    location: Option<String>,
    tags: Vec<String>,
    author: Option<String>,
    category: Option<String>,
    level: Option<String>,
    company: Option<String>,
    status: Option<String>,
    language: Option<Language>,
}

impl ResolvedFilters {
    pub fn matches(&self, doc: &IndexedDocument) -> bool {
        if let Some(ref types) = self.content_types {
            if !types.contains(&doc.content_type) {
                return false;
            }
        }

        if let Some(range) = self.date_range {
            if range.from.is_some_and(|from| doc.created_at < from)
                || range.to.is_some_and(|to| doc.created_at > to)
            {
                return false;
            }
        }

        if let Some(ref location) = self.location {
            if !contains_ignore_case(&doc.metadata.location, location) {
                return false;
            }
        }

        if !self.tags.is_empty() {
            let doc_tags: BTreeSet<String> =
                doc.tags.iter().map(|tag| tag.to_lowercase()).collect();
            if !self.tags.iter().all(|tag| doc_tags.contains(tag)) {
                return false;
            }
        }

        if let Some(ref author) = self.author {
            let matched = doc.author.as_ref().is_some_and(|a| {
                a.id.to_lowercase() == *author || a.name.to_lowercase().contains(author.as_str())
            });
            if !matched {
                return false;
            }
        }

        if let Some(ref category) = self.category {
            if !eq_ignore_case(&doc.metadata.category, category) {
                return false;
            }
        }

        if let Some(ref level) = self.level {
            if !eq_ignore_case(&doc.metadata.level, level) {
                return false;
            }
        }

        if let Some(ref company) = self.company {
            if !contains_ignore_case(&doc.metadata.company, company) {
                return false;
            }
        }

        if let Some(ref status) = self.status {
            if !eq_ignore_case(&doc.metadata.status, status) {
                return false;
            }
        }

        if let Some(language) = self.language {
            if doc.language != language {
                return false;
            }
        }

        true
    }
}

/// Page selection. `page` and `limit` are authoritative; `offset` is derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct Pagination {
    /// Zero-based page number
    pub page: usize,

    /// Items per page
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,

    /// Accepted for compatibility; ignored when it disagrees with `page * limit`
    pub offset: Option<usize>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            limit: 20,
            offset: None,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            offset: None,
        }
    }

    /// Offset of the first item on the page, saturating for out-of-range pages
    pub fn effective_offset(&self) -> usize {
        self.page.saturating_mul(self.limit)
    }
}

/// Per-query matching and presentation options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct SearchOptions {
    /// Match terms within one edit
    pub fuzzy_matching: bool,

    /// Match terms within the configured maximum edit distance
    pub typo_tolerance: bool,

    pub highlight_results: bool,

    /// Include the full body in result items
    pub include_content: bool,

    #[validate(range(min = 0.0))]
    pub min_score: Option<f32>,

    #[validate(range(min = 1))]
    pub max_results: Option<usize>,

    pub include_facets: bool,

    pub include_suggestions: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            fuzzy_matching: true,
            typo_tolerance: true,
            highlight_results: true,
            include_content: true,
            min_score: None,
            max_results: None,
            include_facets: true,
            include_suggestions: true,
        }
    }
}

impl SearchOptions {
    /// Edit distance to tolerate given the configured maximum; `None` disables fuzzy matching
    pub fn edit_distance(&self, configured_max: usize) -> Option<usize> {
        if self.typo_tolerance {
            Some(configured_max)
        } else if self.fuzzy_matching {
            Some(configured_max.min(1))
        } else {
            None
        }
    }
}

/// Main search query structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(default)]
pub struct SearchQuery {
    /// Free text; empty means browse mode
    pub query: String,

    pub filters: SearchFilters,

    pub sort: SearchSort,

    #[validate(nested)]
    pub pagination: Pagination,

    #[validate(nested)]
    pub options: SearchOptions,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Browse the whole active set
    pub fn browse() -> Self {
        Self::default()
    }

    pub fn is_browse(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Set filters
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Filter by content types
    pub fn with_content_types(mut self, types: Vec<impl Into<String>>) -> Self {
        self.filters.content_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by tags
    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.filters.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set sorting
    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = SearchSort::new(field, direction);
        self
    }

    /// Set page number
    pub fn with_page(mut self, page: usize) -> Self {
        self.pagination.page = page;
        self
    }

    /// Set page size
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.pagination.limit = limit;
        self
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable/disable fuzzy matching and typo tolerance together
    pub fn with_fuzzy(mut self, enabled: bool) -> Self {
        self.options.fuzzy_matching = enabled;
        self.options.typo_tolerance = enabled;
        self
    }

    /// Enable/disable highlighting
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.options.highlight_results = highlight;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.options.min_score = Some(min_score);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.options.max_results = Some(max_results);
        self
    }
}
