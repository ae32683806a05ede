//! Facet aggregation over a filtered candidate set

use crate::search::document::IndexedDocument;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bucket for documents without a category
pub const UNCATEGORIZED: &str = "uncategorized";

/// Bucket for documents without an author
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Facet count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Creation-date bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    Last24h,
    LastWeek,
    LastMonth,
    LastYear,
    Older,
}

impl DateBucket {
    pub const ALL: [DateBucket; 5] = [
        DateBucket::Last24h,
        DateBucket::LastWeek,
        DateBucket::LastMonth,
        DateBucket::LastYear,
        DateBucket::Older,
    ];

    /// Bucket for a timestamp relative to `now`. Future timestamps count as last 24h.
    pub fn classify(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let age = now - timestamp;
        if age <= Duration::hours(24) {
            DateBucket::Last24h
        } else if age <= Duration::weeks(1) {
            DateBucket::LastWeek
        } else if age <= Duration::days(30) {
            DateBucket::LastMonth
        } else if age <= Duration::days(365) {
            DateBucket::LastYear
        } else {
            DateBucket::Older
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateBucket::Last24h => "last_24h",
            DateBucket::LastWeek => "last_week",
            DateBucket::LastMonth => "last_month",
            DateBucket::LastYear => "last_year",
            DateBucket::Older => "older",
        }
    }
}

/// Aggregated counts per dimension.
///
/// Content type, category, author and date range place each document in
/// exactly one bucket; tags count every tag a document carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFacets {
    pub content_types: Vec<FacetCount>,
    pub categories: Vec<FacetCount>,
    pub authors: Vec<FacetCount>,
    pub tags: Vec<FacetCount>,
    /// Always the five buckets in chronological order, zero counts included
    pub date_ranges: Vec<FacetCount>,
}

impl SearchFacets {
    pub fn compute<'a, I>(documents: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a IndexedDocument>,
    {
        let mut content_types: HashMap<String, usize> = HashMap::new();
        let mut categories: HashMap<String, usize> = HashMap::new();
        let mut authors: HashMap<String, usize> = HashMap::new();
        let mut tags: HashMap<String, usize> = HashMap::new();
        let mut dates: HashMap<DateBucket, usize> = HashMap::new();

        for doc in documents {
            *content_types.entry(doc.content_type.to_string()).or_insert(0) += 1;

            let category = doc
                .metadata
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *categories.entry(category).or_insert(0) += 1;

            let author = doc
                .author
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
            *authors.entry(author).or_insert(0) += 1;

            for tag in &doc.tags {
                *tags.entry(tag.clone()).or_insert(0) += 1;
            }

            *dates
                .entry(DateBucket::classify(doc.created_at, now))
                .or_insert(0) += 1;
        }

        Self {
            content_types: sorted_counts(content_types),
            categories: sorted_counts(categories),
            authors: sorted_counts(authors),
            tags: sorted_counts(tags),
            date_ranges: DateBucket::ALL
                .iter()
                .map(|bucket| FacetCount {
                    value: bucket.as_str().to_string(),
                    count: dates.get(bucket).copied().unwrap_or(0),
                })
                .collect(),
        }
    }
}

/// Count descending, then value ascending
fn sorted_counts(counts: HashMap<String, usize>) -> Vec<FacetCount> {
    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .map(|(value, count)| FacetCount { value, count })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    facets
}
