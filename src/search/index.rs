//! In-memory inverted index with weighted, typo-tolerant ranking

use crate::models::ContentType;
use crate::search::config::{FieldWeights, SearchConfig};
use crate::search::document::{DocumentKey, IndexedDocument};
use crate::search::error::{SearchError, SearchResult};
use crate::search::text::{allowed_edits, bounded_edit_distance, query_terms, tokenize};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Document fields that take part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Tags,
    Keywords,
    Description,
    Content,
}

impl SearchField {
    pub const ALL: [SearchField; 5] = [
        SearchField::Title,
        SearchField::Tags,
        SearchField::Keywords,
        SearchField::Description,
        SearchField::Content,
    ];

    pub fn weight(&self, weights: &FieldWeights) -> f32 {
        match self {
            SearchField::Title => weights.title,
            SearchField::Tags => weights.tags,
            SearchField::Keywords => weights.keywords,
            SearchField::Description => weights.description,
            SearchField::Content => weights.content,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Tags => "tags",
            SearchField::Keywords => "keywords",
            SearchField::Description => "description",
            SearchField::Content => "content",
        }
    }
}

/// How one query term matched one field of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMatch {
    /// Term as typed by the user (normalized)
    pub query_term: String,
    /// Indexed term it matched
    pub matched_term: String,
    pub field: SearchField,
    /// 0 for exact matches
    pub edit_distance: usize,
    pub term_frequency: u32,
}

/// A ranked candidate returned by [`SearchIndex::query`]
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Arc<IndexedDocument>,
    pub score: f32,
    pub matches: Vec<TermMatch>,
    pub phrase_match: bool,
}

impl ScoredDocument {
    /// Indexed terms matched in `field`, deduplicated
    pub fn matched_terms(&self, field: SearchField) -> Vec<&str> {
        let mut terms: Vec<&str> = self
            .matches
            .iter()
            .filter(|m| m.field == field)
            .map(|m| m.matched_term.as_str())
            .collect();
        terms.sort_unstable();
        terms.dedup();
        terms
    }

    /// Ranking order: score desc, most recently updated first, then id asc
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.tie_break_cmp(other))
    }

    /// Order between equal scores: most recently updated first, then id asc
    pub fn tie_break_cmp(&self, other: &Self) -> Ordering {
        other
            .document
            .updated_at
            .cmp(&self.document.updated_at)
            .then_with(|| self.document.id.cmp(&other.document.id))
            .then_with(|| self.document.content_type.cmp(&other.document.content_type))
    }
}

/// Options for a single index query
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQueryOptions {
    /// Tolerate typos within the edit distance bound
    pub fuzzy: bool,
    pub max_edit_distance: usize,
    /// Drop candidates scoring below this value
    pub min_score: Option<f32>,
    /// Cap on returned candidates
    pub max_results: Option<usize>,
}

impl Default for IndexQueryOptions {
    fn default() -> Self {
        Self {
            fuzzy: true,
            max_edit_distance: 2,
            min_score: None,
            max_results: None,
        }
    }
}

impl IndexQueryOptions {
    fn validate(&self) -> SearchResult<()> {
        if let Some(min_score) = self.min_score {
            if !min_score.is_finite() || min_score < 0.0 {
                return Err(SearchError::InvalidQuery(format!(
                    "min_score must be a non-negative number, got {}",
                    min_score
                )));
            }
        }
        if self.max_results == Some(0) {
            return Err(SearchError::InvalidQuery(
                "max_results must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Documents stored, inactive ones included
    pub total_documents: usize,
    /// Documents visible to queries
    pub active_documents: usize,
    /// Distinct indexed terms
    pub vocabulary_size: usize,
    /// Queries and scans served since creation
    pub reads: u64,
}

struct IndexedEntry {
    document: Arc<IndexedDocument>,
    field_terms: HashMap<SearchField, HashMap<String, u32>>,
    tokens: Vec<String>,
}

impl IndexedEntry {
    fn build(document: IndexedDocument) -> Self {
        let mut field_terms: HashMap<SearchField, HashMap<String, u32>> = HashMap::new();

        let mut add = |field: SearchField, text: &str| {
            let counts = field_terms.entry(field).or_default();
            for token in tokenize(text) {
                *counts.entry(token).or_insert(0) += 1;
            }
        };

        add(SearchField::Title, &document.title);
        for tag in &document.tags {
            add(SearchField::Tags, tag);
        }
        for keyword in &document.keywords {
            add(SearchField::Keywords, keyword);
        }
        add(SearchField::Description, &document.description);
        add(SearchField::Content, &document.content);

        let tokens = tokenize(&document.searchable_text);

        Self {
            document: Arc::new(document),
            field_terms,
            tokens,
        }
    }

    fn terms(&self) -> BTreeSet<&str> {
        self.field_terms
            .values()
            .flat_map(|counts| counts.keys().map(String::as_str))
            .collect()
    }

    fn contains_phrase(&self, phrase: &[String]) -> bool {
        phrase.len() > 1
            && self
                .tokens
                .windows(phrase.len())
                .any(|window| window == phrase)
    }
}

#[derive(Default)]
struct IndexState {
    documents: HashMap<DocumentKey, IndexedEntry>,
    /// term -> active documents containing it
    postings: HashMap<String, BTreeSet<DocumentKey>>,
}

impl IndexState {
    fn unlink(&mut self, key: &DocumentKey, entry: &IndexedEntry) {
        for term in entry.terms() {
            if let Some(keys) = self.postings.get_mut(term) {
                keys.remove(key);
                if keys.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
    }
}

/// Scoring parameters copied from [`SearchConfig`]
#[derive(Debug, Clone)]
struct Scoring {
    weights: FieldWeights,
    fuzzy_penalty_per_edit: f32,
    exact_phrase_multiplier: f32,
}

impl Scoring {
    fn match_factor(&self, edit_distance: usize) -> f32 {
        (1.0 - self.fuzzy_penalty_per_edit * edit_distance as f32).max(0.05)
    }
}

/// The search index.
///
/// All state sits behind one `RwLock`: upserts and removals take the write
/// lock for the whole replacement, queries hold the read lock for the whole
/// scoring pass, so a reader never sees a half-replaced document.
pub struct SearchIndex {
    state: RwLock<IndexState>,
    scoring: Scoring,
    reads: AtomicU64,
}

impl SearchIndex {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            scoring: Scoring {
                weights: config.field_weights,
                fuzzy_penalty_per_edit: config.fuzzy_penalty_per_edit,
                exact_phrase_multiplier: config.exact_phrase_multiplier,
            },
            reads: AtomicU64::new(0),
        }
    }

    /// Insert or replace a document by `(id, type)`
    pub fn upsert(&self, document: IndexedDocument) {
        let key = document.key();
        let entry = IndexedEntry::build(document);

        let mut state = self.state.write();
        if let Some(previous) = state.documents.remove(&key) {
            state.unlink(&key, &previous);
        }
        if entry.document.is_active {
            for term in entry.terms() {
                state
                    .postings
                    .entry(term.to_string())
                    .or_default()
                    .insert(key.clone());
            }
        }
        state.documents.insert(key, entry);
    }

    /// Remove a document; returns whether it was present
    pub fn remove(&self, id: &str, content_type: ContentType) -> bool {
        let key = DocumentKey::new(content_type, id);
        let mut state = self.state.write();
        match state.documents.remove(&key) {
            Some(entry) => {
                state.unlink(&key, &entry);
                true
            }
            None => false,
        }
    }

    /// Fetch a stored document, inactive ones included
    pub fn get(&self, id: &str, content_type: ContentType) -> Option<Arc<IndexedDocument>> {
        let key = DocumentKey::new(content_type, id);
        self.state
            .read()
            .documents
            .get(&key)
            .map(|entry| entry.document.clone())
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.state.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of every stored document of a type
    pub fn keys_of_type(&self, content_type: ContentType) -> Vec<DocumentKey> {
        let state = self.state.read();
        let mut keys: Vec<DocumentKey> = state
            .documents
            .keys()
            .filter(|key| key.content_type == content_type)
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Active document counts per content type
    pub fn active_counts(&self) -> BTreeMap<ContentType, usize> {
        let state = self.state.read();
        let mut counts = BTreeMap::new();
        for entry in state.documents.values() {
            if entry.document.is_active {
                *counts.entry(entry.document.content_type).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Every active document, ordered by key
    pub fn active_documents(&self) -> Vec<Arc<IndexedDocument>> {
        self.reads.fetch_add(1, AtomicOrdering::Relaxed);
        let state = self.state.read();
        let mut documents: Vec<(&DocumentKey, Arc<IndexedDocument>)> = state
            .documents
            .iter()
            .filter(|(_, entry)| entry.document.is_active)
            .map(|(key, entry)| (key, entry.document.clone()))
            .collect();
        documents.sort_by(|a, b| a.0.cmp(b.0));
        documents.into_iter().map(|(_, doc)| doc).collect()
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.documents.clear();
        state.postings.clear();
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            total_documents: state.documents.len(),
            active_documents: state
                .documents
                .values()
                .filter(|entry| entry.document.is_active)
                .count(),
            vocabulary_size: state.postings.len(),
            reads: self.reads.load(AtomicOrdering::Relaxed),
        }
    }

    /// Ranked text query.
    ///
    /// An empty or unmatched query yields an empty list; only malformed
    /// options are an error.
    pub fn query(
        &self,
        text: &str,
        options: &IndexQueryOptions,
    ) -> SearchResult<Vec<ScoredDocument>> {
        options.validate()?;
        self.reads.fetch_add(1, AtomicOrdering::Relaxed);

        let terms = query_terms(text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let phrase = tokenize(text);

        let state = self.state.read();

        // (document, term index, field) -> best contribution and its match
        let mut best: HashMap<&DocumentKey, HashMap<(usize, SearchField), (f32, TermMatch)>> =
            HashMap::new();

        for (term_index, term) in terms.iter().enumerate() {
            for (indexed_term, distance) in self.expand_term(&state, term, options) {
                let Some(keys) = state.postings.get(indexed_term) else {
                    continue;
                };
                let factor = self.scoring.match_factor(distance);

                for key in keys {
                    let Some(entry) = state.documents.get(key) else {
                        continue;
                    };
                    for field in SearchField::ALL {
                        let Some(frequency) = entry
                            .field_terms
                            .get(&field)
                            .and_then(|counts| counts.get(indexed_term))
                        else {
                            continue;
                        };
                        let contribution =
                            field.weight(&self.scoring.weights) * *frequency as f32 * factor;
                        let slot = best.entry(key).or_default();
                        let replace = slot
                            .get(&(term_index, field))
                            .map_or(true, |(current, _)| contribution > *current);
                        if replace {
                            slot.insert(
                                (term_index, field),
                                (
                                    contribution,
                                    TermMatch {
                                        query_term: term.clone(),
                                        matched_term: indexed_term.to_string(),
                                        field,
                                        edit_distance: distance,
                                        term_frequency: *frequency,
                                    },
                                ),
                            );
                        }
                    }
                }
            }
        }

        let mut results: Vec<ScoredDocument> = best
            .into_iter()
            .filter_map(|(key, contributions)| {
                let entry = state.documents.get(key)?;
                if !entry.document.is_active {
                    return None;
                }

                let matched_terms: BTreeSet<usize> =
                    contributions.keys().map(|(term_index, _)| *term_index).collect();
                let coverage = matched_terms.len() as f32 / terms.len() as f32;
                let raw: f32 = contributions.values().map(|(score, _)| *score).sum();
                let phrase_match = entry.contains_phrase(&phrase);
                let phrase_factor = if phrase_match {
                    self.scoring.exact_phrase_multiplier
                } else {
                    1.0
                };

                let mut matches: Vec<TermMatch> =
                    contributions.into_values().map(|(_, m)| m).collect();
                matches.sort_by(|a, b| {
                    a.field
                        .cmp(&b.field)
                        .then_with(|| a.query_term.cmp(&b.query_term))
                });

                Some(ScoredDocument {
                    score: raw * coverage * phrase_factor * entry.document.boost,
                    document: entry.document.clone(),
                    matches,
                    phrase_match,
                })
            })
            .filter(|candidate| {
                options
                    .min_score
                    .map_or(true, |min_score| candidate.score >= min_score)
            })
            .collect();

        results.sort_by(ScoredDocument::ranking_cmp);
        if let Some(max_results) = options.max_results {
            results.truncate(max_results);
        }

        Ok(results)
    }

    /// Indexed terms a query term matches, with their edit distance
    fn expand_term<'a>(
        &self,
        state: &'a IndexState,
        term: &str,
        options: &IndexQueryOptions,
    ) -> Vec<(&'a str, usize)> {
        let mut expansions = Vec::new();
        if let Some((indexed_term, _)) = state.postings.get_key_value(term) {
            expansions.push((indexed_term.as_str(), 0));
        }

        if options.fuzzy {
            let max_edits = allowed_edits(term, options.max_edit_distance);
            if max_edits > 0 {
                let mut fuzzy: Vec<(&'a str, usize)> = state
                    .postings
                    .keys()
                    .filter(|indexed_term| indexed_term.as_str() != term)
                    .filter_map(|indexed_term| {
                        bounded_edit_distance(term, indexed_term, max_edits)
                            .map(|distance| (indexed_term.as_str(), distance))
                    })
                    .collect();
                fuzzy.sort();
                expansions.extend(fuzzy);
            }
        }

        expansions
    }
}
