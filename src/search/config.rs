//! Search configuration

use crate::models::ContentType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-field relevance weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f32,
    pub tags: f32,
    pub keywords: f32,
    pub description: f32,
    pub content: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 10.0,
            tags: 6.0,
            keywords: 5.0,
            description: 3.0,
            content: 1.0,
        }
    }
}

/// Search engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Relevance weight of each indexed field
    pub field_weights: FieldWeights,

    /// Largest edit distance tolerated by fuzzy matching
    pub max_edit_distance: usize,

    /// Score fraction lost per edit on a fuzzy match
    pub fuzzy_penalty_per_edit: f32,

    /// Multiplier applied when the whole query occurs as a contiguous phrase
    pub exact_phrase_multiplier: f32,

    /// Characters of context kept on each side of a highlighted match
    pub highlight_context_chars: usize,

    /// Maximum suggestions returned
    pub suggestion_limit: usize,

    /// Minimum characters before suggestions are computed
    pub min_suggestion_chars: usize,

    /// Maximum results any query may produce
    pub max_results: usize,

    /// Keywords derived per document
    pub keywords_per_document: usize,

    /// Score multiplier applied to every document of a content type
    pub type_boosts: HashMap<ContentType, f32>,

    /// Enable faceted search
    pub enable_facets: bool,

    /// Enable query suggestions
    pub enable_suggestions: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            field_weights: FieldWeights::default(),
            max_edit_distance: 2,
            fuzzy_penalty_per_edit: 0.3,
            exact_phrase_multiplier: 1.5,
            highlight_context_chars: 40,
            suggestion_limit: 5,
            min_suggestion_chars: 2,
            max_results: 1000,
            keywords_per_document: 10,
            type_boosts: HashMap::new(),
            enable_facets: true,
            enable_suggestions: true,
        }
    }
}

impl SearchConfig {
    /// Boost applied to all documents of `content_type`
    pub fn type_boost(&self, content_type: ContentType) -> f32 {
        self.type_boosts.get(&content_type).copied().unwrap_or(1.0)
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn field_weights(mut self, weights: FieldWeights) -> Self {
        self.config.field_weights = weights;
        self
    }

    pub fn max_edit_distance(mut self, distance: usize) -> Self {
        self.config.max_edit_distance = distance;
        self
    }

    pub fn fuzzy_penalty_per_edit(mut self, penalty: f32) -> Self {
        self.config.fuzzy_penalty_per_edit = penalty;
        self
    }

    pub fn exact_phrase_multiplier(mut self, multiplier: f32) -> Self {
        self.config.exact_phrase_multiplier = multiplier;
        self
    }

    pub fn highlight_context_chars(mut self, chars: usize) -> Self {
        self.config.highlight_context_chars = chars;
        self
    }

    pub fn suggestion_limit(mut self, limit: usize) -> Self {
        self.config.suggestion_limit = limit;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn type_boost(mut self, content_type: ContentType, boost: f32) -> Self {
        self.config.type_boosts.insert(content_type, boost);
        self
    }

    pub fn enable_facets(mut self, enabled: bool) -> Self {
        self.config.enable_facets = enabled;
        self
    }

    pub fn enable_suggestions(mut self, enabled: bool) -> Self {
        self.config.enable_suggestions = enabled;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
