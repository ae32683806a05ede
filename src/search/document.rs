//! Search document structures

use crate::models::{ContentType, Language};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a document in the index: `(type, id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub content_type: ContentType,
    pub id: String,
}

impl DocumentKey {
    pub fn new(content_type: ContentType, id: impl Into<String>) -> Self {
        Self {
            content_type,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.content_type, self.id)
    }
}

/// Author attached to a piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Type-specific attributes used for filtering, faceting and sorting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub category: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,

    /// Engagement count (views, attendees, applicants, replies...)
    #[serde(default)]
    pub popularity: u64,
}

/// The uniform representation of any content item stored in the index.
///
/// Documents are immutable once built; an update replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Identifier, unique within the content type
    pub id: String,

    /// Content type
    #[serde(rename = "type")]
    pub content_type: ContentType,

    /// Display title
    pub title: String,

    /// Full body text
    pub content: String,

    /// Short summary
    pub description: String,

    /// Canonical link
    pub url: String,

    /// Tags, deduplicated in original order
    pub tags: Vec<String>,

    /// Derived lowercase keywords
    pub keywords: Vec<String>,

    /// Normalized concatenation of title, description, content and tags
    pub searchable_text: String,

    pub language: Language,

    /// Relevance multiplier
    pub boost: f32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Inactive documents never appear in query results
    pub is_active: bool,

    pub author: Option<Author>,

    pub metadata: DocumentMetadata,
}

impl IndexedDocument {
    pub fn key(&self) -> DocumentKey {
        DocumentKey::new(self.content_type, self.id.clone())
    }
}
