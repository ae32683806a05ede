//! Error types for indexing operations

use crate::error::AppError;
use crate::models::ContentType;

/// Result type for indexing operations
pub type IndexerResult<T> = std::result::Result<T, IndexerError>;

/// Errors that can occur while building or refreshing the index
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexerError {
    /// A record lacks a field every document needs
    #[error("Malformed {content_type} record: missing required field '{field}'")]
    MalformedContent {
        content_type: ContentType,
        field: String,
    },

    /// The content store returned an error for a source
    #[error("Content source {content_type} failed: {message}")]
    SourceFailed {
        content_type: ContentType,
        message: String,
    },

    /// The content store did not answer in time
    #[error("Content source {content_type} timed out after {timeout_ms}ms")]
    SourceTimeout {
        content_type: ContentType,
        timeout_ms: u64,
    },
}

impl IndexerError {
    pub fn malformed(content_type: ContentType, field: impl Into<String>) -> Self {
        IndexerError::MalformedContent {
            content_type,
            field: field.into(),
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            IndexerError::MalformedContent { content_type, .. }
            | IndexerError::SourceFailed { content_type, .. }
            | IndexerError::SourceTimeout { content_type, .. } => *content_type,
        }
    }
}

impl From<IndexerError> for AppError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::MalformedContent { .. } => AppError::MalformedContent(err.to_string()),
            IndexerError::SourceFailed {
                content_type,
                message,
            } => AppError::ContentSource {
                content_source: content_type.to_string(),
                message,
            },
            IndexerError::SourceTimeout { .. } => AppError::Timeout(err.to_string()),
        }
    }
}
