//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A filter value outside its declared domain
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Structurally malformed query or options
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Query attempted before the first successful index build
    #[error("Search index is not ready")]
    IndexNotReady,

    /// Export format declared but not implemented
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Export serialization failed
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl From<validator::ValidationErrors> for SearchError {
    fn from(err: validator::ValidationErrors) -> Self {
        SearchError::InvalidQuery(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidFilter(msg) => AppError::InvalidFilter(msg),
            SearchError::InvalidQuery(msg) => AppError::Validation(msg),
            SearchError::IndexNotReady => AppError::IndexNotReady,
            SearchError::UnsupportedFormat(msg) => AppError::UnsupportedFormat(msg),
            SearchError::ExportFailed(msg) => AppError::Serialization(msg),
        }
    }
}
