use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A filter value outside its declared domain
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Query attempted before the first index build completed
    #[error("Search index is not ready")]
    IndexNotReady,

    /// Export format declared but not implemented
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Content source errors
    #[error("Content source error ({content_source}): {message}")]
    ContentSource {
        content_source: String,
        message: String,
    },

    /// Malformed content record
    #[error("Malformed content: {0}")]
    MalformedContent(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidFilter(_) => "INVALID_FILTER",
            AppError::IndexNotReady => "INDEX_NOT_READY",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::ContentSource { .. } => "CONTENT_SOURCE_ERROR",
            AppError::MalformedContent(_) => "MALFORMED_CONTENT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same operation could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Timeout(_) | AppError::ContentSource { .. } | AppError::Io(_)
        )
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::NotFound("test".to_string()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            AppError::InvalidFilter("test".to_string()).error_code(),
            "INVALID_FILTER"
        );
        assert_eq!(AppError::IndexNotReady.error_code(), "INDEX_NOT_READY");
    }

    #[test]
    fn test_transient_errors() {
        assert!(AppError::Timeout("jobs".to_string()).is_transient());
        assert!(AppError::ContentSource {
            content_source: "events".to_string(),
            message: "unavailable".to_string(),
        }
        .is_transient());
        assert!(!AppError::Validation("bad".to_string()).is_transient());
    }
}
