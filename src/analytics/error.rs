//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Persistence layer failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid request parameter
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<AppError> for AnalyticsError {
    fn from(err: AppError) -> Self {
        AnalyticsError::Storage(err.to_string())
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            AnalyticsError::InvalidArgument(msg) => AppError::Validation(msg),
            AnalyticsError::Storage(msg) => AppError::Internal(msg),
        }
    }
}
