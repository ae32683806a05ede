//! Error types for search sessions

use crate::analytics::AnalyticsError;
use crate::error::AppError;
use crate::search::SearchError;

/// Result type for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Operation requires a mounted session
    #[error("Session is not mounted")]
    NotMounted,

    /// The search itself failed; the session stays usable
    #[error("Search failed: {0}")]
    SearchFailed(#[from] SearchError),

    #[error("Preferences error: {0}")]
    Preferences(#[from] AnalyticsError),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotMounted => AppError::Validation(err.to_string()),
            SessionError::SearchFailed(e) => e.into(),
            SessionError::Preferences(e) => e.into(),
        }
    }
}
