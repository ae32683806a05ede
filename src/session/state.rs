//! Session state machine

use crate::models::{PopularSearch, SearchHistoryItem, SearchPreferences};
use crate::search::{SearchFilters, SearchResponse};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a search session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, nothing loaded
    #[default]
    Uninitialized,
    /// History, popular searches and preferences loading; index warming up
    Initializing,
    /// Idle, with or without results
    Ready,
    /// At least one search in flight
    Searching,
}

impl SessionState {
    /// Whether searches may be dispatched in this state
    pub fn accepts_searches(&self) -> bool {
        matches!(self, SessionState::Ready | SessionState::Searching)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Searching => write!(f, "searching"),
        }
    }
}

/// Everything a UI needs to render the session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionView {
    pub state: SessionState,
    pub query: String,
    pub filters: SearchFilters,
    /// Results of the most recently started search that completed
    pub response: Option<SearchResponse>,
    /// User-facing message of the last failed search
    pub error: Option<String>,
    pub is_loading: bool,
    /// Whether the index finished its first build
    pub index_ready: bool,
    pub history: Vec<SearchHistoryItem>,
    pub popular: Vec<PopularSearch>,
    pub preferences: SearchPreferences,
    /// Sequence number of the search whose outcome is shown
    pub displayed_seq: u64,
}

/// What happened to a search call
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Blank query; results were cleared without querying
    Cleared,
    /// Results were published to the view
    Displayed(SearchResponse),
    /// A newer search started meanwhile; results were recorded but not shown
    Superseded(SearchResponse),
}

impl SearchOutcome {
    pub fn response(&self) -> Option<&SearchResponse> {
        match self {
            SearchOutcome::Cleared => None,
            SearchOutcome::Displayed(response) | SearchOutcome::Superseded(response) => {
                Some(response)
            }
        }
    }

    pub fn is_displayed(&self) -> bool {
        matches!(self, SearchOutcome::Displayed(_))
    }
}
