//! Search analytics, history and preferences
//!
//! # Features
//!
//! - **Event Tracking**: append-only `search`, `result_click`, `filter_apply`,
//!   `suggestion_click` and `voice_search` events; best-effort, never fails a search
//! - **History**: the last 20 searches per user or session, most recent first
//! - **Popular Searches**: counts by normalized query over a day, week, month
//!   or all time, with a trending flag
//! - **Preferences**: per-user default filters with documented defaults
//!
//! # Example
//!
//! ```no_run
//! use alumni_search::analytics::{AnalyticsConfig, SearchAnalytics};
//! use alumni_search::models::{PopularityPeriod, SessionContext};
//! use alumni_search::search::SearchFilters;
//! use alumni_search::state::InMemoryAnalyticsStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analytics = SearchAnalytics::new(
//!         Arc::new(InMemoryAnalyticsStore::new()),
//!         AnalyticsConfig::default(),
//!     );
//!     let context = SessionContext::new("session-1");
//!
//!     analytics
//!         .track_search("data science", &SearchFilters::default(), 12, 3, &context)
//!         .await;
//!
//!     let popular = analytics
//!         .get_popular_searches(PopularityPeriod::Week, Some(5))
//!         .await?;
//!     println!("Top query: {:?}", popular.first());
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod history;
mod popular;
mod preferences;
mod tracker;

pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, AnalyticsResult};
pub use history::SearchHistory;
pub use popular::{normalize_query, rank_popular, TrendRule};
pub use preferences::PreferencesService;
pub use tracker::SearchAnalytics;
