//! Full-text search for the alumni platform
//!
//! Jobs, events, forum posts, member profiles, resources, mentors and news are
//! pulled from a content store, normalized into one document shape and served
//! from an in-memory inverted index with weighted, typo-tolerant ranking,
//! filters, facets, highlights and suggestions. Search analytics, per-session
//! history and user preferences sit alongside.
//!
//! [`platform::SearchPlatform`] wires the services together;
//! [`session::SearchSession`] drives one user's session on top of it.

pub mod analytics;
pub mod config;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod models;
pub mod platform;
pub mod search;
pub mod session;
pub mod state;

pub use error::{AppError, Result};
pub use platform::SearchPlatform;
