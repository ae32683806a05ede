//! Search session controller
//!
//! A [`SearchSession`] drives one user's interaction with the search
//! platform:
//!
//! ```text
//! Uninitialized --mount--> Initializing --index ready--> Ready <--> Searching
//! ```
//!
//! Every search records analytics and history, even when a newer search has
//! already superseded it on screen.

mod controller;
mod error;
mod state;

pub use controller::{SearchSession, SEARCH_FAILED_MESSAGE};
pub use error::{SessionError, SessionResult};
pub use state::{SearchOutcome, SessionState, SessionView};
