//! Search preferences persistence

use crate::analytics::error::AnalyticsResult;
use crate::models::SearchPreferences;
use crate::state::PreferencesStore;
use std::sync::Arc;
use tracing::warn;

pub struct PreferencesService {
    store: Arc<dyn PreferencesStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self { store }
    }

    /// Stored preferences, or the defaults when absent or unreadable
    pub async fn get_preferences(&self, key: &str) -> SearchPreferences {
        match self.store.get(key).await {
            Ok(Some(preferences)) => preferences,
            Ok(None) => SearchPreferences::default(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to load preferences, using defaults");
                SearchPreferences::default()
            }
        }
    }

    pub async fn save_preferences(
        &self,
        key: &str,
        preferences: &SearchPreferences,
    ) -> AnalyticsResult<()> {
        self.store.set(key, preferences).await?;
        Ok(())
    }
}
