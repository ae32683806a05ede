//! Analytics configuration

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// History entries kept per user or session
    pub history_limit: usize,

    /// Recent/prior half-window ratio at which a query counts as trending
    pub trending_ratio: f64,

    /// Recent count needed to trend when the prior half-window is empty
    pub trending_min_count: usize,

    /// Default number of popular searches returned
    pub popular_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            trending_ratio: 1.5,
            trending_min_count: 2,
            popular_limit: 10,
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.history_limit == 0 {
            return Err(AnalyticsError::InvalidConfiguration(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        if !(self.trending_ratio.is_finite() && self.trending_ratio >= 1.0) {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "trending_ratio must be at least 1.0, got {}",
                self.trending_ratio
            )));
        }
        Ok(())
    }
}
