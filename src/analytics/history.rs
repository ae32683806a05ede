//! Bounded per-session search history

use crate::models::SearchHistoryItem;
use dashmap::DashMap;
use std::collections::VecDeque;

/// Most-recent-first search history, bounded per key.
///
/// Each key's list is mutated under its map shard lock, so concurrent adds
/// never lose entries.
pub struct SearchHistory {
    entries: DashMap<String, VecDeque<SearchHistoryItem>>,
    limit: usize,
}

impl SearchHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: DashMap::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Insert at the front, evicting the oldest entries beyond the bound
    pub fn add(&self, key: &str, item: SearchHistoryItem) {
        let mut list = self.entries.entry(key.to_string()).or_default();
        list.push_front(item);
        list.truncate(self.limit);
    }

    /// Up to `limit` entries, most recent first
    pub fn get(&self, key: &str, limit: Option<usize>) -> Vec<SearchHistoryItem> {
        self.entries
            .get(key)
            .map(|list| {
                list.iter()
                    .take(limit.unwrap_or(self.limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn clear(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Append a clicked result to the most recent entry; false when there is none
    pub fn record_click(&self, key: &str, result_id: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(mut list) => match list.front_mut() {
                Some(latest) => {
                    latest.clicked_results.push(result_id.to_string());
                    true
                }
                None => false,
            },
            None => false,
        }
    }
}
