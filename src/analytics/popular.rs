//! Popular and trending query aggregation

use crate::models::{PopularSearch, PopularityPeriod, SearchEvent, SearchEventKind};
use crate::search::text::normalize_text;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Event kinds that count as a search for popularity
pub const COUNTED_KINDS: [SearchEventKind; 2] = [SearchEventKind::Search, SearchEventKind::VoiceSearch];

/// Case-insensitive, trimmed, whitespace-collapsed query text
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Trending thresholds
#[derive(Debug, Clone, Copy)]
pub struct TrendRule {
    pub ratio: f64,
    pub min_count: usize,
}

impl TrendRule {
    /// Recent half-window against the prior half-window
    pub fn is_trending(&self, recent: usize, prior: usize) -> bool {
        if prior == 0 {
            recent >= self.min_count
        } else {
            recent as f64 >= prior as f64 * self.ratio
        }
    }
}

#[derive(Default)]
struct QueryCounts {
    in_period: usize,
    recent: usize,
    prior: usize,
}

/// Rank queries by count within `period`, ties alphabetical.
///
/// `events` may extend beyond the period; anything older than the trend
/// window is ignored for trending.
pub fn rank_popular(
    events: &[SearchEvent],
    period: PopularityPeriod,
    now: DateTime<Utc>,
    rule: TrendRule,
    limit: usize,
) -> Vec<PopularSearch> {
    let period_start = period.duration().map(|d| now - d);
    let window = period.trend_window();
    let midpoint = now - window / 2;
    let window_start = now - window;

    let mut counts: HashMap<String, QueryCounts> = HashMap::new();

    for event in events {
        if !COUNTED_KINDS.contains(&event.kind()) || event.timestamp > now {
            continue;
        }
        let query = normalize_query(event.data.query());
        if normalize_text(&query).is_empty() {
            continue;
        }

        let entry = counts.entry(query).or_default();
        if period_start.map_or(true, |start| event.timestamp >= start) {
            entry.in_period += 1;
        }
        if event.timestamp >= midpoint {
            entry.recent += 1;
        } else if event.timestamp >= window_start {
            entry.prior += 1;
        }
    }

    let mut popular: Vec<PopularSearch> = counts
        .into_iter()
        .filter(|(_, c)| c.in_period > 0)
        .map(|(query, c)| PopularSearch {
            query,
            count: c.in_period,
            period,
            trending: rule.is_trending(c.recent, c.prior),
        })
        .collect();

    popular.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
    popular.truncate(limit);
    popular
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SearchEventData, SessionContext};
    use chrono::Duration;

    fn search(query: &str, at: DateTime<Utc>) -> SearchEvent {
        SearchEvent::new(
            SearchEventData::Search {
                query: query.to_string(),
                filters: Default::default(),
                result_count: 1,
                took_ms: 1,
            },
            &SessionContext::new("s"),
        )
        .at(at)
    }

    const RULE: TrendRule = TrendRule {
        ratio: 1.5,
        min_count: 2,
    };

    #[test]
    fn test_counts_group_normalized_queries() {
        let now = Utc::now();
        let events = vec![
            search("Data Science", now - Duration::hours(1)),
            search("  data   science ", now - Duration::hours(2)),
            search("python", now - Duration::hours(3)),
            search("rust", now - Duration::hours(4)),
            search("python", now - Duration::days(3)),
            search("   ", now),
        ];

        let popular = rank_popular(&events, PopularityPeriod::Day, now, RULE, 10);
        let ranked: Vec<(&str, usize)> = popular.iter().map(|p| (p.query.as_str(), p.count)).collect();
        assert_eq!(ranked, vec![("data science", 2), ("python", 1), ("rust", 1)]);
        assert!(popular.iter().all(|p| p.period == PopularityPeriod::Day));
    }

    #[test]
    fn test_trending_requires_acceleration() {
        let now = Utc::now();
        let mut events = Vec::new();
        // week window: recent half = last 3.5 days
        for _ in 0..3 {
            events.push(search("hackathon", now - Duration::days(1)));
        }
        events.push(search("hackathon", now - Duration::days(5)));
        for _ in 0..2 {
            events.push(search("mentoria", now - Duration::days(1)));
            events.push(search("mentoria", now - Duration::days(5)));
        }

        let popular = rank_popular(&events, PopularityPeriod::Week, now, RULE, 10);
        let hackathon = popular.iter().find(|p| p.query == "hackathon").unwrap();
        let mentoria = popular.iter().find(|p| p.query == "mentoria").unwrap();
        assert!(hackathon.trending);
        assert!(!mentoria.trending);
        assert_eq!(popular[0].query, "hackathon");
    }

    #[test]
    fn test_limit_applies_after_sort() {
        let now = Utc::now();
        let events = vec![
            search("b", now - Duration::hours(1)),
            search("a", now - Duration::hours(1)),
            search("c", now - Duration::hours(1)),
            search("c", now - Duration::hours(2)),
        ];
        let popular = rank_popular(&events, PopularityPeriod::All, now, RULE, 2);
        let queries: Vec<&str> = popular.iter().map(|p| p.query.as_str()).collect();
        assert_eq!(queries, vec!["c", "a"]);
    }
}
