//! Text analysis shared by the normalizer, the index and the highlighter

use std::collections::HashMap;

/// Words that carry no search value in either platform language
const STOPWORDS: &[&str] = &[
    // English
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "has",
    "have", "in", "into", "is", "it", "its", "of", "on", "or", "our", "that", "the", "their",
    "them", "there", "these", "they", "this", "those", "to", "was", "were", "what", "when",
    "which", "will", "with", "within", "would", "your", "about", "also", "more", "than",
    // Spanish
    "al", "como", "con", "de", "del", "el", "en", "entre", "es", "esta", "este", "esto",
    "la", "las", "lo", "los", "mas", "más", "para", "pero", "por", "que", "se", "sin", "sobre",
    "su", "sus", "un", "una", "unas", "unos", "y", "o", "nuestro", "nuestra", "desde", "hasta",
    "donde", "cuando", "muy", "también", "tiene", "todos", "todas",
];

/// A token with its character offsets in the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    /// Lowercased token text
    pub text: String,
    /// Start offset in characters (inclusive)
    pub start: usize,
    /// End offset in characters (exclusive)
    pub end: usize,
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercase, replace punctuation with spaces and collapse whitespace
pub fn normalize_text(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    token_spans(text).into_iter().map(|span| span.text).collect()
}

/// Tokenize while recording character offsets into the original text
pub fn token_spans(text: &str) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (position, ch) in text.chars().enumerate() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                start = position;
            }
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            spans.push(TokenSpan {
                text: std::mem::take(&mut current),
                start,
                end: position,
            });
        }
    }

    if !current.is_empty() {
        spans.push(TokenSpan {
            text: current,
            start,
            end: text.chars().count(),
        });
    }

    spans
}

/// Query terms: tokens minus stopwords, unless the query is nothing but stopwords
pub fn query_terms(query: &str) -> Vec<String> {
    let tokens = tokenize(query);
    let meaningful: Vec<String> = tokens
        .iter()
        .filter(|token| !is_stopword(token))
        .cloned()
        .collect();

    let mut terms = if meaningful.is_empty() { tokens } else { meaningful };
    let mut seen = std::collections::HashSet::new();
    terms.retain(|term| seen.insert(term.clone()));
    terms
}

/// Frequency based keyword extraction.
///
/// Keeps words longer than three characters that are not stopwords, ordered by
/// descending frequency; ties keep first-occurrence order.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, token) in tokenize(text).into_iter().enumerate() {
        if token.chars().count() <= 3 || is_stopword(&token) {
            continue;
        }
        counts
            .entry(token)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, position));
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(max_keywords);
    ranked.into_iter().map(|(word, _, _)| word).collect()
}

/// Number of edits tolerated for a query term of the given length
pub fn allowed_edits(term: &str, max_edit_distance: usize) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => max_edit_distance.min(1),
        _ => max_edit_distance,
    }
}

/// Levenshtein distance, or `None` once it is known to exceed `max`
pub fn bounded_edit_distance(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let distance = a.len().max(b.len());
        return (distance <= max).then_some(distance);
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        let mut row_min = current[0];
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
            row_min = row_min.min(current[j]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[b.len()];
    (distance <= max).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("Senior Data-Scientist (Remote), TechCorp!"),
            vec!["senior", "data", "scientist", "remote", "techcorp"]
        );
        assert_eq!(normalize_text("  Diseño   UX/UI  "), "diseño ux ui");
    }

    #[test]
    fn test_token_spans_offsets() {
        let spans = token_spans("Hola, Mundo");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].text, "mundo");
        assert_eq!(spans[1].start, 6);
        assert_eq!(spans[1].end, 11);
    }

    #[test]
    fn test_token_spans_count_chars_not_bytes() {
        let spans = token_spans("año nuevo");
        assert_eq!(spans[0].end, 3);
        assert_eq!(spans[1].start, 4);
    }

    #[test]
    fn test_query_terms_drop_stopwords() {
        assert_eq!(query_terms("jobs in the data team"), vec!["jobs", "data", "team"]);
        assert_eq!(query_terms("the"), vec!["the"]);
        assert_eq!(query_terms("data DATA"), vec!["data"]);
    }

    #[test]
    fn test_extract_keywords_order() {
        let keywords = extract_keywords(
            "python data python engineer data python team with data",
            3,
        );
        assert_eq!(keywords, vec!["python", "data", "engineer"]);
    }

    #[test]
    fn test_extract_keywords_ties_keep_first_occurrence() {
        let keywords = extract_keywords("zeta alpha zeta alpha gamma", 5);
        assert_eq!(keywords, vec!["zeta", "alpha", "gamma"]);
    }

    #[test]
    fn test_bounded_edit_distance() {
        assert_eq!(bounded_edit_distance("python", "python", 2), Some(0));
        assert_eq!(bounded_edit_distance("python", "pythom", 2), Some(1));
        assert_eq!(bounded_edit_distance("data", "date", 1), Some(1));
        assert_eq!(bounded_edit_distance("data", "engineer", 2), None);
        assert_eq!(bounded_edit_distance("kitten", "sitting", 2), None);
        assert_eq!(bounded_edit_distance("kitten", "sitting", 3), Some(3));
    }

    #[test]
    fn test_allowed_edits() {
        assert_eq!(allowed_edits("ml", 2), 0);
        assert_eq!(allowed_edits("data", 2), 1);
        assert_eq!(allowed_edits("python", 2), 2);
        assert_eq!(allowed_edits("python", 1), 1);
    }
}
