//! Match highlighting

use crate::search::index::{ScoredDocument, SearchField};
use crate::search::text::token_spans;
use serde::{Deserialize, Serialize};

/// A matched term inside a snippet. Offsets are in characters, relative to the snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightMatch {
    pub start: usize,
    pub end: usize,
    /// Matched text as it appears in the snippet
    pub text: String,
}

/// One snippet for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub field: SearchField,
    pub snippet: String,
    pub matches: Vec<HighlightMatch>,
}

/// Fields that get snippets, in output order
const HIGHLIGHT_FIELDS: [SearchField; 4] = [
    SearchField::Title,
    SearchField::Tags,
    SearchField::Description,
    SearchField::Content,
];

/// At most one snippet per field that matched the query
pub fn highlight(scored: &ScoredDocument, context_chars: usize) -> Vec<Highlight> {
    let doc = &scored.document;

    HIGHLIGHT_FIELDS
        .iter()
        .filter_map(|field| {
            let terms = scored.matched_terms(*field);
            if terms.is_empty() {
                return None;
            }
            let text = match field {
                SearchField::Title => doc.title.clone(),
                SearchField::Tags => doc.tags.join(", "),
                SearchField::Description => doc.description.clone(),
                SearchField::Content => doc.content.clone(),
                SearchField::Keywords => return None,
            };
            snippet(&text, &terms, context_chars).map(|(snippet, matches)| Highlight {
                field: *field,
                snippet,
                matches,
            })
        })
        .collect()
}

/// Window of `context_chars` around the first match of any term, with every
/// match fully inside the window
fn snippet(text: &str, terms: &[&str], context_chars: usize) -> Option<(String, Vec<HighlightMatch>)> {
    let spans: Vec<_> = token_spans(text)
        .into_iter()
        .filter(|span| terms.contains(&span.text.as_str()))
        .collect();
    let first = spans.first()?;

    let chars: Vec<char> = text.chars().collect();
    let window_start = first.start.saturating_sub(context_chars);
    let window_end = (first.end + context_chars).min(chars.len());

    let matches = spans
        .iter()
        .filter(|span| span.start >= window_start && span.end <= window_end)
        .map(|span| HighlightMatch {
            start: span.start - window_start,
            end: span.end - window_start,
            text: chars[span.start..span.end].iter().collect(),
        })
        .collect();

    Some((chars[window_start..window_end].iter().collect(), matches))
}
