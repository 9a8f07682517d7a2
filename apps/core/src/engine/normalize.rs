//! Query and FAQ text normalization.
//!
//! Both sides of every lexical comparison go through the same pipeline:
//! lowercase, strip punctuation, tokenize, lemmatize, drop stop-words, then
//! rewrite domain vocabulary to canonical forms via a fixed synonym table.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Common English function words carrying no matching signal.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "of", "i", "you", "he",
    "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its",
    "our", "their", "this", "that", "these", "those", "who", "whom", "which", "what", "whose",
    "is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "will", "would", "shall", "should", "can", "could", "may",
    "might", "must", "in", "on", "at", "to", "from", "by", "with", "about", "into", "through",
    "during", "before", "after", "above", "below", "up", "down", "out", "off", "over", "under",
    "again", "further", "here", "there", "where", "when", "why", "how", "all", "each", "every",
    "both", "few", "more", "most", "other", "some", "any", "no", "not", "only", "own", "same",
    "than", "too", "very", "just", "also", "now", "then", "once", "if", "because", "as",
    "until", "while", "s", "t", "d", "m", "ll", "ve", "re",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Domain vocabulary rewritten to one canonical token per concept, so
/// "tuition" and "fees" (or "apply" and "admission") converge before scoring.
/// Keys are lemmatized forms; the pass runs after lemmatization.
const SYNONYMS: &[(&str, &str)] = &[
    ("fee", "fees"),
    ("tuition", "fees"),
    ("placement", "placements"),
    ("salary", "placements"),
    ("admission", "admissions"),
    ("apply", "admissions"),
];

/// Reduce a token to its dictionary base form.
///
/// A small rule-based English noun lemmatizer: enough to fold plural surface
/// variation ("courses" -> "course", "facilities" -> "facility") without a
/// dictionary. Words the rules don't cover pass through unchanged.
fn lemmatize(word: &str) -> String {
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{}y", stem);
        }
        if word.ends_with("sses")
            || word.ends_with("xes")
            || word.ends_with("ches")
            || word.ends_with("shes")
            || word.ends_with("zes")
        {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Normalize raw text into an ordered token sequence.
///
/// Steps, in order: lowercase; replace every character that is not an ASCII
/// lowercase letter, digit or whitespace with a space (so "B.Com" and
/// "B Com" normalize identically); split on whitespace; lemmatize; drop
/// stop-words. Empty input yields an empty sequence.
pub fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| !STOPWORD_SET.contains(*t))
        .map(lemmatize)
        .filter(|t| !STOPWORD_SET.contains(t.as_str()))
        .collect()
}

/// Rewrite tokens through the fixed synonym table.
pub fn apply_synonyms(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| {
            SYNONYMS
                .iter()
                .find(|(from, _)| *from == t.as_str())
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| t.clone())
        })
        .collect()
}

/// Full pipeline: normalize then apply the synonym pass.
pub fn canonical_tokens(text: &str) -> Vec<String> {
    apply_synonyms(&normalize(text))
}
