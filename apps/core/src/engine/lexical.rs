//! Lexical similarity scoring.
//!
//! Blends three signals over normalized text: distinct-token overlap,
//! substring containment, and a character-level sequence ratio. The blend
//! rewards queries sharing many domain terms with an entry (overlap is an
//! unnormalized count), catches compound terms the lemmatizer may mangle
//! (substring), and stays robust to typos and merged words (ratio).

use std::collections::HashSet;

use crate::config::ScoreWeights;

/// Number of characters covered by matching blocks, Ratcliff/Obershelp style:
/// find the longest common block, then recurse on the pieces before and after
/// it on both sides.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (mut best_a, mut best_b, mut best_len) = (0usize, 0usize, 0usize);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut k = 0;
            while i + k < a.len() && j + k < b.len() && a[i + k] == b[j + k] {
                k += 1;
            }
            if k > best_len {
                best_a = i;
                best_b = j;
                best_len = k;
            }
        }
    }
    if best_len == 0 {
        return 0;
    }
    best_len
        + matching_chars(&a[..best_a], &b[..best_b])
        + matching_chars(&a[best_a + best_len..], &b[best_b + best_len..])
}

/// Character-level similarity ratio in [0, 1]: twice the matched character
/// count divided by the combined length of both strings. Block matching, not
/// edit distance. Two empty strings score 0 (never divide by zero).
pub fn sequence_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    2.0 * matching_chars(&a, &b) as f32 / total as f32
}

/// Combined lexical score between one FAQ entry and the user query, in [0, 1].
///
/// Token sequences and joined texts must come from the same normalization
/// pipeline (`normalize::canonical_tokens`) on both sides.
pub fn combined_score(
    faq_tokens: &[String],
    query_tokens: &[String],
    faq_text: &str,
    query_text: &str,
    weights: &ScoreWeights,
    substring_min_token_len: usize,
) -> f32 {
    let faq_set: HashSet<&str> = faq_tokens.iter().map(String::as_str).collect();
    let query_set: HashSet<&str> = query_tokens.iter().map(String::as_str).collect();
    let overlap = query_set.intersection(&faq_set).count();

    let substr = query_tokens
        .iter()
        .any(|t| t.len() > substring_min_token_len && faq_text.contains(t.as_str()));

    let fuzzy = sequence_ratio(faq_text, query_text);

    let score = overlap as f32 * weights.overlap
        + if substr { weights.substring } else { 0.0 }
        + fuzzy * weights.fuzzy;
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_ratio_identity_and_disjoint() {
        assert!((sequence_ratio("fees structure", "fees structure") - 1.0).abs() < 1e-6);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_ratio_known_value() {
        // Matching block "bcd" of 3 chars over 8 total: 2*3/8.
        assert!((sequence_ratio("abcd", "bcde") - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_ratio_empty_inputs() {
        assert_eq!(sequence_ratio("", ""), 0.0);
        assert_eq!(sequence_ratio("fees", ""), 0.0);
        assert_eq!(sequence_ratio("", "fees"), 0.0);
    }

    #[test]
    fn test_ratio_bounds() {
        for (a, b) in [("fee", "fees fee tuition"), ("hello", "fees"), ("a", "aaaa")] {
            let r = sequence_ratio(a, b);
            assert!((0.0..=1.0).contains(&r), "ratio {} out of range for {:?}", r, (a, b));
        }
    }

    #[test]
    fn test_overlap_counts_distinct_tokens() {
        let faq = toks(&["fees", "fees", "course"]);
        let query = toks(&["fees", "fees"]);
        let w = ScoreWeights { overlap: 1.0, substring: 0.0, fuzzy: 0.0 };
        // Repeated tokens count once.
        let score = combined_score(&faq, &query, "", "", &w, 3);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_substring_requires_long_token() {
        let w = ScoreWeights { overlap: 0.0, substring: 1.0, fuzzy: 0.0 };
        // "fee" has only 3 chars: ignored even though it is contained.
        let score = combined_score(&[], &toks(&["fee"]), "fees fee tuition", "fee", &w, 3);
        assert_eq!(score, 0.0);
        // "fees" has 4 chars: counted.
        let score = combined_score(&[], &toks(&["fees"]), "fees fee tuition", "fees", &w, 3);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_combined_is_clamped() {
        let faq = toks(&["fees", "course", "admissions", "placements"]);
        let query = faq.clone();
        let text = "fees course admissions placements";
        let score = combined_score(&faq, &query, text, text, &ScoreWeights::default(), 3);
        // 4 overlapping tokens alone would exceed 1.0 before clamping.
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let faq = toks(&["fees"]);
        let score =
            combined_score(&faq, &[], "fees", "", &ScoreWeights::default(), 3);
        assert_eq!(score, 0.0);
    }
}
