//! Matcher and threshold gate.
//!
//! Selects a scorer per call (semantic first, lexical fallback), finds the
//! best-scoring entry and accepts or rejects it against a path-specific
//! confidence threshold. Owns the knowledge-base snapshot: reloads rebuild a
//! fresh snapshot and swap it in atomically, so concurrent reads see the old
//! or the new state but never a partially-built index.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use fastembed::TextEmbedding;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::MatcherConfig;
use crate::database;
use crate::error::AppError;
use crate::models::{ChatReply, FaqEntry};

use super::{lexical, normalize, semantic};

/// Which scorer produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPath {
    Semantic,
    Lexical,
}

/// Outcome of matching one query. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Best-scoring entry, or none when the knowledge base is empty.
    pub entry: Option<FaqEntry>,
    /// Score in [0, 1] from whichever path ran.
    pub score: f32,
    /// True iff `score` clears the threshold for `path`.
    pub accepted: bool,
    pub path: MatchPath,
}

/// One entry plus its precomputed lexical view. Built once per snapshot, so
/// an updated question is always re-normalized before it can match again.
struct IndexedFaq {
    entry: FaqEntry,
    tokens: Vec<String>,
    text: String,
}

/// Immutable knowledge-base snapshot. Embeddings are keyed by entry id;
/// there is no positional coupling between the list and the vector map.
struct Snapshot {
    entries: Vec<IndexedFaq>,
    vectors: HashMap<i64, Vec<f32>>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            vectors: HashMap::new(),
        }
    }
}

/// The FAQ matching engine.
pub struct FaqMatcher {
    config: MatcherConfig,
    embedder: Option<TextEmbedding>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl FaqMatcher {
    pub fn new(config: MatcherConfig, embedder: Option<TextEmbedding>) -> Self {
        Self {
            config,
            embedder,
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
        }
    }

    /// Whether the semantic path can be used at all. Callers may use this to
    /// adjust display behavior, but path selection stays inside the matcher.
    pub fn semantic_available(&self) -> bool {
        self.embedder.is_some()
    }

    /// Number of entries in the current snapshot.
    pub fn entry_count(&self) -> usize {
        self.current().entries.len()
    }

    pub fn fallback_answer(&self) -> &str {
        &self.config.fallback_answer
    }

    /// Replace the snapshot from the backing store. Called at startup and
    /// after every mutation; a failure here must propagate to the mutation
    /// caller rather than leave a stale index serving quietly.
    pub async fn reload(&self, pool: &SqlitePool) -> Result<(), AppError> {
        let faqs = database::list_faqs(pool).await?;
        self.install(faqs)
    }

    /// Build a fresh snapshot from the given entries and swap it in.
    pub fn install(&self, faqs: Vec<FaqEntry>) -> Result<(), AppError> {
        let vectors = match &self.embedder {
            Some(model) => match semantic::build_vectors(model, &faqs) {
                Ok(vectors) => vectors,
                Err(e) => {
                    // Lexical matching still works; the semantic path just
                    // sees an empty index until the next successful rebuild.
                    warn!("Embedding rebuild failed, semantic path disabled: {}", e);
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };

        let entries: Vec<IndexedFaq> = faqs
            .into_iter()
            .map(|entry| {
                let tokens = normalize::canonical_tokens(&entry.match_text());
                let text = tokens.join(" ");
                IndexedFaq {
                    entry,
                    tokens,
                    text,
                }
            })
            .collect();

        let built = Arc::new(Snapshot { entries, vectors });
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| AppError::Internal("knowledge snapshot lock poisoned".to_string()))?;
        *guard = built;
        info!("Knowledge base reloaded: {} entries", guard.entries.len());
        Ok(())
    }

    fn current(&self) -> Arc<Snapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still holds a fully-built snapshot.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Threshold gate. Boundaries are inclusive: a lexical score of exactly
    /// 0.48 (or a semantic score of exactly 0.40) is accepted.
    pub fn accepts(&self, path: MatchPath, score: f32) -> bool {
        let threshold = match path {
            MatchPath::Semantic => self.config.semantic_threshold,
            MatchPath::Lexical => self.config.lexical_threshold,
        };
        score >= threshold
    }

    /// Match one query against the current snapshot.
    pub fn match_query(&self, raw: &str) -> MatchResult {
        let query = raw.trim();
        if query.is_empty() {
            return MatchResult {
                entry: None,
                score: 0.0,
                accepted: false,
                path: MatchPath::Lexical,
            };
        }

        let snapshot = self.current();

        if let Some(model) = &self.embedder {
            if !snapshot.vectors.is_empty() {
                let order: Vec<i64> = snapshot.entries.iter().map(|f| f.entry.id).collect();
                match semantic::rank(model, &order, &snapshot.vectors, query) {
                    Ok(Some((id, score))) => {
                        let entry = snapshot
                            .entries
                            .iter()
                            .find(|f| f.entry.id == id)
                            .map(|f| f.entry.clone());
                        return MatchResult {
                            entry,
                            score,
                            accepted: self.accepts(MatchPath::Semantic, score),
                            path: MatchPath::Semantic,
                        };
                    }
                    Ok(None) => {}
                    Err(e) => {
                        // Degrade for this call only; the capability itself
                        // stays active for the next request.
                        warn!("Semantic ranking failed, using lexical path: {}", e);
                    }
                }
            }
        }

        let query_tokens = normalize::canonical_tokens(query);
        let query_text = query_tokens.join(" ");

        let mut best: Option<(&IndexedFaq, f32)> = None;
        for faq in &snapshot.entries {
            let score = lexical::combined_score(
                &faq.tokens,
                &query_tokens,
                &faq.text,
                &query_text,
                &self.config.weights,
                self.config.substring_min_token_len,
            );
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((faq, score));
            }
        }

        match best {
            Some((faq, score)) => MatchResult {
                entry: Some(faq.entry.clone()),
                score,
                accepted: self.accepts(MatchPath::Lexical, score),
                path: MatchPath::Lexical,
            },
            None => MatchResult {
                entry: None,
                score: 0.0,
                accepted: false,
                path: MatchPath::Lexical,
            },
        }
    }

    /// Caller-facing contract: the accepted entry's answer with its id, or
    /// the neutral fallback with no id. A weak match and an empty query are
    /// indistinguishable here except that no FAQ id is attached to either.
    pub fn respond(&self, raw: &str) -> ChatReply {
        let result = self.match_query(raw);
        match result {
            MatchResult {
                entry: Some(entry),
                accepted: true,
                ..
            } => ChatReply {
                answer_text: entry.answer,
                matched_faq_id: Some(entry.id),
            },
            _ => ChatReply {
                answer_text: self.config.fallback_answer.clone(),
                matched_faq_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;

    fn lexical_matcher() -> FaqMatcher {
        FaqMatcher::new(MatcherConfig::default(), None)
    }

    #[test]
    fn test_gate_boundaries_are_inclusive() {
        let matcher = lexical_matcher();
        assert!(matcher.accepts(MatchPath::Lexical, 0.48));
        assert!(!matcher.accepts(MatchPath::Lexical, 0.4799));
        assert!(matcher.accepts(MatchPath::Semantic, 0.40));
        assert!(!matcher.accepts(MatchPath::Semantic, 0.3999));
    }

    #[test]
    fn test_empty_query_is_rejected_without_scoring() {
        let matcher = lexical_matcher();
        for query in ["", "   ", "\t\n"] {
            let result = matcher.match_query(query);
            assert!(result.entry.is_none());
            assert!(!result.accepted);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn test_empty_knowledge_base_falls_back() {
        let matcher = lexical_matcher();
        let reply = matcher.respond("what are the fees?");
        assert!(reply.matched_faq_id.is_none());
        assert_eq!(reply.answer_text, matcher.fallback_answer());
    }
}
