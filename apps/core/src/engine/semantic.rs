//! Semantic similarity via sentence embeddings.
//!
//! Optional capability: active only when the FastEmbed backend initialized
//! successfully at startup. Entry vectors are keyed by entry id, so there is
//! no positional alignment to keep in sync with the entry list.

use std::collections::HashMap;
use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::FaqEntry;

/// Try to load the embedding model.
///
/// Absence is a first-class capability state, never an error: on failure this
/// logs a warning and the engine runs lexical-only.
pub fn init_embedder(cache_dir: PathBuf) -> Option<TextEmbedding> {
    let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2);
    options.show_download_progress = false;
    options.cache_dir = cache_dir;

    match TextEmbedding::try_new(options) {
        Ok(model) => {
            info!("Embedding model loaded");
            Some(model)
        }
        Err(e) => {
            warn!("Embedding backend unavailable, matching lexically only: {}", e);
            None
        }
    }
}

/// Embed every entry's question + keywords in one batch, keyed by entry id.
pub fn build_vectors(
    model: &TextEmbedding,
    entries: &[FaqEntry],
) -> Result<HashMap<i64, Vec<f32>>, AppError> {
    if entries.is_empty() {
        return Ok(HashMap::new());
    }
    let texts: Vec<String> = entries.iter().map(|e| e.match_text()).collect();
    let embeddings = model.embed(texts, None)?;
    info!("Embedded {} knowledge-base entries", embeddings.len());
    Ok(entries
        .iter()
        .zip(embeddings)
        .map(|(entry, vector)| (entry.id, vector))
        .collect())
}

/// Embed the query and return the best entry id with its similarity.
///
/// `order` lists entry ids in knowledge-base order; only a strictly better
/// similarity replaces the current best, so the first entry wins ties.
/// Cosine similarity is clamped to [0, 1].
pub fn rank(
    model: &TextEmbedding,
    order: &[i64],
    vectors: &HashMap<i64, Vec<f32>>,
    query: &str,
) -> Result<Option<(i64, f32)>, AppError> {
    let query_embeddings = model.embed(vec![query.to_string()], None)?;
    let query_vector = query_embeddings
        .first()
        .ok_or_else(|| AppError::Internal("embedding backend returned no vector".to_string()))?;

    let mut best: Option<(i64, f32)> = None;
    for id in order {
        let Some(vector) = vectors.get(id) else {
            continue;
        };
        let similarity = cosine_similarity(query_vector, vector).clamp(0.0, 1.0);
        if best.map_or(true, |(_, s)| similarity > s) {
            best = Some((*id, similarity));
        }
    }
    Ok(best)
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_opposite_vectors_clamp_to_zero_when_ranked() {
        // rank() clamps; the raw similarity of opposite vectors is -1.
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &b).clamp(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_embedder_init_does_not_panic_when_unavailable() {
        // Points the cache at an unwritable location in most sandboxes; either
        // outcome is a valid capability state.
        let _ = init_embedder(std::path::PathBuf::from("/nonexistent/askcampus-models"));
    }
}
