//! Runtime configuration.
//!
//! Scoring weights and acceptance thresholds are design constants of the
//! matching engine; they are exposed here as named, documented fields so the
//! tunability is explicit, but nothing reconfigures them at request time.
//! Server settings come from the environment (loaded via `dotenv` in `main`).

use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Fixed blend weights for the lexical scorer.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    /// Weight of the distinct-token overlap count. Deliberately applied to an
    /// unnormalized count, which biases toward queries sharing many domain
    /// terms with an entry.
    pub overlap: f32,
    /// Weight of the substring-containment signal (0 or 1).
    pub substring: f32,
    /// Weight of the character-level sequence ratio.
    pub fuzzy: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            overlap: 0.4,
            substring: 0.2,
            fuzzy: 0.6,
        }
    }
}

/// Engine-level constants: weights, thresholds, and the fallback reply.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub weights: ScoreWeights,
    /// Acceptance threshold when the semantic path produced the score.
    pub semantic_threshold: f32,
    /// Acceptance threshold when the lexical path produced the score. Higher
    /// than the semantic bar because the lexical signal is noisier.
    pub lexical_threshold: f32,
    /// A query token must be strictly longer than this to count for the
    /// substring-containment signal.
    pub substring_min_token_len: usize,
    /// Neutral reply served whenever no entry clears the threshold.
    pub fallback_answer: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            semantic_threshold: 0.40,
            lexical_threshold: 0.48,
            substring_min_token_len: 3,
            fallback_answer: "I couldn't find a good answer for that. Please try rephrasing, \
                              or ask about admissions, courses, fees, placements or contact \
                              details. The college website and the admissions office are the \
                              best sources for anything I can't help with."
                .to_string(),
        }
    }
}

/// Semantic capability settings.
#[derive(Debug, Clone)]
pub struct SemanticConfig {
    /// When false the embedding backend is never initialized and every match
    /// uses the lexical path.
    pub enabled: bool,
    /// Cache directory for downloaded embedding model files.
    pub model_cache_dir: PathBuf,
}

/// Process-wide settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite database file path.
    pub database_path: PathBuf,
    pub semantic: SemanticConfig,
    /// Toggle for the in-process reply cache.
    pub cache_enabled: bool,
    /// Output file for harvested page chunks (JSONL).
    pub harvest_out: PathBuf,
    /// When set, the harvester refuses URLs outside this host.
    pub harvest_domain: Option<String>,
}

impl ServerConfig {
    /// Resolve configuration from environment variables, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("ASKCAMPUS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("ASKCAMPUS_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("invalid ASKCAMPUS_PORT: {}", e)))?,
            Err(_) => 8080,
        };
        let database_path = env::var("ASKCAMPUS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/askcampus.sqlite"));
        let model_cache_dir = env::var("ASKCAMPUS_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/models/embeddings"));
        let semantic_enabled = flag_from_env("ASKCAMPUS_SEMANTIC", true);
        let cache_enabled = flag_from_env("ASKCAMPUS_CACHE", true);
        let harvest_out = env::var("ASKCAMPUS_HARVEST_OUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/harvest/chunks.jsonl"));
        let harvest_domain = env::var("ASKCAMPUS_HARVEST_DOMAIN").ok();

        Ok(Self {
            host,
            port,
            database_path,
            semantic: SemanticConfig {
                enabled: semantic_enabled,
                model_cache_dir,
            },
            cache_enabled,
            harvest_out,
            harvest_domain,
        })
    }
}

fn flag_from_env(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => matches!(raw.trim(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
