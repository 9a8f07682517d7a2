//! # Matching Engine
//!
//! Scores free-text student questions against the FAQ knowledge base and
//! picks a winner under a confidence threshold.
//!
//! ## Components
//! - `normalize`: tokenization, lemmatization, stop-words, synonym pass
//! - `lexical`: token-overlap / substring / sequence-ratio blend (always available)
//! - `semantic`: embedding-based cosine ranking (optional capability)
//! - `matcher`: path selection, threshold gate, snapshot lifecycle

pub mod lexical;
pub mod matcher;
pub mod normalize;
pub mod semantic;

pub use matcher::{FaqMatcher, MatchPath, MatchResult};
