//! Translation capability seam.

use async_trait::async_trait;

use crate::error::AppError;

/// Best-effort translation of outgoing answers.
///
/// Modeled as an explicit capability: the server carries an optional
/// `Arc<dyn Translator>` and checks for its presence before every use, so
/// absence is a normal, testable state rather than an error. No
/// implementation ships by default; deployments can plug one in.
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Translate `text` into the target language code (e.g. "fr", "ta").
    async fn translate(&self, text: &str, lang: &str) -> Result<String, AppError>;
}
