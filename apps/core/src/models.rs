use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A single question/answer record in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FaqEntry {
    /// Store-assigned identifier. Never reused after a delete.
    pub id: i64,
    /// Canonical question text.
    pub question: String,
    /// Response payload; may contain simple markup (see `render`).
    pub answer: String,
    /// Free-text grouping label ("admissions", "fees", ...).
    #[serde(default)]
    pub category: String,
    /// Auxiliary terms that strengthen matching but are never displayed.
    #[serde(default)]
    pub keywords: String,
}

impl FaqEntry {
    /// The text the matching engine scores against: question plus keywords.
    pub fn match_text(&self) -> String {
        if self.keywords.is_empty() {
            self.question.clone()
        } else {
            format!("{} {}", self.question, self.keywords)
        }
    }
}

/// Ingestion payload for creating or updating an FAQ entry.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewFaq {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: String,
    #[validate(length(min = 1, message = "answer must not be empty"))]
    pub answer: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: String,
}

/// The engine's reply to one user query.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    /// Answer text, or the neutral fallback when no entry was confident enough.
    pub answer_text: String,
    /// Present iff the threshold gate accepted a match.
    pub matched_faq_id: Option<i64>,
}

/// A logged question/answer exchange.
#[derive(Debug, Serialize, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub student_message: String,
    pub bot_response: String,
    /// Unix timestamp of when the exchange happened.
    pub created_at: i64,
}

/// A helpful / not-helpful vote on an answer.
#[derive(Debug, Serialize, FromRow)]
pub struct VoteRecord {
    pub id: i64,
    pub faq_id: i64,
    pub helpful: bool,
    pub created_at: i64,
}
