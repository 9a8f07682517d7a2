//! Database Module Tests
//!
//! CRUD operations for FAQ entries, default seeding, conversation logging
//! and votes.

use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

use crate::database;
use crate::error::AppError;
use crate::models::NewFaq;

/// Create a test database in a temporary directory. The directory guard must
/// stay alive for as long as the pool is used.
async fn create_test_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.sqlite");
    let pool = database::init_db(&db_path)
        .await
        .expect("Failed to init test database");
    (pool, dir)
}

fn faq(question: &str, answer: &str, keywords: &str) -> NewFaq {
    NewFaq {
        question: question.to_string(),
        answer: answer.to_string(),
        category: String::new(),
        keywords: keywords.to_string(),
    }
}

#[tokio::test]
async fn test_create_and_list_faq() {
    let (pool, _dir) = create_test_pool().await;

    let created = database::create_faq(&pool, &faq("fees", "Fee overview", "fees fee tuition"))
        .await
        .expect("Failed to create FAQ");

    assert!(created.id > 0);
    assert_eq!(created.question, "fees");
    assert_eq!(created.category, "");

    let all = database::list_faqs(&pool).await.expect("Failed to list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, created.id);
}

#[tokio::test]
async fn test_create_rejects_empty_question() {
    let (pool, _dir) = create_test_pool().await;

    let err = database::create_faq(&pool, &faq("", "answer", ""))
        .await
        .expect_err("Empty question must be rejected");
    assert!(matches!(err, AppError::Validation(_)));

    let err = database::create_faq(&pool, &faq("question", "", ""))
        .await
        .expect_err("Empty answer must be rejected");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_update_faq() {
    let (pool, _dir) = create_test_pool().await;

    let created = database::create_faq(&pool, &faq("fees", "Old answer", ""))
        .await
        .expect("create");

    let updated = database::update_faq(
        &pool,
        created.id,
        &faq("What are the fees?", "New answer", "fees"),
    )
    .await
    .expect("update");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.question, "What are the fees?");
    assert_eq!(updated.answer, "New answer");
}

#[tokio::test]
async fn test_update_missing_faq_fails() {
    let (pool, _dir) = create_test_pool().await;

    let err = database::update_faq(&pool, 9999, &faq("q", "a", ""))
        .await
        .expect_err("Updating a missing id must fail");
    assert!(matches!(
        err,
        AppError::Database(sqlx::Error::RowNotFound)
    ));
}

#[tokio::test]
async fn test_delete_faq() {
    let (pool, _dir) = create_test_pool().await;

    let created = database::create_faq(&pool, &faq("fees", "A", ""))
        .await
        .expect("create");
    database::delete_faq(&pool, created.id)
        .await
        .expect("delete");

    let all = database::list_faqs(&pool).await.expect("list");
    assert!(all.is_empty());

    let err = database::delete_faq(&pool, created.id)
        .await
        .expect_err("Deleting twice must fail");
    assert!(matches!(
        err,
        AppError::Database(sqlx::Error::RowNotFound)
    ));
}

#[tokio::test]
async fn test_ids_never_reused_after_delete() {
    let (pool, _dir) = create_test_pool().await;

    let first = database::create_faq(&pool, &faq("first", "A", ""))
        .await
        .expect("create first");
    database::delete_faq(&pool, first.id).await.expect("delete");

    let second = database::create_faq(&pool, &faq("second", "B", ""))
        .await
        .expect("create second");
    assert!(second.id > first.id, "deleted id must not be reassigned");
}

#[tokio::test]
async fn test_seeding_is_idempotent() {
    let (pool, _dir) = create_test_pool().await;

    let first = database::seed_default_faqs(&pool).await.expect("seed");
    assert!(first > 0);

    let second = database::seed_default_faqs(&pool).await.expect("reseed");
    assert_eq!(second, 0);

    let all = database::list_faqs(&pool).await.expect("list");
    assert_eq!(all.len(), first);
}

#[tokio::test]
async fn test_conversations_logged_most_recent_first() {
    let (pool, _dir) = create_test_pool().await;

    database::log_conversation(&pool, "first question", "first answer")
        .await
        .expect("log first");
    database::log_conversation(&pool, "second question", "second answer")
        .await
        .expect("log second");

    let rows = database::list_conversations(&pool).await.expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].student_message, "second question");
    assert_eq!(rows[1].student_message, "first question");
}

#[tokio::test]
async fn test_vote_recorded() {
    let (pool, _dir) = create_test_pool().await;

    let entry = database::create_faq(&pool, &faq("fees", "A", ""))
        .await
        .expect("create");

    let vote = database::record_vote(&pool, entry.id, true)
        .await
        .expect("vote");
    assert_eq!(vote.faq_id, entry.id);
    assert!(vote.helpful);

    let vote = database::record_vote(&pool, entry.id, false)
        .await
        .expect("vote");
    assert!(!vote.helpful);
}
