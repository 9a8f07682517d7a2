use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Conversation, FaqEntry, NewFaq, VoteRecord};

pub async fn init_db(path: &Path) -> Result<SqlitePool, AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}", path.display());
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // AUTOINCREMENT keeps deleted FAQ ids from ever being reassigned.
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS faqs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            keywords TEXT NOT NULL DEFAULT ''
        );
        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_message TEXT NOT NULL,
            bot_response TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            faq_id INTEGER NOT NULL,
            helpful INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY(faq_id) REFERENCES faqs(id)
        );
        "#,
    )
    .execute(&pool)
    .await?;

    info!("Database initialized and migrations applied.");

    Ok(pool)
}

// --- FAQ CRUD ---

/// All entries in stable store order (ascending id).
pub async fn list_faqs(pool: &SqlitePool) -> Result<Vec<FaqEntry>, AppError> {
    let faqs = sqlx::query_as::<_, FaqEntry>(
        r#"
        SELECT id, question, answer, category, keywords
        FROM faqs
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(faqs)
}

pub async fn create_faq(pool: &SqlitePool, faq: &NewFaq) -> Result<FaqEntry, AppError> {
    faq.validate()?;

    let created = sqlx::query_as::<_, FaqEntry>(
        r#"
        INSERT INTO faqs (question, answer, category, keywords)
        VALUES (?, ?, ?, ?)
        RETURNING id, question, answer, category, keywords
        "#,
    )
    .bind(&faq.question)
    .bind(&faq.answer)
    .bind(&faq.category)
    .bind(&faq.keywords)
    .fetch_one(pool)
    .await?;
    Ok(created)
}

pub async fn update_faq(pool: &SqlitePool, id: i64, faq: &NewFaq) -> Result<FaqEntry, AppError> {
    faq.validate()?;

    let updated = sqlx::query_as::<_, FaqEntry>(
        r#"
        UPDATE faqs
        SET question = ?, answer = ?, category = ?, keywords = ?
        WHERE id = ?
        RETURNING id, question, answer, category, keywords
        "#,
    )
    .bind(&faq.question)
    .bind(&faq.answer)
    .bind(&faq.category)
    .bind(&faq.keywords)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

pub async fn delete_faq(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM faqs WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::Database(sqlx::Error::RowNotFound));
    }
    Ok(())
}

// --- Conversations & votes ---

pub async fn log_conversation(
    pool: &SqlitePool,
    student_message: &str,
    bot_response: &str,
) -> Result<Conversation, AppError> {
    let created_at = Utc::now().timestamp();

    let logged = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (student_message, bot_response, created_at)
        VALUES (?, ?, ?)
        RETURNING id, student_message, bot_response, created_at
        "#,
    )
    .bind(student_message)
    .bind(bot_response)
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    Ok(logged)
}

/// Conversation history, most recent first.
pub async fn list_conversations(pool: &SqlitePool) -> Result<Vec<Conversation>, AppError> {
    let rows = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, student_message, bot_response, created_at
        FROM conversations
        ORDER BY id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn record_vote(
    pool: &SqlitePool,
    faq_id: i64,
    helpful: bool,
) -> Result<VoteRecord, AppError> {
    let created_at = Utc::now().timestamp();

    let vote = sqlx::query_as::<_, VoteRecord>(
        r#"
        INSERT INTO votes (faq_id, helpful, created_at)
        VALUES (?, ?, ?)
        RETURNING id, faq_id, helpful, created_at
        "#,
    )
    .bind(faq_id)
    .bind(helpful)
    .bind(created_at)
    .fetch_one(pool)
    .await?;
    Ok(vote)
}

// --- Seeding ---

/// Starter knowledge base: question, answer (simple markup), category, keywords.
const DEFAULT_FAQS: &[(&str, &str, &str, &str)] = &[
    (
        "hi",
        "Hi 👋! I'm the AskCampus assistant. Ask me about **admissions**, **courses**, \
         **fees**, **placements** or contact details.",
        "general",
        "hi hello hey greeting",
    ),
    (
        "How do I apply for admission?",
        "Applying is fully online:\n\
         • Register on the admissions portal\n\
         • Fill in the application form and upload your documents\n\
         • Pay the application fee to confirm your submission\n\
         The admissions office can walk you through any step.",
        "admissions",
        "admission apply online application portal registration",
    ),
    (
        "What is the fee structure?",
        "Fees vary by course and shift.\n\
         Undergraduate programs:\n\
         • ₹35,000 – ₹50,000 per year\n\
         Postgraduate programs:\n\
         • ₹50,000 – ₹70,000 per year\n\
         Payment can be made online or at the accounts office (cash, cheque or DD).",
        "fees",
        "fee fees tuition course fee structure payment",
    ),
    (
        "fees",
        "💰 **Fee overview**\n\
         Undergraduate (average): ₹35,000 – ₹50,000 per year\n\
         Postgraduate (average): ₹50,000 – ₹70,000 per year\n\
         Payment: online or offline (cash, cheque, DD).",
        "fees",
        "fees fee tuition",
    ),
    (
        "What courses are offered?",
        "Programs by school:\n\
         • School of Commerce — B.Com, B.Com (CA), M.Com\n\
         • School of Science — B.Sc and M.Sc (Computer Science, Mathematics)\n\
         • School of Arts — B.A (English, Economics)",
        "courses",
        "courses programs commerce science arts departments degree",
    ),
    (
        "What about placements?",
        "Top recruiters visit campus every year:\n\
         • Banking and finance\n\
         • IT services and consulting\n\
         • Retail and logistics\n\
         The placement cell runs training and mock interviews from the second year.",
        "placements",
        "placement placements recruiters jobs career training salary",
    ),
    (
        "How can I contact the college?",
        "Reach us at:\n\
         • Phone: 044-2663 0520 (office hours)\n\
         • Email: admissions@askcampus.example\n\
         • In person: administrative block, Monday to Saturday",
        "contact",
        "contact phone email address office",
    ),
    (
        "What are the college facilities?",
        "Campus facilities:\n\
         • Central library and digital reading room\n\
         • Science and computer laboratories\n\
         • Sports grounds, gym and student clubs",
        "facilities",
        "facilities library labs laboratories sports clubs campus life",
    ),
    (
        "What are the entrance exam requirements?",
        "Entrance requirements depend on the program:\n\
         • Some courses admit on merit\n\
         • Others require an entrance exam\n\
         • Certain programs follow university guidelines\n\
         Check with the admissions office for your chosen course.",
        "admissions",
        "entrance exam requirement merit admission eligibility",
    ),
];

/// Insert the default entries that are not already present. Idempotent:
/// running it twice never duplicates a question.
pub async fn seed_default_faqs(pool: &SqlitePool) -> Result<usize, AppError> {
    let mut inserted = 0usize;
    for (question, answer, category, keywords) in DEFAULT_FAQS {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM faqs WHERE question = ?")
            .bind(question)
            .fetch_one(pool)
            .await?;
        if existing == 0 {
            sqlx::query(
                "INSERT INTO faqs (question, answer, category, keywords) VALUES (?, ?, ?, ?)",
            )
            .bind(question)
            .bind(answer)
            .bind(category)
            .bind(keywords)
            .execute(pool)
            .await?;
            inserted += 1;
        }
    }
    if inserted > 0 {
        info!("Seeded {} default FAQ entries", inserted);
    }
    Ok(inserted)
}
