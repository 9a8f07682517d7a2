//! Site harvester.
//!
//! Fetches pages from the college website, extracts their readable text and
//! splits it into fixed-size overlapping windows appended to a JSONL file.
//! The chunks are a future source of FAQ-like entries; the matching engine
//! never consumes them directly.

use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use crate::error::AppError;

/// Window size and overlap, in characters.
pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 150;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// One fetched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// One fixed-size window over a page's content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content: String,
}

// URL areas with no knowledge value (admin, feeds, session pages).
static SKIP_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\?(replytocom|s|share)=|/wp-admin/|/wp-json/|/tag/|/author/|/cart/|/my-account/|/login/|/feed/)",
    )
    .expect("Invalid regex: skip patterns")
});

pub fn should_skip(url: &str) -> bool {
    SKIP_PATTERNS.is_match(url)
}

/// True when `raw` is an http(s) URL whose host is exactly `domain`.
pub fn same_domain(raw: &str, domain: &str) -> bool {
    match Url::parse(raw) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed
                    .host_str()
                    .is_some_and(|host| host.eq_ignore_ascii_case(domain))
        }
        Err(_) => false,
    }
}

/// Extract the title and readable text from an HTML document.
///
/// Only content-bearing elements are read, so script and style text never
/// leaks into the harvested output.
pub fn extract_text(html: &str) -> (String, String) {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            doc.select(&sel)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let content_sel =
        Selector::parse("h1, h2, h3, h4, p, li, td").expect("Invalid selector: content elements");
    let mut parts: Vec<String> = Vec::new();
    for element in doc.select(&content_sel) {
        let text = element.text().collect::<String>();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            parts.push(text);
        }
    }

    (title, parts.join("\n"))
}

/// Split content into overlapping fixed-size windows.
pub fn chunk_page(content: &str, url: &str, title: &str) -> Vec<ChunkRecord> {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();

    let step = CHUNK_SIZE.saturating_sub(CHUNK_OVERLAP).max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + CHUNK_SIZE).min(chars.len());
        let part: String = chars[start..end].iter().collect();
        chunks.push(ChunkRecord {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            title: title.to_string(),
            content: part,
        });
        start += step;
    }
    chunks
}

/// Fetch one page and extract its text.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<PageRecord, AppError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send()).await??;
    if !response.status().is_success() {
        return Err(AppError::Io(std::io::Error::other(format!(
            "fetch failed with status {} for {}",
            response.status(),
            url
        ))));
    }
    let body = tokio::time::timeout(FETCH_TIMEOUT, response.text()).await??;
    let (title, content) = extract_text(&body);
    Ok(PageRecord {
        url: url.to_string(),
        title,
        content,
    })
}

/// Append chunk records to a JSONL file, one JSON object per line.
pub fn append_chunks_jsonl(path: &Path, chunks: &[ChunkRecord]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for chunk in chunks {
        let line = serde_json::to_string(chunk)?;
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// Fetch each URL, chunk its content and append the chunks to `out`.
///
/// Off-domain and skip-listed URLs are refused; individual fetch failures are
/// logged and the rest of the batch continues. Returns the number of chunks
/// written.
pub async fn harvest_urls(
    urls: &[String],
    domain: Option<&str>,
    out: &Path,
) -> Result<usize, AppError> {
    let client = reqwest::Client::builder()
        .user_agent("AskCampusHarvester/1.0")
        .timeout(FETCH_TIMEOUT)
        .build()?;

    let mut written = 0usize;
    for url in urls {
        if should_skip(url) {
            info!("Skipping {}", url);
            continue;
        }
        if let Some(domain) = domain {
            if !same_domain(url, domain) {
                warn!("Refusing off-domain URL {}", url);
                continue;
            }
        }
        match fetch_page(&client, url).await {
            Ok(page) if !page.content.trim().is_empty() => {
                let chunks = chunk_page(&page.content, &page.url, &page.title);
                append_chunks_jsonl(out, &chunks)?;
                written += chunks.len();
            }
            Ok(_) => warn!("No extractable content at {}", url),
            Err(e) => warn!("Failed to harvest {}: {}", url, e),
        }
    }

    info!("Harvest complete: {} chunks appended", written);
    Ok(written)
}
