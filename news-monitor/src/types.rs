use crate::fingerprint::{fingerprint, Fingerprint};
use crate::notify::TelegramError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single article pulled from a source, before it is delivered.
///
/// The fingerprint is derived from `(title, url)` when the candidate is built
/// and cannot drift from them afterwards, so all fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCandidate {
    title: String,
    url: String,
    summary: String,
    published_at: DateTime<Utc>,
    source_id: String,
    fingerprint: Fingerprint,
}

impl ArticleCandidate {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
        published_at: DateTime<Utc>,
        source_id: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let url = url.into();
        let fingerprint = fingerprint(&title, &url);

        Self {
            title,
            url,
            summary: summary.into(),
            published_at,
            source_id: source_id.into(),
            fingerprint,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_page_size_mb: usize,
    pub max_redirects: usize,
    /// Pause between two feed URLs of the same feed source.
    pub feed_delay: Duration,
    /// Pause between two source adapters.
    pub source_delay: Duration,
}

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_seconds: 15,
            max_page_size_mb: 10,
            max_redirects: 5,
            feed_delay: Duration::from_secs(1),
            source_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Page {url} exceeds the {limit_mb}MB size limit")]
    PageTooLarge { url: String, limit_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
