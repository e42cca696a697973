use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::{CandidateGate, SourceAdapter};
use crate::types::{ArticleCandidate, Result};
use crate::utils::url::{extract_host, resolve_article_url};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// All configured RSS/Atom feeds, read one after the other.
pub struct RssFeedSource {
    urls: Vec<String>,
    fetcher: Arc<Fetcher>,
    parser: FeedParser,
    feed_delay: Duration,
}

impl RssFeedSource {
    pub fn new(urls: Vec<String>, fetcher: Arc<Fetcher>) -> Self {
        let feed_delay = fetcher.config().feed_delay;
        Self {
            urls,
            fetcher,
            parser: FeedParser::new(),
            feed_delay,
        }
    }

    pub fn with_feed_delay(mut self, feed_delay: Duration) -> Self {
        self.feed_delay = feed_delay;
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Turn one feed document into gated candidates.
    ///
    /// Entries without a title or without a usable http(s) link are skipped.
    pub fn collect_from_content(
        &self,
        feed_url: &str,
        content: &str,
        gate: &CandidateGate<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ArticleCandidate>> {
        let parsed = self.parser.parse_feed(content)?;
        let base = Url::parse(feed_url)?;
        let source_id = extract_host(feed_url).unwrap_or_else(|| feed_url.to_string());

        let mut out = Vec::new();
        for entry in parsed.entries {
            if entry.title.is_empty() {
                debug!("Skipping untitled entry in {}", feed_url);
                continue;
            }
            let Some(url) = resolve_article_url(&base, &entry.link) else {
                debug!("Skipping entry with unusable link {:?} in {}", entry.link, feed_url);
                continue;
            };

            let candidate = ArticleCandidate::new(
                entry.title,
                url,
                entry.summary,
                entry.published_at.unwrap_or(now),
                source_id.clone(),
            );
            if gate.admit(&candidate) {
                out.push(candidate);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RssFeedSource {
    fn source_id(&self) -> String {
        "rss".to_string()
    }

    fn source_name(&self) -> String {
        format!("RSS feeds ({})", self.urls.len())
    }

    async fn fetch_candidates(&self, gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>> {
        let mut articles = Vec::new();

        for (i, feed_url) in self.urls.iter().enumerate() {
            if i > 0 && !self.feed_delay.is_zero() {
                tokio::time::sleep(self.feed_delay).await;
            }

            info!("Checking RSS feed: {}", feed_url);
            let content = match self.fetcher.fetch_text(feed_url).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to fetch RSS feed {}: {}", feed_url, e);
                    continue;
                }
            };

            match self.collect_from_content(feed_url, &content, gate, Utc::now()) {
                Ok(mut found) => {
                    info!("RSS feed {}: {} new relevant articles", feed_url, found.len());
                    articles.append(&mut found);
                }
                Err(e) => warn!("Skipping malformed RSS feed {}: {}", feed_url, e),
            }
        }

        Ok(articles)
    }
}
