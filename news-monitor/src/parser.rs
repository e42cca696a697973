use crate::types::{MonitorError, Result};
use crate::utils::text::html_to_text;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::debug;

/// Only the most recent entries of a feed are inspected each cycle.
pub const MAX_ENTRIES_PER_FEED: usize = 10;

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

/// Entry fields with empty-string defaults when the feed leaves them out.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
}

pub struct FeedParser {
    max_entries: usize,
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            max_entries: MAX_ENTRIES_PER_FEED,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Parse RSS/Atom content, keeping the first `max_entries` entries in feed order.
    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| MonitorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .take(self.max_entries)
            .map(Self::parse_entry)
            .collect();

        debug!("Parsed feed with {} entries", entries.len());
        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
        let title = entry
            .title
            .map(|t| html_to_text(&t.content))
            .unwrap_or_default();

        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();

        // Prefer the summary, fall back to the content body
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|s| html_to_text(&s))
            .unwrap_or_default();

        ParsedEntry {
            title,
            link,
            summary,
            published_at: entry.published.or(entry.updated),
        }
    }
}
