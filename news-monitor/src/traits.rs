use crate::relevance::RelevanceFilter;
use crate::store::FingerprintStore;
use crate::types::{ArticleCandidate, Result};
use async_trait::async_trait;
use tracing::debug;

/// A place articles are pulled from (a set of RSS feeds, one scraped site, ...).
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier for this source
    fn source_id(&self) -> String;

    /// Human-readable name for this source
    fn source_name(&self) -> String;

    /// Fetch candidates that pass `gate`.
    ///
    /// An `Err` means the whole source failed for this cycle; the pipeline
    /// logs it and moves on to the next source.
    async fn fetch_candidates(&self, gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>>;
}

/// Relevance + already-seen check applied while candidates are collected.
pub struct CandidateGate<'a> {
    relevance: &'a RelevanceFilter,
    seen: &'a FingerprintStore,
}

impl<'a> CandidateGate<'a> {
    pub fn new(relevance: &'a RelevanceFilter, seen: &'a FingerprintStore) -> Self {
        Self { relevance, seen }
    }

    pub fn admit(&self, candidate: &ArticleCandidate) -> bool {
        if !self.relevance.is_relevant(candidate.title(), candidate.summary()) {
            debug!("Not relevant: {}", candidate.title());
            return false;
        }
        if self.seen.contains(candidate.fingerprint()) {
            debug!("Already processed: {}", candidate.title());
            return false;
        }
        true
    }
}
