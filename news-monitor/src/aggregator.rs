use crate::types::ArticleCandidate;
use std::collections::HashSet;
use tracing::info;

/// Keep the first candidate seen for each URL, preserving collection order.
pub fn dedup_by_url(candidates: Vec<ArticleCandidate>) -> Vec<ArticleCandidate> {
    let mut seen_urls = HashSet::new();
    let total = candidates.len();

    let unique: Vec<ArticleCandidate> = candidates
        .into_iter()
        .filter(|c| seen_urls.insert(c.url().to_string()))
        .collect();

    let removed = total - unique.len();
    if removed > 0 {
        info!("Removed {} duplicate articles by URL", removed);
    }
    unique
}

/// Cut the batch to `max` articles, keeping the prefix. Returns how many were dropped.
pub fn truncate_batch(candidates: &mut Vec<ArticleCandidate>, max: usize) -> usize {
    if candidates.len() <= max {
        return 0;
    }
    let dropped = candidates.len() - max;
    candidates.truncate(max);
    info!("Limited batch to {} articles ({} dropped)", max, dropped);
    dropped
}

/// Dedup then truncate, the final shaping of a notification batch.
pub fn aggregate(candidates: Vec<ArticleCandidate>, max: usize) -> Vec<ArticleCandidate> {
    let mut unique = dedup_by_url(candidates);
    truncate_batch(&mut unique, max);
    unique
}
