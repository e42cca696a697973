use crate::aggregator::aggregate;
use crate::notify::Notifier;
use crate::relevance::RelevanceFilter;
use crate::store::FingerprintStore;
use crate::traits::{CandidateGate, SourceAdapter};
use crate::types::ArticleCandidate;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Result of one collect → notify → commit round.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoArticles,
    Delivered { count: usize, committed: usize },
    DeliveryFailed { count: usize, error: String },
}

/// Sequences sources, filtering, dedup and fingerprint commits.
///
/// All collaborators are handed in at construction; nothing is global.
pub struct NewsPipeline {
    sources: Vec<Box<dyn SourceAdapter>>,
    relevance: RelevanceFilter,
    store: FingerprintStore,
    max_articles: usize,
    source_delay: Duration,
}

impl NewsPipeline {
    pub fn new(relevance: RelevanceFilter, store: FingerprintStore, max_articles: usize) -> Self {
        Self {
            sources: Vec::new(),
            relevance,
            store,
            max_articles,
            source_delay: Duration::from_secs(2),
        }
    }

    pub fn with_source_delay(mut self, source_delay: Duration) -> Self {
        self.source_delay = source_delay;
        self
    }

    pub fn with_sources(mut self, sources: Vec<Box<dyn SourceAdapter>>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn add_source(&mut self, source: Box<dyn SourceAdapter>) {
        info!("Added source: {} ({})", source.source_name(), source.source_id());
        self.sources.push(source);
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Collect the next batch of unseen, relevant articles.
    ///
    /// Sources run one at a time with a pause in between; a failing source
    /// is logged and skipped. The fingerprint store is only read here.
    pub async fn collect_new_articles(&self) -> Vec<ArticleCandidate> {
        let gate = CandidateGate::new(&self.relevance, &self.store);
        let mut collected = Vec::new();

        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 && !self.source_delay.is_zero() {
                tokio::time::sleep(self.source_delay).await;
            }

            match source.fetch_candidates(&gate).await {
                Ok(mut found) => {
                    info!(source = %source.source_id(), count = found.len(), "source collected");
                    collected.append(&mut found);
                }
                Err(e) => {
                    warn!(source = %source.source_id(), error = %e, "source failed, skipping this cycle");
                }
            }
        }

        // Sources are expected to gate already; this pass covers the ones that don't.
        let before = collected.len();
        collected.retain(|c| gate.admit(c));
        if collected.len() < before {
            warn!("{} ungated candidates removed after collection", before - collected.len());
        }

        let batch = aggregate(collected, self.max_articles);
        info!("Collected {} new articles", batch.len());
        batch
    }

    /// Commit the fingerprints of delivered articles. Returns how many were new.
    pub fn mark_processed(&mut self, articles: &[ArticleCandidate]) -> usize {
        let added = self
            .store
            .commit(articles.iter().map(|a| a.fingerprint().clone()));
        info!("Marked {} articles processed ({} new fingerprints)", articles.len(), added);
        added
    }

    /// Collect, deliver through `notifier`, and commit only if delivery succeeded.
    pub async fn run_cycle<N>(&mut self, notifier: &N) -> CycleOutcome
    where
        N: Notifier + ?Sized,
    {
        let articles = self.collect_new_articles().await;
        if articles.is_empty() {
            info!("No new articles");
            return CycleOutcome::NoArticles;
        }

        let count = articles.len();
        match notifier.notify(&articles).await {
            Ok(()) => {
                let committed = self.mark_processed(&articles);
                CycleOutcome::Delivered { count, committed }
            }
            Err(e) => {
                error!("Failed to deliver {} articles: {}", count, e);
                CycleOutcome::DeliveryFailed {
                    count,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run a cycle now and then every `period` until `shutdown` resolves.
    ///
    /// `shutdown` is polled once up front and then only between cycles, so a
    /// signal that arrives mid-cycle stops the loop once that cycle is done.
    /// Returns the number of cycles run.
    pub async fn run_until<N, S>(&mut self, notifier: &N, period: Duration, shutdown: S) -> usize
    where
        N: Notifier + ?Sized,
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} cycles", cycles);
                    break;
                }
                _ = ticker.tick() => {
                    let span = info_span!("cycle", id = %Uuid::new_v4());
                    self.run_cycle(notifier).instrument(span).await;
                    cycles += 1;
                }
            }
        }
        cycles
    }
}
