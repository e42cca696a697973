use async_trait::async_trait;
use chrono::Utc;
use news_monitor::notify::TelegramError;
use news_monitor::{
    ArticleCandidate, CandidateGate, CycleOutcome, FingerprintStore, MonitorError, NewsPipeline,
    Notifier, RelevanceFilter, Result, SourceAdapter,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn article(title: &str, url: &str) -> ArticleCandidate {
    ArticleCandidate::new(title, url, "", Utc::now(), "mock")
}

/// Returns a fixed list, gated like a real adapter would.
struct StaticSource {
    id: &'static str,
    articles: Vec<ArticleCandidate>,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    fn boxed(id: &'static str, articles: Vec<ArticleCandidate>) -> Box<dyn SourceAdapter> {
        Box::new(Self {
            id,
            articles,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn source_id(&self) -> String {
        self.id.to_string()
    }

    fn source_name(&self) -> String {
        format!("static {}", self.id)
    }

    async fn fetch_candidates(&self, gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .articles
            .iter()
            .filter(|a| gate.admit(a))
            .cloned()
            .collect())
    }
}

/// Ignores the gate entirely.
struct UngatedSource(Vec<ArticleCandidate>);

#[async_trait]
impl SourceAdapter for UngatedSource {
    fn source_id(&self) -> String {
        "ungated".to_string()
    }

    fn source_name(&self) -> String {
        "ungated".to_string()
    }

    async fn fetch_candidates(&self, _gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

#[async_trait]
impl SourceAdapter for FailingSource {
    fn source_id(&self) -> String {
        "broken".to_string()
    }

    fn source_name(&self) -> String {
        "broken".to_string()
    }

    async fn fetch_candidates(&self, _gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>> {
        Err(MonitorError::HttpStatus {
            url: "https://broken.example.com".to_string(),
            status: 503,
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(TelegramError::Api("chat not found".to_string()).into());
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }
}

fn pipeline(store: FingerprintStore, max: usize) -> NewsPipeline {
    NewsPipeline::new(RelevanceFilter::new(["bitcoin", "btc"]), store, max)
        .with_source_delay(Duration::ZERO)
}

#[tokio::test]
async fn duplicate_urls_across_sources_keep_first() {
    init_tracing();
    let a = article("Bitcoin up", "https://a.example.com/1");
    let b = article("BTC down", "https://b.example.com/2");
    let a_again = article("Bitcoin up (syndicated)", "https://a.example.com/1");

    let pipeline = pipeline(FingerprintStore::in_memory(100), 10).with_sources(vec![
        StaticSource::boxed("one", vec![a.clone(), b.clone()]),
        StaticSource::boxed("two", vec![a_again]),
    ]);

    let batch = pipeline.collect_new_articles().await;
    assert_eq!(batch, vec![a, b]);
    assert_eq!(batch[0].title(), "Bitcoin up");
}

#[tokio::test]
async fn batch_is_truncated_to_max() {
    let articles: Vec<_> = (0..5)
        .map(|n| article(&format!("Bitcoin {}", n), &format!("https://x.example.com/{}", n)))
        .collect();
    let pipeline = pipeline(FingerprintStore::in_memory(100), 2)
        .with_sources(vec![StaticSource::boxed("many", articles.clone())]);

    let batch = pipeline.collect_new_articles().await;
    assert_eq!(batch, articles[..2].to_vec());
}

#[tokio::test]
async fn failing_source_does_not_stop_the_cycle() {
    let good = article("Bitcoin steady", "https://good.example.com/1");
    let mut pipeline = pipeline(FingerprintStore::in_memory(100), 10);
    pipeline.add_source(Box::new(FailingSource));
    pipeline.add_source(StaticSource::boxed("good", vec![good.clone()]));
    assert_eq!(pipeline.source_count(), 2);

    assert_eq!(pipeline.collect_new_articles().await, vec![good]);
}

#[tokio::test]
async fn seen_and_irrelevant_candidates_never_surface() {
    let seen = article("Bitcoin old news", "https://x.example.com/old");
    let fresh = article("Bitcoin fresh news", "https://x.example.com/new");
    let off_topic = article("Gold rallies", "https://x.example.com/gold");

    let mut store = FingerprintStore::in_memory(100);
    store.commit(vec![seen.fingerprint().clone()]);

    let pipeline = pipeline(store, 10).with_sources(vec![Box::new(UngatedSource(vec![
        seen,
        fresh.clone(),
        off_topic,
    ]))]);

    assert_eq!(pipeline.collect_new_articles().await, vec![fresh]);
}

#[tokio::test]
async fn collecting_does_not_touch_the_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("processed.json");
    let store = FingerprintStore::load(&path, 100);

    let pipeline = pipeline(store, 10).with_sources(vec![StaticSource::boxed(
        "one",
        vec![article("Bitcoin", "https://x.example.com/1")],
    )]);

    let first = pipeline.collect_new_articles().await;
    let second = pipeline.collect_new_articles().await;
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert!(pipeline.store().is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn mark_processed_is_idempotent_and_suppresses_repeats() {
    let a = article("Bitcoin one", "https://x.example.com/1");
    let b = article("Bitcoin two", "https://x.example.com/2");
    let mut pipeline = pipeline(FingerprintStore::in_memory(100), 10)
        .with_sources(vec![StaticSource::boxed("one", vec![a.clone(), b.clone()])]);

    let batch = pipeline.collect_new_articles().await;
    assert_eq!(pipeline.mark_processed(&batch), 2);
    assert_eq!(pipeline.mark_processed(&batch), 0);
    assert_eq!(pipeline.store().len(), 2);

    assert!(pipeline.collect_new_articles().await.is_empty());
}

#[tokio::test]
async fn failed_delivery_commits_nothing() {
    let a = article("Bitcoin one", "https://x.example.com/1");
    let mut pipeline = pipeline(FingerprintStore::in_memory(100), 10)
        .with_sources(vec![StaticSource::boxed("one", vec![a.clone()])]);
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };

    match pipeline.run_cycle(&notifier).await {
        CycleOutcome::DeliveryFailed { count, error } => {
            assert_eq!(count, 1);
            assert!(error.contains("chat not found"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(pipeline.store().is_empty());

    // same article comes back next cycle
    assert_eq!(pipeline.collect_new_articles().await, vec![a]);
}

#[tokio::test]
async fn successful_delivery_commits_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("processed.json");
    let a = article("Bitcoin one", "https://x.example.com/1");
    let b = article("BTC two", "https://x.example.com/2");

    let mut pipeline = pipeline(FingerprintStore::load(&path, 100), 10)
        .with_sources(vec![StaticSource::boxed("one", vec![a.clone(), b.clone()])]);
    let notifier = RecordingNotifier::default();

    assert_eq!(
        pipeline.run_cycle(&notifier).await,
        CycleOutcome::Delivered {
            count: 2,
            committed: 2
        }
    );
    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("https://x.example.com/1"));
    assert!(sent[0].contains("BTC two"));

    let reloaded = FingerprintStore::load(&path, 100);
    assert!(reloaded.contains(a.fingerprint()));
    assert!(reloaded.contains(b.fingerprint()));

    assert_eq!(pipeline.run_cycle(&notifier).await, CycleOutcome::NoArticles);
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn sources_run_in_order_once_per_cycle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = StaticSource {
        id: "counted",
        articles: vec![article("Bitcoin", "https://x.example.com/1")],
        calls: calls.clone(),
    };
    let pipeline = pipeline(FingerprintStore::in_memory(100), 10).with_sources(vec![Box::new(source)]);

    pipeline.collect_new_articles().await;
    pipeline.collect_new_articles().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Fires `trigger` the first time it is polled for candidates.
struct TriggerSource {
    trigger: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

#[async_trait]
impl SourceAdapter for TriggerSource {
    fn source_id(&self) -> String {
        "trigger".to_string()
    }

    fn source_name(&self) -> String {
        "trigger".to_string()
    }

    async fn fetch_candidates(&self, _gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>> {
        let trigger = self.trigger.lock().unwrap().take();
        if let Some(tx) = trigger {
            let _ = tx.send(());
        }
        // still busy when the shutdown request lands
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(vec![article("Bitcoin mid-shutdown", "https://x.example.com/late")])
    }
}

#[tokio::test]
async fn shutdown_during_a_cycle_stops_after_it_completes() {
    init_tracing();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let mut pipeline = pipeline(FingerprintStore::in_memory(100), 10).with_sources(vec![Box::new(
        TriggerSource {
            trigger: Mutex::new(Some(tx)),
        },
    )]);
    let notifier = RecordingNotifier::default();

    let cycles = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run_until(&notifier, Duration::from_millis(10), async {
            let _ = rx.await;
        }),
    )
    .await
    .expect("loop kept running after shutdown was requested");

    assert_eq!(cycles, 1);
    // the interrupted cycle still delivered and committed
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    assert_eq!(pipeline.store().len(), 1);
}

#[tokio::test]
async fn shutdown_before_start_runs_no_cycle() {
    let mut pipeline = pipeline(FingerprintStore::in_memory(100), 10).with_sources(vec![
        StaticSource::boxed("one", vec![article("Bitcoin", "https://x.example.com/1")]),
    ]);
    let notifier = RecordingNotifier::default();

    let cycles = pipeline
        .run_until(&notifier, Duration::from_millis(10), std::future::ready(()))
        .await;
    assert_eq!(cycles, 0);
    assert!(notifier.sent.lock().unwrap().is_empty());
}
