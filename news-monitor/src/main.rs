use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use html_escape::encode_text;
use news_monitor::{
    build_sources, AppConfig, CycleOutcome, Fetcher, FingerprintStore, NewsPipeline, Notifier,
    RelevanceFilter, TelegramNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "news-monitor", about = "Crypto news monitor with Telegram notifications")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Run a single cycle and exit (non-zero if delivery fails)
    #[arg(long)]
    once: bool,

    /// Print what would be sent; never notifies, never writes the fingerprint file
    #[arg(long, conflicts_with = "once")]
    dry_run: bool,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env_overrides();
    init_tracing(&config.logging.level);
    config
        .validate(!cli.dry_run)
        .context("invalid configuration")?;

    info!("Starting news monitor");

    let fetch_config = config.http.fetch_config();
    let source_delay = fetch_config.source_delay;
    let fetcher = Arc::new(Fetcher::new(fetch_config)?);
    let sources = build_sources(&config.sources, fetcher)?;

    let store = FingerprintStore::load(
        &config.storage.fingerprint_file,
        config.storage.max_stored_fingerprints,
    );
    let store = if cli.dry_run { store.detached() } else { store };

    let mut pipeline = NewsPipeline::new(
        RelevanceFilter::new(&config.keywords),
        store,
        config.monitoring.max_articles_per_notification,
    )
    .with_source_delay(source_delay)
    .with_sources(sources);
    info!("{} sources configured", pipeline.source_count());

    if cli.dry_run {
        return dry_run(&pipeline).await;
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()?;
    let notifier = TelegramNotifier::new(client, &config.telegram.bot_token, &config.telegram.chat_id);
    notifier
        .test_connection()
        .await
        .context("Telegram connection test failed")?;

    if cli.once {
        run_once(&mut pipeline, &notifier).await
    } else {
        run_forever(&mut pipeline, &notifier, config.monitoring.interval()).await
    }
}

async fn cycle<N>(pipeline: &mut NewsPipeline, notifier: &N) -> CycleOutcome
where
    N: Notifier + ?Sized,
{
    let span = info_span!("cycle", id = %Uuid::new_v4());
    pipeline.run_cycle(notifier).instrument(span).await
}

async fn dry_run(pipeline: &NewsPipeline) -> Result<()> {
    let articles = pipeline.collect_new_articles().await;
    if articles.is_empty() {
        println!("No new articles");
        return Ok(());
    }
    for article in &articles {
        println!("- [{}] {}\n  {}", article.source_id(), article.title(), article.url());
    }
    Ok(())
}

async fn run_once(pipeline: &mut NewsPipeline, notifier: &TelegramNotifier) -> Result<()> {
    match cycle(pipeline, notifier).await {
        CycleOutcome::NoArticles => Ok(()),
        CycleOutcome::Delivered { count, .. } => {
            let summary = format!(
                "🤖 Run at {} delivered {} articles",
                Utc::now().format("%Y-%m-%d %H:%M UTC"),
                count
            );
            if let Err(e) = notifier.send_message(&summary).await {
                warn!("Failed to send run summary: {}", e);
            }
            Ok(())
        }
        CycleOutcome::DeliveryFailed { count, error } => {
            let report = format!(
                "🚨 News monitor failed to deliver {} articles\n\n{}",
                count,
                encode_text(&error)
            );
            if let Err(e) = notifier.send_message(&report).await {
                warn!("Failed to report delivery error: {}", e);
            }
            bail!("delivery failed: {}", error)
        }
    }
}

async fn run_forever(
    pipeline: &mut NewsPipeline,
    notifier: &TelegramNotifier,
    period: Duration,
) -> Result<()> {
    if let Err(e) = notifier
        .send_message("🤖 News monitor started. Watching crypto news...")
        .await
    {
        warn!("Failed to send start message: {}", e);
    }

    info!("Checking for news every {} minutes", period.as_secs() / 60);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Interrupted, shutting down");
    };
    pipeline.run_until(notifier, period, shutdown).await;

    if let Err(e) = notifier.send_message("⛔ News monitor stopped.").await {
        warn!("Failed to send stop message: {}", e);
    }
    Ok(())
}
