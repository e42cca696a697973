pub mod types;
pub mod fingerprint;
pub mod store;
pub mod relevance;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod aggregator;
pub mod pipeline;
pub mod notify;
pub mod config;
pub mod utils;

pub use types::*;
pub use fingerprint::{fingerprint, Fingerprint};
pub use store::FingerprintStore;
pub use relevance::RelevanceFilter;
pub use traits::{CandidateGate, SourceAdapter};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::{build_sources, RssFeedSource, ScrapeSite, SiteExtractor, SiteSpec};
pub use pipeline::{CycleOutcome, NewsPipeline};
pub use notify::{Notifier, TelegramNotifier};
pub use config::AppConfig;
