pub mod rss_feed;
pub mod scrape_site;

pub use rss_feed::RssFeedSource;
pub use scrape_site::{ScrapeSite, SiteExtractor, SiteSpec, SkipReason};

use crate::config::SourcesConfig;
use crate::fetcher::Fetcher;
use crate::traits::SourceAdapter;
use crate::types::Result;
use std::sync::Arc;

/// Build adapters in collection order: feeds first, then sites in config order.
pub fn build_sources(config: &SourcesConfig, fetcher: Arc<Fetcher>) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();

    if !config.feeds.is_empty() {
        sources.push(Box::new(RssFeedSource::new(config.feeds.clone(), fetcher.clone())));
    }
    for site in &config.scrape_sites {
        sources.push(Box::new(ScrapeSite::new(site.clone().into_spec(), fetcher.clone())?));
    }

    Ok(sources)
}
