use crate::fetcher::Fetcher;
use crate::traits::{CandidateGate, SourceAdapter};
use crate::types::{ArticleCandidate, MonitorError, Result};
use crate::utils::text::element_text;
use crate::utils::url::resolve_article_url;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

fn default_max_items() -> usize {
    8
}

fn default_min_title_chars() -> usize {
    10
}

/// Declarative description of a news listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSpec {
    /// Used as the article `source_id`, usually the site host.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub page_url: String,
    /// Base for relative hrefs; defaults to `page_url`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Item selectors, tried in order until one matches anything.
    pub item_selectors: Vec<String>,
    /// Looked up inside each item; the link text is used when absent or unmatched.
    #[serde(default)]
    pub title_selector: Option<String>,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: usize,
}

impl SiteSpec {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// kr.investing.com cryptocurrency news
    pub fn investing() -> Self {
        Self {
            id: "kr.investing.com".to_string(),
            name: Some("Investing.com Korea".to_string()),
            page_url: "https://kr.investing.com/news/cryptocurrency-news".to_string(),
            base_url: Some("https://kr.investing.com".to_string()),
            item_selectors: vec![
                "article.largeTitle, article.mediumTitle1, article.js-article-item, \
                 div.largeTitle, div.mediumTitle1, div.js-article-item"
                    .to_string(),
                r#"a[data-test="article-title-link"], .articleItem a, .textDiv a"#.to_string(),
            ],
            title_selector: None,
            max_items: default_max_items(),
            min_title_chars: default_min_title_chars(),
        }
    }

    /// kr.tradingview.com crypto news
    pub fn tradingview() -> Self {
        Self {
            id: "kr.tradingview.com".to_string(),
            name: Some("TradingView Korea".to_string()),
            page_url: "https://kr.tradingview.com/news/?category=crypto".to_string(),
            base_url: Some("https://kr.tradingview.com".to_string()),
            item_selectors: vec![
                "a.apply-common-tooltip, a.news-item".to_string(),
                r#"a[href*="/news/"], .news-feed a, [data-role="news-item"] a"#.to_string(),
            ],
            title_selector: Some(
                "h3.title, h3.headline, h2.title, h2.headline, span.title, span.headline"
                    .to_string(),
            ),
            max_items: default_max_items(),
            min_title_chars: default_min_title_chars(),
        }
    }
}

/// Why a matched element did not become a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoLink,
    UnusableHref(String),
    ShortTitle(String),
}

/// Compiled form of a [`SiteSpec`]; pure HTML in, candidates out.
#[derive(Debug, Clone)]
pub struct SiteExtractor {
    spec: SiteSpec,
    base: Url,
    item_selectors: Vec<Selector>,
    title_selector: Option<Selector>,
    link_selector: Selector,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| MonitorError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

impl SiteExtractor {
    pub fn new(spec: SiteSpec) -> Result<Self> {
        if spec.item_selectors.is_empty() {
            return Err(MonitorError::Config(format!(
                "site {} has no item selectors",
                spec.id
            )));
        }

        let base = Url::parse(spec.base_url.as_deref().unwrap_or(&spec.page_url))?;
        let item_selectors = spec
            .item_selectors
            .iter()
            .map(|s| compile(s))
            .collect::<Result<Vec<_>>>()?;
        let title_selector = spec.title_selector.as_deref().map(compile).transpose()?;
        let link_selector = compile("a")?;

        Ok(Self {
            spec,
            base,
            item_selectors,
            title_selector,
            link_selector,
        })
    }

    pub fn spec(&self) -> &SiteSpec {
        &self.spec
    }

    /// Elements matched by the first selector strategy that matches anything.
    fn select_items<'d>(&self, document: &'d Html) -> Vec<ElementRef<'d>> {
        for (i, selector) in self.item_selectors.iter().enumerate() {
            let found: Vec<ElementRef<'d>> = document.select(selector).collect();
            if !found.is_empty() {
                if i > 0 {
                    debug!(
                        "{}: primary selectors found nothing, fallback #{} matched {} items",
                        self.spec.id,
                        i,
                        found.len()
                    );
                }
                return found;
            }
        }
        Vec::new()
    }

    pub fn extract_item(
        &self,
        item: ElementRef<'_>,
        now: DateTime<Utc>,
    ) -> std::result::Result<ArticleCandidate, SkipReason> {
        let link = if item.value().name() == "a" {
            item
        } else {
            item.select(&self.link_selector)
                .next()
                .ok_or(SkipReason::NoLink)?
        };

        let title = self
            .title_selector
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| element_text(&link));

        if title.chars().count() < self.spec.min_title_chars {
            return Err(SkipReason::ShortTitle(title));
        }

        let href = link.value().attr("href").unwrap_or_default();
        let url = resolve_article_url(&self.base, href)
            .ok_or_else(|| SkipReason::UnusableHref(href.to_string()))?;

        Ok(ArticleCandidate::new(title, url, "", now, self.spec.id.clone()))
    }

    /// Extract gated candidates from a listing page.
    ///
    /// Only the first `max_items` matched elements are inspected.
    pub fn extract(
        &self,
        html: &str,
        gate: &CandidateGate<'_>,
        now: DateTime<Utc>,
    ) -> Vec<ArticleCandidate> {
        let document = Html::parse_document(html);
        let items = self.select_items(&document);
        if items.is_empty() {
            debug!("{}: no selector matched any item", self.spec.id);
        }

        let mut out = Vec::new();
        for item in items.into_iter().take(self.spec.max_items) {
            match self.extract_item(item, now) {
                Ok(candidate) => {
                    if gate.admit(&candidate) {
                        out.push(candidate);
                    }
                }
                Err(reason) => debug!("{}: skipping item: {:?}", self.spec.id, reason),
            }
        }
        out
    }
}

/// One scraped news listing page.
pub struct ScrapeSite {
    extractor: SiteExtractor,
    fetcher: Arc<Fetcher>,
}

impl ScrapeSite {
    pub fn new(spec: SiteSpec, fetcher: Arc<Fetcher>) -> Result<Self> {
        Ok(Self {
            extractor: SiteExtractor::new(spec)?,
            fetcher,
        })
    }

    pub fn extractor(&self) -> &SiteExtractor {
        &self.extractor
    }
}

#[async_trait]
impl SourceAdapter for ScrapeSite {
    fn source_id(&self) -> String {
        self.extractor.spec().id.clone()
    }

    fn source_name(&self) -> String {
        self.extractor.spec().display_name().to_string()
    }

    async fn fetch_candidates(&self, gate: &CandidateGate<'_>) -> Result<Vec<ArticleCandidate>> {
        let page_url = &self.extractor.spec().page_url;
        info!("Checking {}: {}", self.source_name(), page_url);

        let html = self.fetcher.fetch_text(page_url).await?;
        let articles = self.extractor.extract(&html, gate, Utc::now());

        info!("Collected {} articles from {}", articles.len(), self.source_name());
        Ok(articles)
    }
}
