use crate::sources::SiteSpec;
use crate::types::{FetchConfig, MonitorError, Result, BROWSER_USER_AGENT};
use crate::utils::url::is_http_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub keywords: Vec<String>,
    #[serde(alias = "news_sources")]
    pub sources: SourcesConfig,
    pub storage: StorageConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default, alias = "rss_feeds")]
    pub feeds: Vec<String>,
    #[serde(default)]
    pub scrape_sites: Vec<ScrapeSiteConfig>,
}

/// A built-in site or a fully described one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "preset", rename_all = "lowercase")]
pub enum ScrapeSiteConfig {
    Investing,
    Tradingview,
    Custom(SiteSpec),
}

impl ScrapeSiteConfig {
    pub fn into_spec(self) -> SiteSpec {
        match self {
            Self::Investing => SiteSpec::investing(),
            Self::Tradingview => SiteSpec::tradingview(),
            Self::Custom(spec) => spec,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(alias = "processed_articles_file")]
    pub fingerprint_file: String,
    #[serde(alias = "max_stored_articles")]
    pub max_stored_fingerprints: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    pub max_articles_per_notification: usize,
}

fn default_interval_minutes() -> u64 {
    30
}

impl MonitoringConfig {
    /// Time between two cycles in daemon mode.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub feed_delay_ms: u64,
    pub source_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: 15,
            feed_delay_ms: 1_000,
            source_delay_ms: 2_000,
        }
    }
}

impl HttpConfig {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.timeout_secs,
            feed_delay: Duration::from_millis(self.feed_delay_ms),
            source_delay: Duration::from_millis(self.source_delay_ms),
            ..FetchConfig::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| MonitorError::Config(format!("invalid config: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Replace Telegram credentials from the environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(chat_id) = lookup(ENV_CHAT_ID).filter(|v| !v.trim().is_empty()) {
            self.telegram.chat_id = chat_id.trim().to_string();
        }
    }

    /// Startup checks. Credentials are only required when messages will be sent.
    pub fn validate(&self, require_telegram: bool) -> Result<()> {
        let fail = |msg: &str| Err(MonitorError::Config(msg.to_string()));

        if require_telegram {
            if self.telegram.bot_token.trim().is_empty() {
                return fail("telegram.bot_token is not set");
            }
            if self.telegram.chat_id.trim().is_empty() {
                return fail("telegram.chat_id is not set");
            }
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return fail("keywords must contain at least one non-empty keyword");
        }
        if self.sources.feeds.is_empty() && self.sources.scrape_sites.is_empty() {
            return fail("no sources configured");
        }
        if let Some(bad) = self.sources.feeds.iter().find(|u| !is_http_url(u)) {
            return Err(MonitorError::Config(format!("invalid feed URL: {}", bad)));
        }
        for site in &self.sources.scrape_sites {
            if let ScrapeSiteConfig::Custom(spec) = site {
                if spec.id.trim().is_empty() {
                    return fail("custom scrape site needs an id");
                }
                if !is_http_url(&spec.page_url) {
                    return Err(MonitorError::Config(format!(
                        "invalid page_url for site {}: {}",
                        spec.id, spec.page_url
                    )));
                }
                if spec.item_selectors.is_empty() {
                    return Err(MonitorError::Config(format!(
                        "site {} needs at least one item selector",
                        spec.id
                    )));
                }
            }
        }
        if self.storage.fingerprint_file.trim().is_empty() {
            return fail("storage.fingerprint_file is not set");
        }
        if self.storage.max_stored_fingerprints < 2 {
            return fail("storage.max_stored_fingerprints must be at least 2");
        }
        if self.monitoring.max_articles_per_notification == 0 {
            return fail("monitoring.max_articles_per_notification must be positive");
        }
        if self.monitoring.interval_minutes == 0 {
            return fail("monitoring.interval_minutes must be positive");
        }
        Ok(())
    }
}
