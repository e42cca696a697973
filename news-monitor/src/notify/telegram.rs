use super::Notifier;
use crate::types::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram API errors
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram API returned an error
    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    result: Option<BotUser>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

/// Telegram Bot API client bound to one chat
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base.trim_end_matches('/'), self.bot_token, method)
    }

    /// Send an HTML-formatted text message
    pub async fn send_html(&self, text: &str) -> std::result::Result<(), TelegramError> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(TelegramError::Api(error_text));
        }

        Ok(())
    }

    /// Check the token with `getMe`, returning the bot username
    pub async fn get_me(&self) -> std::result::Result<String, TelegramError> {
        let resp = self.client.get(self.method_url("getMe")).send().await?;
        let status = resp.status();
        let body: ApiResponse = resp.json().await?;

        if !status.is_success() || !body.ok {
            return Err(TelegramError::Api(
                body.description.unwrap_or_else(|| format!("getMe returned {}", status)),
            ));
        }

        Ok(body
            .result
            .and_then(|u| u.username)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<()> {
        Ok(self.send_html(text).await?)
    }

    async fn test_connection(&self) -> Result<()> {
        let username = self.get_me().await?;
        info!("Connected to Telegram as @{}", username);
        Ok(())
    }
}
