pub mod format;
pub mod telegram;

pub use format::render_batch;
pub use telegram::{TelegramError, TelegramNotifier};

use crate::types::{ArticleCandidate, Result};
use async_trait::async_trait;

/// Delivery channel for article batches.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<()>;

    async fn test_connection(&self) -> Result<()>;

    /// Deliver a batch. `Ok` means every message of the batch was accepted.
    async fn notify(&self, articles: &[ArticleCandidate]) -> Result<()> {
        for message in render_batch(articles) {
            self.send_message(&message).await?;
        }
        Ok(())
    }
}
