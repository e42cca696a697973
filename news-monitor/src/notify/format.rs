use crate::types::ArticleCandidate;
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::warn;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const MAX_TITLE_CHARS: usize = 300;

fn render_article(index: usize, article: &ArticleCandidate) -> String {
    let title: String = article.title().chars().take(MAX_TITLE_CHARS).collect();
    let footer = format!(
        "🏷 {} · {}",
        encode_text(article.source_id()),
        article.published_at().format("%Y-%m-%d %H:%M UTC"),
    );
    let linked = format!(
        "{}. <a href=\"{}\">{}</a>\n{}\n",
        index,
        encode_double_quoted_attribute(article.url()),
        encode_text(&title),
        footer,
    );
    if linked.chars().count() < MAX_MESSAGE_CHARS / 2 {
        return linked;
    }

    // A link this long cannot be cut without breaking it; send the title alone.
    warn!("URL of {:?} is too long for a message, sending without link", article.title());
    format!("{}. {}\n{}\n", index, encode_text(&title), footer)
}

/// Render a batch as one or more HTML messages, split on article boundaries.
///
/// Every message stays within [`MAX_MESSAGE_CHARS`]; the header only ever
/// appears together with at least one article.
pub fn render_batch(articles: &[ArticleCandidate]) -> Vec<String> {
    if articles.is_empty() {
        return Vec::new();
    }

    let mut messages = Vec::new();
    let mut current = format!("📰 <b>{} new crypto articles</b>\n\n", articles.len());
    let mut current_chars = current.chars().count();
    let mut current_articles = 0;

    for (i, article) in articles.iter().enumerate() {
        let block = render_article(i + 1, article);
        let block_chars = block.chars().count() + 1;

        if current_articles > 0 && current_chars + block_chars > MAX_MESSAGE_CHARS {
            messages.push(current.trim_end().to_string());
            current = String::new();
            current_chars = 0;
            current_articles = 0;
        }
        current.push_str(&block);
        current.push('\n');
        current_chars += block_chars;
        current_articles += 1;
    }

    if current_articles > 0 {
        messages.push(current.trim_end().to_string());
    }
    messages
}
