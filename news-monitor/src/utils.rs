/// URL helpers for article links
pub mod url {
    use url::{ParseError, Url};

    /// Extract host from URL
    pub fn extract_host(url_str: &str) -> Option<String> {
        Url::parse(url_str)
            .ok()
            .and_then(|url| url.host_str().map(|h| h.to_string()))
    }

    /// Validate that a URL is absolute http(s)
    pub fn is_http_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => url.scheme() == "http" || url.scheme() == "https",
            Err(_) => false,
        }
    }

    /// Turn an href found on a page into an absolute http(s) article URL.
    ///
    /// Relative hrefs are joined onto `base`. Empty and fragment-only hrefs,
    /// and absolute URLs with any other scheme (`javascript:`, `mailto:`, ...)
    /// yield `None`.
    pub fn resolve_article_url(base: &Url, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let resolved = match Url::parse(href) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => base.join(href).ok()?,
            Err(_) => return None,
        };

        match resolved.scheme() {
            "http" | "https" => Some(resolved.to_string()),
            _ => None,
        }
    }
}

/// Text cleanup for scraped titles and feed summaries
pub mod text {
    use scraper::{ElementRef, Html};

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Visible text of an element, whitespace collapsed
    pub fn element_text(element: &ElementRef) -> String {
        collapse_whitespace(&element.text().collect::<String>())
    }

    /// Strip tags from an HTML fragment (feed summaries often carry markup)
    pub fn html_to_text(html: &str) -> String {
        if !html.contains('<') && !html.contains('&') {
            return collapse_whitespace(html);
        }
        let fragment = Html::parse_fragment(html);
        element_text(&fragment.root_element())
    }
}

#[cfg(test)]
mod tests {
    use super::text::*;
    use super::url::*;
    use ::url::Url;

    #[test]
    fn resolves_relative_and_keeps_absolute() {
        let base = Url::parse("https://kr.investing.com/news/cryptocurrency-news").unwrap();
        assert_eq!(
            resolve_article_url(&base, "/news/cryptocurrency-news/bitcoin-123").as_deref(),
            Some("https://kr.investing.com/news/cryptocurrency-news/bitcoin-123")
        );
        assert_eq!(
            resolve_article_url(&base, "https://other.example.com/a?b=1").as_deref(),
            Some("https://other.example.com/a?b=1")
        );
        assert_eq!(
            resolve_article_url(&base, "//cdn.example.com/story").as_deref(),
            Some("https://cdn.example.com/story")
        );
    }

    #[test]
    fn rejects_non_http_and_empty_hrefs() {
        let base = Url::parse("https://kr.tradingview.com/news/").unwrap();
        assert_eq!(resolve_article_url(&base, ""), None);
        assert_eq!(resolve_article_url(&base, "#top"), None);
        assert_eq!(resolve_article_url(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_article_url(&base, "mailto:desk@example.com"), None);
        assert_eq!(resolve_article_url(&base, "ftp://example.com/file"), None);
    }

    #[test]
    fn host_and_scheme_helpers() {
        assert_eq!(extract_host("https://cointelegraph.com/rss"), Some("cointelegraph.com".to_string()));
        assert_eq!(extract_host("not a url"), None);
        assert!(is_http_url("http://example.com/feed"));
        assert!(!is_http_url("ftp://example.com/feed"));
        assert!(!is_http_url("example.com/feed"));
    }

    #[test]
    fn html_summary_becomes_plain_text() {
        assert_eq!(
            html_to_text("<p>Bitcoin <b>rallies</b>\n again</p> &amp; more"),
            "Bitcoin rallies again & more"
        );
        assert_eq!(html_to_text("  plain   text "), "plain text");
    }
}
