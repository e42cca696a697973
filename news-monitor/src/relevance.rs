/// Keyword gate over an article's title and summary.
///
/// Matching is a plain lower-cased substring test; there is no tokenizing,
/// stemming or scoring.
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // A blank keyword would match every article.
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_relevant(&self, title: &str, summary: &str) -> bool {
        let text = format!("{} {}", title, summary).to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}
