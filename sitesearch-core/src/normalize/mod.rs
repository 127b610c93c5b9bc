//! Result normalization.
//!
//! [`ResultNormalizer`] maps one provider [`RawResult`] to a
//! [`CanonicalResult`]: news enrichment, highlight rendering, description
//! truncation and file-type detection. It holds no mutable state, so the
//! same input always yields the same output.

pub mod exclusion;
pub mod file_type;
pub mod highlight;

use scraper::{Html, Node};

use crate::lookup::NewsIndexLookup;
use crate::provider::RawResult;
use crate::request::squish;
use crate::types::CanonicalResult;

pub use exclusion::ExclusionSet;

/// Per-request rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Translate highlight markers into emphasis markup instead of removing them.
    pub highlighting: bool,
    /// Visible-character limit for descriptions.
    pub description_max_chars: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            highlighting: true,
            description_max_chars: 255,
        }
    }
}

/// Maps raw provider results into canonical results.
pub struct ResultNormalizer<'a> {
    options: NormalizeOptions,
    news: Option<&'a dyn NewsIndexLookup>,
}

impl<'a> ResultNormalizer<'a> {
    pub fn new(options: NormalizeOptions, news: Option<&'a dyn NewsIndexLookup>) -> Self {
        Self { options, news }
    }

    /// Normalize one raw result.
    ///
    /// A news item whose link matches the URL exactly replaces the title,
    /// description and publication date.
    pub fn normalize(&self, raw: &RawResult) -> CanonicalResult {
        let enriched = self.news.and_then(|news| news.lookup(&raw.url));
        let (title, description, published_at) = match enriched {
            Some(item) => (
                html_to_text(&item.title),
                html_to_text(&item.description),
                item.published_at,
            ),
            None => (raw.title.clone(), raw.description.clone(), raw.published_at),
        };

        let description = highlight::truncate(&description, self.options.description_max_chars);

        CanonicalResult {
            title: highlight::render(&title, self.options.highlighting),
            url: raw.url.clone(),
            description: highlight::render(&description, self.options.highlighting),
            file_type: file_type::detect(&raw.url),
            published_at,
            provider: raw.provider,
        }
    }

    /// Normalize a ranked list, keeping its order.
    pub fn normalize_all(&self, raws: &[RawResult]) -> Vec<CanonicalResult> {
        raws.iter().map(|raw| self.normalize(raw)).collect()
    }
}

/// Reduce an HTML fragment to whitespace-squeezed text, skipping script and
/// style bodies.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    for node in fragment.root_element().descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };
        let in_code = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .is_some_and(|name| matches!(name, "script" | "style"));
        if !in_code {
            text.push_str(chunk);
        }
    }
    squish(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::news_map;
    use crate::types::{FileType, NewsItem, ProviderKind};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn raw(url: &str) -> RawResult {
        RawResult {
            title: "\u{e000}Tax\u{e001} forms".into(),
            url: url.into(),
            description: "Download \u{e000}tax\u{e001} forms & instructions".into(),
            published_at: None,
            provider: ProviderKind::WebApi,
        }
    }

    fn news() -> HashMap<String, NewsItem> {
        news_map([NewsItem {
            link: "https://www.irs.gov/news/1".into(),
            title: "<b>IRS</b> announces deadline".into(),
            description: "<p>File by <em>April 15</em>.</p><script>track()</script>".into(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single(),
        }])
    }

    #[test]
    fn highlighting_renders_emphasis() {
        let normalizer = ResultNormalizer::new(NormalizeOptions::default(), None);
        let result = normalizer.normalize(&raw("https://www.irs.gov/forms"));
        assert_eq!(result.title, "<strong>Tax</strong> forms");
        assert_eq!(
            result.description,
            "Download <strong>tax</strong> forms &amp; instructions"
        );
        assert_eq!(result.file_type, None);
        assert_eq!(result.provider, ProviderKind::WebApi);
    }

    #[test]
    fn plain_text_without_highlighting() {
        let options = NormalizeOptions {
            highlighting: false,
            ..Default::default()
        };
        let result = ResultNormalizer::new(options, None).normalize(&raw("https://www.irs.gov/f.pdf"));
        assert_eq!(result.title, "Tax forms");
        assert_eq!(result.description, "Download tax forms & instructions");
        assert_eq!(result.file_type, Some(FileType::Pdf));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let options = NormalizeOptions {
            highlighting: false,
            description_max_chars: 12,
        };
        let result = ResultNormalizer::new(options, None).normalize(&raw("https://www.irs.gov/forms"));
        assert_eq!(result.description, "Download tax...");
    }

    #[test]
    fn news_item_replaces_fields() {
        let news = news();
        let normalizer = ResultNormalizer::new(NormalizeOptions::default(), Some(&news as &dyn NewsIndexLookup));
        let result = normalizer.normalize(&raw("https://www.irs.gov/news/1"));
        assert_eq!(result.title, "IRS announces deadline");
        assert_eq!(result.description, "File by April 15.");
        assert!(result.published_at.is_some());
        assert_eq!(result.url, "https://www.irs.gov/news/1");
    }

    #[test]
    fn news_lookup_requires_exact_url() {
        let news = news();
        let normalizer = ResultNormalizer::new(NormalizeOptions::default(), Some(&news as &dyn NewsIndexLookup));
        let result = normalizer.normalize(&raw("https://www.irs.gov/news/1?x=1"));
        assert_eq!(result.title, "<strong>Tax</strong> forms");
    }

    #[test]
    fn normalization_is_idempotent() {
        let news = news();
        let normalizer = ResultNormalizer::new(NormalizeOptions::default(), Some(&news as &dyn NewsIndexLookup));
        let inputs = [raw("https://www.irs.gov/news/1"), raw("https://www.irs.gov/a.docx")];
        let first = normalizer.normalize_all(&inputs);
        let second = normalizer.normalize_all(&inputs);
        assert_eq!(first, second);
    }

    #[test]
    fn html_to_text_skips_scripts() {
        assert_eq!(
            html_to_text("<div>Hello <style>p{}</style><span>world</span></div>"),
            "Hello world"
        );
        assert_eq!(html_to_text("plain"), "plain");
    }
}
