//! Web scraping module for article extraction.
//!
//! Uses reqwest for fetching and scraper for HTML parsing. Readable text
//! comes from [`crate::readability`], the representative image from
//! [`crate::image`].

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{redirect, Client};
use scraper::Html;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::config::HttpConfig;
use crate::image;
use crate::readability;

/// User-Agent string identifying this scraper
const USER_AGENT: &str = concat!("briefly/", env!("CARGO_PKG_VERSION"), " (article summarizer)");

/// Redirects followed before giving up
const MAX_REDIRECTS: usize = 5;

lazy_static! {
    static ref STYLE_BLOCK_RE: Regex =
        Regex::new(r"(?is)<style\b.*?</style\s*>").expect("STYLE_BLOCK_RE should compile");
    static ref STYLESHEET_LINK_RE: Regex =
        Regex::new(r#"(?i)<link\b[^>]*rel=["']?stylesheet["']?[^>]*>"#)
            .expect("STYLESHEET_LINK_RE should compile");
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("invalid article URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("extraction cancelled")]
    Cancelled,
}

/// Readable content extracted from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub excerpt: Option<String>,
    /// Main text, whitespace collapsed, never empty
    pub text: String,
    pub image_url: Option<String>,
}

/// Fetches article pages and extracts their readable content.
#[derive(Debug, Clone)]
pub struct Extractor {
    client: Client,
}

impl Extractor {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// Fetch and extract an article.
    ///
    /// `Ok(None)` means the page was fetched but holds no readable article.
    pub async fn extract(&self, url: &str) -> Result<Option<ExtractedArticle>, ExtractionError> {
        self.extract_with_cancel(url, &CancellationToken::new())
            .await
    }

    pub async fn extract_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ExtractedArticle>, ExtractionError> {
        let page_url = Url::parse(url).map_err(|source| ExtractionError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let (final_url, html) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExtractionError::Cancelled),
            fetched = self.fetch(page_url) => fetched.map_err(|source| ExtractionError::Network {
                url: url.to_string(),
                source,
            })?,
        };

        debug!(url, final_url = %final_url, bytes = html.len(), "fetched article page");
        Ok(extract_readable(&html, &final_url))
    }

    async fn fetch(&self, url: Url) -> Result<(Url, String), reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().clone();
        let html = response.text().await?;
        Ok((final_url, html))
    }
}

/// Fetch and extract an article with a one-off client.
pub async fn extract_article(
    url: &str,
    config: &HttpConfig,
) -> Result<Option<ExtractedArticle>, ExtractionError> {
    let extractor = Extractor::new(config).map_err(|source| ExtractionError::Network {
        url: url.to_string(),
        source,
    })?;
    extractor.extract(url).await
}

/// Drop `<style>` blocks and stylesheet links; they carry no article text.
pub fn strip_styles(html: &str) -> String {
    let without_blocks = STYLE_BLOCK_RE.replace_all(html, "");
    STYLESHEET_LINK_RE
        .replace_all(&without_blocks, "")
        .into_owned()
}

/// Parse markup without failing on malformed input. Diagnostics are logged.
fn parse_document(html: &str) -> Html {
    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        debug!(
            count = document.errors.len(),
            "markup diagnostics suppressed"
        );
        for error in &document.errors {
            trace!(%error, "markup diagnostic");
        }
    }
    document
}

/// Extract the readable article from already-fetched HTML.
///
/// Returns `None` when readability finds no text.
pub fn extract_readable(html: &str, page_url: &Url) -> Option<ExtractedArticle> {
    let html = strip_styles(html);
    let readable = readability::parse(&html, page_url)?;

    let text = readability::normalize_whitespace(&readable.text_content);
    if text.is_empty() {
        return None;
    }

    let document = parse_document(&html);
    let base = image::document_base(&document, page_url);
    let image_url = image::resolve_image(&document, &readable.content, &base);

    Some(ExtractedArticle {
        title: readable.title,
        excerpt: readable.excerpt,
        text,
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/news/story").unwrap()
    }

    const PARAGRAPH: &str = "Engineers at the observatory confirmed the new telescope had \
        captured its first light on Friday, a milestone two decades in the making.";

    #[test]
    fn strips_style_blocks_and_stylesheets() {
        let html = r#"<head><STYLE type="text/css">body :has(p) { color: red }</STYLE>
            <link rel="stylesheet" href="/a.css"><link rel=stylesheet href=/b.css>
            <link rel="icon" href="/favicon.ico"></head>"#;
        let stripped = strip_styles(html);
        assert!(!stripped.contains(":has"));
        assert!(!stripped.contains("a.css"));
        assert!(!stripped.contains("b.css"));
        assert!(stripped.contains("favicon.ico"));
    }

    #[test]
    fn extracts_collapsed_text_from_article() {
        let html = format!(
            "<html><head><title>First light</title><style>p {{ margin: 0 }}</style></head>\
             <body><nav><a href='/'>Home</a></nav><article><p>  {PARAGRAPH}\n\n</p>\
             <p>\tThe team   will publish results next year.</p></article></body></html>"
        );
        let article = extract_readable(&html, &page_url()).unwrap();
        assert_eq!(article.title, "First light");
        assert!(article.text.contains("Engineers at the observatory"));
        assert!(article.text.contains("The team will publish results next year."));
        assert!(!article.text.contains("  "));
        assert!(!article.text.contains('\n'));
        assert!(!article.text.contains("margin"));
        assert_eq!(article.text, article.text.trim());
    }

    #[test]
    fn boilerplate_page_is_not_extractable() {
        let html = "<html><body><nav><ul><li><a href='/a'>Section A with a long label</a></li>\
                    <li><a href='/b'>Section B with a long label</a></li></ul></nav>\
                    <div id='ad-banner'><a href='/offer'>Limited time offer, buy now and save big today</a></div>\
                    </body></html>";
        assert_eq!(extract_readable(html, &page_url()), None);
    }

    #[test]
    fn og_image_beats_content_image() {
        let html = format!(
            r#"<html><head><meta property="og:image" content="/og.jpg"></head>
            <body><article><p>{PARAGRAPH}</p><img src="/inline.jpg"></article></body></html>"#
        );
        let article = extract_readable(&html, &page_url()).unwrap();
        assert_eq!(article.image_url.as_deref(), Some("https://example.com/og.jpg"));
    }

    #[test]
    fn falls_back_to_content_image() {
        let html = format!(
            r#"<html><body><article><p>{PARAGRAPH}</p><img srcset="hero.jpg 1x, hero@2x.jpg 2x" src="x.jpg"></article></body></html>"#
        );
        let article = extract_readable(&html, &page_url()).unwrap();
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://example.com/news/hero.jpg")
        );
    }

    #[test]
    fn malformed_markup_still_extracts() {
        let html = format!("<html><body><article><p>{PARAGRAPH}<p>Unclosed <b>bold</article>");
        let article = extract_readable(&html, &page_url()).unwrap();
        assert!(article.text.contains("Unclosed bold"));
    }

    #[tokio::test]
    async fn invalid_url_is_reported() {
        let err = extract_article("not a url", &HttpConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn cancelled_extraction_does_not_fetch() {
        let extractor = Extractor::new(&HttpConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = extractor
            .extract_with_cancel("http://127.0.0.1:9/never", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Cancelled));
    }
}
