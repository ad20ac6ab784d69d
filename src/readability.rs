//! Main-content detection, backed by `dom_smoothie` (a port of Mozilla
//! Readability).
//!
//! Readability always falls back to its best attempt, so a page made only of
//! navigation and link blocks still yields some text. Such results are
//! dropped here when the content is dominated by link text.

use dom_smoothie::Readability;
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Share of content characters inside `<a>` above which the result is boilerplate
const MAX_LINK_DENSITY: f64 = 0.5;

lazy_static! {
    static ref LINK_SELECTOR: Selector = Selector::parse("a").expect("LINK_SELECTOR should parse");
}

/// What readability found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readable {
    pub title: String,
    pub excerpt: Option<String>,
    /// Cleaned HTML fragment of the article
    pub content: String,
    /// Plain text of `content`, as produced by readability
    pub text_content: String,
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run readability over `html`, or `None` when nothing readable remains.
pub fn parse(html: &str, page_url: &Url) -> Option<Readable> {
    let mut readability = match Readability::new(html, Some(page_url.as_str()), None) {
        Ok(readability) => readability,
        Err(error) => {
            debug!(%error, "readability rejected document");
            return None;
        }
    };
    let article = match readability.parse() {
        Ok(article) => article,
        Err(error) => {
            debug!(%error, "readability found no article");
            return None;
        }
    };

    let content = article.content.to_string();
    let density = link_density(&content)?;
    if density > MAX_LINK_DENSITY {
        debug!(density, "content is mostly links, treating as boilerplate");
        return None;
    }

    Some(Readable {
        title: normalize_whitespace(&article.title),
        excerpt: article
            .excerpt
            .map(|excerpt| normalize_whitespace(&excerpt))
            .filter(|excerpt| !excerpt.is_empty()),
        content,
        text_content: article.text_content.to_string(),
    })
}

/// Link text over all text of an HTML fragment. `None` when it has no text.
fn link_density(content_html: &str) -> Option<f64> {
    let fragment = Html::parse_fragment(content_html);
    let total = char_count(fragment.root_element().text());
    if total == 0 {
        return None;
    }
    let linked: usize = fragment
        .select(&LINK_SELECTOR)
        .map(|link| char_count(link.text()))
        .sum();
    Some(linked as f64 / total as f64)
}

fn char_count<'a>(text: impl Iterator<Item = &'a str>) -> usize {
    text.flat_map(str::chars).filter(|c| !c.is_whitespace()).count()
}
