//! Representative image lookup for an article.

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use url::Url;

lazy_static! {
    /// Checked in order against the full document.
    static ref META_IMAGE_SELECTORS: Vec<Selector> = [
        r#"meta[property="og:image"]"#,
        r#"meta[property="og:image:url"]"#,
        r#"meta[name="twitter:image"]"#,
        r#"meta[name="twitter:image:src"]"#,
        r#"link[rel="image_src"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("image selector should parse"))
    .collect();
    static ref BASE_SELECTOR: Selector =
        Selector::parse("base[href]").expect("BASE_SELECTOR should parse");
    static ref IMG_SELECTOR: Selector = Selector::parse("img").expect("IMG_SELECTOR should parse");
}

/// Base URL for relative references: `<base href>` when it resolves, else the page URL.
pub fn document_base(document: &Html, page_url: &Url) -> Url {
    document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

/// Resolve `raw` against `base`. Blank or unparseable values are absent.
fn resolve(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    base.join(raw).ok().map(String::from)
}

/// URL part of the first `srcset` candidate.
fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .map(str::trim)
        .find(|part| !part.is_empty())
        .and_then(|part| part.split_whitespace().next())
}

/// Image advertised by Open Graph / Twitter meta tags or `<link rel="image_src">`.
pub fn meta_image(document: &Html, base: &Url) -> Option<String> {
    META_IMAGE_SELECTORS.iter().find_map(|selector| {
        let element = document.select(selector).next()?;
        let value = element.value();
        let raw = value
            .attr("content")
            .filter(|c| !c.trim().is_empty())
            .or_else(|| value.attr("href"))?;
        resolve(raw, base)
    })
}

/// First `<img>` of the extracted content, preferring its `srcset`.
pub fn content_image(content_html: &str, base: &Url) -> Option<String> {
    if content_html.trim().is_empty() {
        return None;
    }
    let fragment = Html::parse_fragment(content_html);
    let img = fragment.select(&IMG_SELECTOR).next()?;
    let value = img.value();
    let raw = value
        .attr("srcset")
        .and_then(first_srcset_candidate)
        .or_else(|| value.attr("src"))?;
    resolve(raw, base)
}

/// Meta-tag image if any, otherwise the first content image.
pub fn resolve_image(document: &Html, content_html: &str, base: &Url) -> Option<String> {
    meta_image(document, base).or_else(|| content_image(content_html, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://news.example.com/2024/story.html").unwrap()
    }

    #[test]
    fn open_graph_wins_over_content_image() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:image" content="/img/og.png"></head><body></body></html>"#,
        );
        let image = resolve_image(&doc, r#"<p><img src="inline.jpg"></p>"#, &base());
        assert_eq!(image.as_deref(), Some("https://news.example.com/img/og.png"));
    }

    #[test]
    fn meta_selectors_are_checked_in_order() {
        let doc = Html::parse_document(
            r#"<html><head>
                <link rel="image_src" href="https://cdn.example.com/link.png">
                <meta name="twitter:image" content="https://cdn.example.com/tw.png">
            </head></html>"#,
        );
        assert_eq!(
            meta_image(&doc, &base()).as_deref(),
            Some("https://cdn.example.com/tw.png")
        );
    }

    #[test]
    fn link_image_src_uses_href() {
        let doc = Html::parse_document(
            r#"<html><head><link rel="image_src" href="thumb.png"></head></html>"#,
        );
        assert_eq!(
            meta_image(&doc, &base()).as_deref(),
            Some("https://news.example.com/2024/thumb.png")
        );
    }

    #[test]
    fn content_image_prefers_srcset() {
        let html = r#"<figure><img src="small.jpg" srcset=" big.jpg 2x, huge.jpg 3x"></figure>"#;
        assert_eq!(
            content_image(html, &base()).as_deref(),
            Some("https://news.example.com/2024/big.jpg")
        );

        let html = r#"<img src="/only.jpg">"#;
        assert_eq!(
            content_image(html, &base()).as_deref(),
            Some("https://news.example.com/only.jpg")
        );
    }

    #[test]
    fn unparseable_urls_are_absent() {
        let doc = Html::parse_document(
            r#"<html><head><meta property="og:image" content="http://[::1"></head></html>"#,
        );
        assert_eq!(meta_image(&doc, &base()), None);
        assert_eq!(resolve_image(&doc, "", &base()), None);
    }

    #[test]
    fn base_element_overrides_page_url() {
        let doc = Html::parse_document(
            r#"<html><head><base href="https://static.example.org/assets/"></head></html>"#,
        );
        let base = document_base(&doc, &base());
        assert_eq!(
            content_image(r#"<img src="pic.png">"#, &base).as_deref(),
            Some("https://static.example.org/assets/pic.png")
        );
    }
}
