//! Model output validation.
//!
//! Parsing is lenient about surrounding noise (prose, markdown fences) and
//! strict about shape. Absence of a valid result is `None`, never an error.

use serde::de::DeserializeOwned;

use crate::summary::SummaryResult;
use crate::taxonomy::normalize_categories;

/// Characters of raw output kept for diagnostics
pub const SNIPPET_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy)]
enum Delimiters {
    Object,
    Array,
}

impl Delimiters {
    fn pair(self) -> (char, char) {
        match self {
            Delimiters::Object => ('{', '}'),
            Delimiters::Array => ('[', ']'),
        }
    }
}

/// Parse `raw` as `T`, retrying on the span between the first opening and
/// the last closing delimiter when the whole text does not parse.
fn salvage_parse<T: DeserializeOwned>(raw: &str, delimiters: Delimiters) -> Option<T> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }

    let (open, close) = delimiters.pair();
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn accept(mut result: SummaryResult) -> Option<SummaryResult> {
    if !result.is_well_formed() {
        return None;
    }
    result.categories = normalize_categories(&result.categories);
    Some(result)
}

/// Validate a single-article response.
pub fn validate_summary(raw: &str) -> Option<SummaryResult> {
    salvage_parse(raw, Delimiters::Object).and_then(accept)
}

/// Validate a batch response: an array of exactly `expected` well-formed summaries.
pub fn validate_batch(raw: &str, expected: usize) -> Option<Vec<SummaryResult>> {
    let items: Vec<SummaryResult> = salvage_parse(raw, Delimiters::Array)?;
    if items.len() != expected {
        tracing::debug!(expected, got = items.len(), "batch response length mismatch");
        return None;
    }
    items.into_iter().map(accept).collect()
}

/// First [`SNIPPET_CHARS`] characters of `raw`.
pub fn snippet(raw: &str) -> String {
    raw.chars().take(SNIPPET_CHARS).collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn point(i: usize) -> Value {
        if i % 2 == 0 {
            json!({ "heading": format!("Point {i}"), "bullets": ["one", "two"] })
        } else {
            json!({ "heading": format!("Point {i}"), "paragraph": "A short paragraph." })
        }
    }

    pub fn summary_value(url: &str) -> Value {
        json!({
            "author": null,
            "title": "Example story",
            "url": url,
            "points": (0..10).map(point).collect::<Vec<_>>(),
            "categories": ["Artificial Intelligence"]
        })
    }

    pub fn summary_json(url: &str) -> String {
        summary_value(url).to_string()
    }

    pub fn batch_json(urls: &[&str]) -> String {
        Value::Array(urls.iter().map(|u| summary_value(u)).collect()).to_string()
    }
}
