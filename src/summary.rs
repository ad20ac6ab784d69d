//! Summary types - the structured output produced by the model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Exact number of points a summary must carry
pub const POINTS_PER_SUMMARY: usize = 10;

/// One article handed to the prompt builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRequest {
    pub author: Option<String>,
    pub title: String,
    pub url: String,
    pub text: String,
}

impl SummaryRequest {
    pub fn new(title: impl Into<String>, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: None,
            title: title.into(),
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// A single headed point: either a handful of bullets or one paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryPoint {
    pub heading: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<String>,
}

impl SummaryPoint {
    fn has_bullets(&self) -> bool {
        self.bullets
            .as_ref()
            .is_some_and(|b| b.iter().any(|line| !line.trim().is_empty()))
    }

    fn has_paragraph(&self) -> bool {
        self.paragraph
            .as_ref()
            .is_some_and(|p| !p.trim().is_empty())
    }

    /// Non-empty heading and exactly one of bullets / paragraph.
    pub fn is_well_formed(&self) -> bool {
        !self.heading.trim().is_empty() && (self.has_bullets() != self.has_paragraph())
    }
}

/// Structured summary of one article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    #[serde(default, deserialize_with = "lenient_author")]
    pub author: Option<String>,
    pub title: String,
    pub url: String,
    pub points: Vec<SummaryPoint>,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<String>,
    /// Backend that produced this result; stamped after validation
    #[serde(default)]
    pub model_used: String,
}

impl SummaryResult {
    /// Check the full result shape: identifying fields and ten well-formed points.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.url.trim().is_empty()
            && self.points.len() == POINTS_PER_SUMMARY
            && self.points.iter().all(SummaryPoint::is_well_formed)
    }
}

/// Any non-string author counts as absent.
fn lenient_author<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(author) => Some(author),
        _ => None,
    })
}

/// A single label, a list (non-strings skipped) or nothing at all.
fn lenient_categories<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(label) => vec![label],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(label) => Some(label),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}
