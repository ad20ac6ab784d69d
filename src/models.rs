//! Ordered list of model candidates tried by the summarizer.

use crate::config::GeminiConfig;

/// Appended after the configured models, in this order.
pub const BUILTIN_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Primary, fallback, then built-ins; blank names dropped, first occurrence kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates {
    names: Vec<String>,
}

impl ModelCandidates {
    pub fn new(primary: Option<&str>, fallback: Option<&str>) -> Self {
        Self::from_names(
            [primary, fallback]
                .into_iter()
                .flatten()
                .chain(BUILTIN_MODELS.iter().copied()),
        )
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(config.model.as_deref(), config.fallback_model.as_deref())
    }

    /// Exactly the given names (deduplicated), without built-ins.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out: Vec<String> = Vec::new();
        for name in names.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
            if !out.iter().any(|existing| existing == name) {
                out.push(name.to_string());
            }
        }
        Self { names: out }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
