//! # Briefly
//!
//! Article extraction and structured summarisation with Gemini.
//!
//! ## Features
//!
//! - **Readable Extraction**: fetches a page, strips boilerplate and returns its text, title, excerpt and lead image
//! - **Structured Summaries**: ten headed points and taxonomy categories per article, validated before they are returned
//! - **Resilient Invocation**: retry with backoff and fallback across an ordered list of models
//! - **Batching**: many articles in one model call, all or nothing

pub mod agent;
pub mod config;
pub mod gemini;
pub mod image;
pub mod models;
pub mod prompt;
pub mod readability;
pub mod retry;
pub mod scraper;
pub mod summary;
pub mod taxonomy;
pub mod validate;

pub use agent::{AttemptError, SummarizationError, Summarizer};
pub use config::Config;
pub use gemini::{BackendError, GeminiClient, GenerativeBackend};
pub use models::ModelCandidates;
pub use crate::scraper::{extract_article, ExtractedArticle, ExtractionError, Extractor};
pub use summary::{SummaryPoint, SummaryRequest, SummaryResult};
