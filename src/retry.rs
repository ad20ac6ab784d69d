//! Retry policy: failure classification and delay selection.
//!
//! Provider errors are classified partly by status code and partly by
//! matching message text. All of the matching lives in [`classify`] so the
//! rules can change without touching the summarizer loop.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

use crate::agent::AttemptError;
use crate::gemini::BackendError;

/// First backoff delay
pub const BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Backoff never exceeds this
pub const BACKOFF_CAP: Duration = Duration::from_secs(30);

lazy_static! {
    static ref RETRY_IN_RE: Regex =
        Regex::new(r"(?i)Please retry in\s+([0-9.]+)s").expect("RETRY_IN_RE should compile");
    static ref RETRY_DELAY_RE: Regex = Regex::new(r#""retryDelay"\s*:\s*"([0-9.]+)s""#)
        .expect("RETRY_DELAY_RE should compile");
}

/// Message fragments that mark a failure worth retrying.
const TRANSIENT_MARKERS: &[&str] = &[
    "429",
    "too many requests",
    "quota",
    "resource_exhausted",
    "503",
    "service unavailable",
    "overloaded",
    "fetch failed",
    "econnreset",
    "connection reset",
    "etimedout",
    "timed out",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry the same candidate after a delay
    Transient,
    /// Give up on this candidate and move to the next one
    NonTransient,
}

/// Decide whether an attempt failure is worth retrying.
pub fn classify(err: &AttemptError) -> ErrorClass {
    match err {
        // A formatting slip may not repeat.
        AttemptError::Validation { .. } => ErrorClass::Transient,
        AttemptError::Backend(backend) => classify_backend(backend),
    }
}

fn classify_backend(err: &BackendError) -> ErrorClass {
    match err {
        BackendError::Transport(_) => ErrorClass::Transient,
        BackendError::Status { status: 429 | 503, .. } => ErrorClass::Transient,
        other => classify_message(&other.to_string()),
    }
}

pub(crate) fn classify_message(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorClass::Transient
    } else {
        ErrorClass::NonTransient
    }
}

/// Parse `"41s"` / `"1.5s"` style durations, rounding up to whole milliseconds.
pub fn parse_duration_secs(raw: &str) -> Option<Duration> {
    let seconds: f64 = raw.trim().trim_end_matches('s').parse().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Some(Duration::from_millis((seconds * 1000.0).ceil() as u64))
}

/// Wait suggested by the provider, if the message carries one.
pub fn parse_retry_delay(message: &str) -> Option<Duration> {
    RETRY_IN_RE
        .captures(message)
        .or_else(|| RETRY_DELAY_RE.captures(message))
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_duration_secs(m.as_str()))
}

/// Exponential backoff keyed to the attempt index within one candidate.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    BACKOFF_BASE.saturating_mul(factor).min(BACKOFF_CAP)
}

/// Server-suggested wait when present, otherwise [`backoff_delay`].
pub fn retry_delay(err: &AttemptError, attempt: u32) -> Duration {
    let suggested = match err {
        AttemptError::Backend(BackendError::Status {
            retry_delay: Some(delay),
            ..
        }) => Some(*delay),
        AttemptError::Backend(backend) => parse_retry_delay(&backend.to_string()),
        AttemptError::Validation { .. } => None,
    };
    suggested.unwrap_or_else(|| backoff_delay(attempt))
}

/// Where the summarizer waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
