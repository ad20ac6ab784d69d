//! Resilient summarization over an ordered list of model candidates.
//!
//! Each candidate gets `max_retries + 1` attempts. Transient failures (and
//! responses that fail validation) are retried after a delay; anything else
//! moves straight to the next candidate. The first valid result wins.

pub use crate::summary::{SummaryRequest, SummaryResult};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, GeminiConfig};
use crate::gemini::{BackendError, GeminiClient, GenerativeBackend};
use crate::models::ModelCandidates;
use crate::prompt::{build_batch_prompt, build_prompt};
use crate::retry::{classify, retry_delay, ErrorClass, Sleeper, TokioSleeper};
use crate::validate::{snippet, validate_batch, validate_summary};

/// Why a single attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("model {model} did not return valid summary JSON: {snippet}")]
    Validation { model: String, snippet: String },
}

#[derive(Error, Debug)]
pub enum SummarizationError {
    #[error("all model candidates failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: AttemptError,
    },
    #[error("no model candidates configured")]
    NoCandidates,
    #[error("summarization cancelled")]
    Cancelled,
}

/// Outcome of one pass over a candidate.
enum Attempt<T> {
    Accepted(T),
    Failed(AttemptError),
}

/// Summarizes articles through a [`GenerativeBackend`], with retry and fallback.
pub struct Summarizer<B, S = TokioSleeper> {
    backend: B,
    sleeper: S,
    candidates: ModelCandidates,
    max_retries: u32,
}

impl Summarizer<GeminiClient, TokioSleeper> {
    /// Build the production summarizer from configuration.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Ok(Self::new(GeminiClient::new(&config.gemini)?, &config.gemini))
    }
}

impl<B: GenerativeBackend> Summarizer<B, TokioSleeper> {
    pub fn new(backend: B, config: &GeminiConfig) -> Self {
        Self {
            backend,
            sleeper: TokioSleeper,
            candidates: ModelCandidates::from_config(config),
            max_retries: config.max_retries,
        }
    }
}

impl<B: GenerativeBackend, S: Sleeper> Summarizer<B, S> {
    /// Replace the sleeper used between attempts.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Summarizer<B, T> {
        Summarizer {
            backend: self.backend,
            sleeper,
            candidates: self.candidates,
            max_retries: self.max_retries,
        }
    }

    /// Replace the candidate list.
    pub fn with_candidates(mut self, candidates: ModelCandidates) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn candidates(&self) -> &ModelCandidates {
        &self.candidates
    }

    pub async fn summarize(
        &self,
        request: &SummaryRequest,
    ) -> Result<SummaryResult, SummarizationError> {
        self.summarize_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Summarize one article, aborting at the next suspension point once
    /// `cancel` fires.
    pub async fn summarize_with_cancel(
        &self,
        request: &SummaryRequest,
        cancel: &CancellationToken,
    ) -> Result<SummaryResult, SummarizationError> {
        let prompt = build_prompt(request);
        debug!(url = %request.url, prompt_chars = prompt.chars().count(), "summarizing article");

        self.invoke(&prompt, cancel, validate_summary, |result, model| {
            result.model_used = model.to_string();
        })
        .await
    }

    pub async fn summarize_batch(
        &self,
        requests: &[SummaryRequest],
    ) -> Result<Vec<SummaryResult>, SummarizationError> {
        self.summarize_batch_with_cancel(requests, &CancellationToken::new())
            .await
    }

    /// Summarize every request in one model call.
    ///
    /// All or nothing: the returned vector matches `requests` in length and
    /// order, or the call fails.
    pub async fn summarize_batch_with_cancel(
        &self,
        requests: &[SummaryRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<SummaryResult>, SummarizationError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let prompt = build_batch_prompt(requests);
        let expected = requests.len();
        debug!(articles = expected, prompt_chars = prompt.chars().count(), "summarizing batch");

        self.invoke(
            &prompt,
            cancel,
            |raw| validate_batch(raw, expected),
            |results, model| {
                for result in results.iter_mut() {
                    result.model_used = model.to_string();
                }
            },
        )
        .await
    }

    async fn invoke<T, V, M>(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
        validate: V,
        stamp: M,
    ) -> Result<T, SummarizationError>
    where
        V: Fn(&str) -> Option<T>,
        M: Fn(&mut T, &str),
    {
        let candidate_count = self.candidates.len();
        let mut last_error = None;
        let mut attempts = 0u32;

        for (candidate_idx, model) in self.candidates.iter().enumerate() {
            let is_last_candidate = candidate_idx + 1 == candidate_count;

            for attempt in 0..=self.max_retries {
                if cancel.is_cancelled() {
                    return Err(SummarizationError::Cancelled);
                }
                attempts += 1;

                let err = match self.attempt(model, prompt, cancel, &validate).await? {
                    Attempt::Accepted(mut value) => {
                        stamp(&mut value, model);
                        info!(model, attempt, "summary accepted");
                        return Ok(value);
                    }
                    Attempt::Failed(err) => err,
                };

                let class = classify(&err);
                let attempts_left = attempt < self.max_retries;
                let delay = (class == ErrorClass::Transient
                    && (attempts_left || !is_last_candidate))
                    .then(|| retry_delay(&err, attempt));

                warn!(
                    model,
                    attempt,
                    ?class,
                    delay_ms = delay.map(|d| d.as_millis() as u64),
                    error = %err,
                    "summarization attempt failed"
                );
                last_error = Some(err);

                if class == ErrorClass::NonTransient {
                    break;
                }
                if let Some(delay) = delay {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(SummarizationError::Cancelled),
                        _ = self.sleeper.sleep(delay) => {}
                    }
                }
            }
        }

        match last_error {
            Some(last) => Err(SummarizationError::Exhausted { attempts, last }),
            None => Err(SummarizationError::NoCandidates),
        }
    }

    async fn attempt<T, V>(
        &self,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
        validate: &V,
    ) -> Result<Attempt<T>, SummarizationError>
    where
        V: Fn(&str) -> Option<T>,
    {
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SummarizationError::Cancelled),
            output = self.backend.generate(model, prompt) => output,
        };

        Ok(match output {
            Ok(raw) => match validate(&raw) {
                Some(value) => Attempt::Accepted(value),
                None => Attempt::Failed(AttemptError::Validation {
                    model: model.to_string(),
                    snippet: snippet(&raw),
                }),
            },
            Err(err) => Attempt::Failed(err.into()),
        })
    }
}
