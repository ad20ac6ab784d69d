//! Generative backend seam and the Gemini REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::GeminiConfig;

/// Timeout for a single generateContent call
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Connection, DNS, TLS or timeout failure before a response arrived
    #[error("fetch failed: {0}")]
    Transport(String),
    /// Non-success HTTP status with the provider's message
    #[error("[{status}] {message}")]
    Status {
        status: u16,
        message: String,
        /// Wait suggested by a RetryInfo detail, if any
        retry_delay: Option<Duration>,
    },
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
    #[error("model {model} returned no text")]
    EmptyResponse { model: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::MalformedResponse(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// One text-in, text-out call against a named model.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError>;
}

#[async_trait]
impl<T: GenerativeBackend + ?Sized> GenerativeBackend for std::sync::Arc<T> {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        (**self).generate(model, prompt).await
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "retryDelay")]
    retry_delay: Option<String>,
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(GENERATE_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse {
                model: model.to_string(),
            });
        }
        Ok(text)
    }
}

/// Build a `Status` error from an HTTP failure, keeping the provider's
/// message and any RetryInfo delay.
fn status_error(status: reqwest::StatusCode, body: &str) -> BackendError {
    let reason = status.canonical_reason().unwrap_or("");
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let retry_delay = envelope
                .error
                .details
                .iter()
                .filter_map(|d| d.retry_delay.as_deref())
                .find_map(crate::retry::parse_duration_secs);
            let code = envelope.error.status.unwrap_or_default();
            BackendError::Status {
                status: status.as_u16(),
                message: format!("{reason} {code}: {}", envelope.error.message)
                    .trim()
                    .to_string(),
                retry_delay,
            }
        }
        Err(_) => BackendError::Status {
            status: status.as_u16(),
            message: format!("{reason}: {}", body.trim()),
            retry_delay: None,
        },
    }
}
