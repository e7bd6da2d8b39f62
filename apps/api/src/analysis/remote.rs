//! Remote analysis client — delegates scoring to an external HTTP service.
//!
//! Wire format: `POST {endpoint}` with `{"cv_text", "job_description"}` and a
//! bearer token; a 200 reply carries `{"score", "feedback"}`.
//!
//! Callers never see a failure from this provider. Transport errors, timeouts,
//! non-200 statuses and malformed bodies all collapse into [`AnalysisResult`]
//! with `backend = Fallback`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::{AnalysisBackend, AnalysisProvider, AnalysisResult};

pub const FALLBACK_SCORE: i32 = 50;
pub const FALLBACK_FEEDBACK: &str = "fallback: API unavailable";
const BASE_BACKOFF_MS: u64 = 200;
const MAX_BACKOFF_MS: u64 = 5_000;

/// Delay before retry number `attempt` (1-based): doubles from
/// `BASE_BACKOFF_MS`, capped at `MAX_BACKOFF_MS`.
fn backoff_delay(attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| BASE_BACKOFF_MS.checked_mul(factor))
        .map_or(MAX_BACKOFF_MS, |ms| ms.min(MAX_BACKOFF_MS));
    Duration::from_millis(ms)
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    cv_text: &'a str,
    job_description: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    score: i32,
    feedback: String,
}

#[derive(Clone)]
pub struct RemoteSettings {
    pub endpoint: String,
    pub api_key: String,
    /// Per-request timeout; an elapsed timeout counts as a transport failure.
    pub timeout: Duration,
    /// Total attempts for transport errors, 429 and 5xx. At least one is always made.
    pub max_attempts: u32,
}

/// HTTP-backed provider. The API key is held only in memory and never logged.
#[derive(Clone)]
pub struct RemoteProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    max_attempts: u32,
}

impl RemoteProvider {
    pub fn new(settings: RemoteSettings) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint,
            api_key: settings.api_key,
            max_attempts: settings.max_attempts.max(1),
        })
    }

    /// Single analysis round-trip with retry on transport errors, 429 and 5xx.
    async fn request(
        &self,
        cv_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, RemoteError> {
        let body = AnalyzeRequest {
            cv_text,
            job_description,
        };

        let mut last_error: Option<RemoteError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "Analysis call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(RemoteError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                last_error = Some(RemoteError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if status != reqwest::StatusCode::OK {
                let message = response.text().await.unwrap_or_default();
                return Err(RemoteError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let text = response.text().await?;
            let parsed: AnalyzeResponse = serde_json::from_str(&text)?;

            debug!("Remote analysis succeeded: score={}", parsed.score);

            return Ok(AnalysisResult {
                score: parsed.score,
                feedback: parsed.feedback,
                backend: AnalysisBackend::Remote,
            });
        }

        Err(last_error.unwrap_or(RemoteError::Api {
            status: 0,
            message: "no attempt made".to_string(),
        }))
    }
}

#[async_trait]
impl AnalysisProvider for RemoteProvider {
    async fn analyze(&self, cv_text: &str, job_description: &str) -> AnalysisResult {
        match self.request(cv_text, job_description).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Remote analysis unavailable, using fallback score: {e}");
                AnalysisResult::fallback()
            }
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
