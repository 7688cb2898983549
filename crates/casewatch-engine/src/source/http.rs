//! HTTP snapshot source with retry and exponential backoff.

use super::extract::extract_case_page;
use super::SnapshotSource;
use crate::config::HttpSettings;
use async_trait::async_trait;
use casewatch_core::errors::{ExError, ExErrorKind};
use casewatch_core::{RecordId, Snapshot};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches case pages over HTTP.
///
/// Network errors, 5xx and 429 responses are retried up to `max_retries`
/// times; attempt `n` (0-based) is followed by a `backoff * 2^n` pause. Any
/// other non-success status fails immediately.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpSource {
    /// # Errors
    ///
    /// Returns `ExErrorKind::Config` for header values that are not valid
    /// HTTP or when the client cannot be built.
    pub fn new(settings: &HttpSettings) -> Result<Self, ExError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language).map_err(|e| {
                client_error(format!("http.accept_language is not a valid header: {}", e))
            })?,
        );

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| client_error(e.to_string()))?;

        Ok(Self {
            client,
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.backoff_ms),
        })
    }

    /// GET `url` and return the decoded body.
    ///
    /// # Errors
    ///
    /// - `Fetch` for a non-retryable status or exhausted retries
    /// - `Timeout` when the last attempt timed out
    pub async fn fetch_page(&self, url: &str) -> Result<String, ExError> {
        let mut attempt = 0;
        loop {
            tracing::debug!(url, attempt, "http request");
            let err = match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.text().await.map_err(|e| {
                        fetch_error(url, format!("failed to read response body: {}", e))
                    });
                }
                Ok(response) => {
                    let status = response.status();
                    let err = fetch_error(url, format!("HTTP status {}", status));
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    err
                }
                Err(e) if e.is_timeout() => ExError::new(ExErrorKind::Timeout)
                    .with_op("http_fetch")
                    .with_record_id(url)
                    .with_message(e.to_string()),
                Err(e) => fetch_error(url, e.to_string()),
            };

            if attempt >= self.max_retries {
                let message = format!("{} (after {} attempts)", err.message(), attempt + 1);
                return Err(err.with_message(message));
            }
            let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
            tracing::warn!(url, attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self, record_id: &RecordId) -> Result<Snapshot, ExError> {
        let html = self.fetch_page(record_id.as_str()).await?;
        extract_case_page(&html, record_id.as_str(), Utc::now())
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn fetch_error(url: &str, message: String) -> ExError {
    ExError::new(ExErrorKind::Fetch)
        .with_op("http_fetch")
        .with_record_id(url)
        .with_message(message)
}

fn client_error(message: String) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("http_client")
        .with_message(message)
}
