//! HTTP client for the clinicaltrials.gov field-values endpoint.
//!
//! One GET per sponsor, `fmt=json`. Transient failures can optionally be
//! retried with exponential backoff; by default every request is attempted
//! exactly once.

use crate::error::{QueryError, Result};
use crate::models::{Field, FieldValueEntry};
use crate::query::FilterExpression;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default location of the legacy field-values API.
pub const DEFAULT_BASE_URL: &str = "https://www.clinicaltrials.gov/api/query/field_values";

/// Connection settings for [`FieldValuesClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Extra attempts after the first one, for transient failures only.
    pub retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub retry_backoff_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

/// Anything that can answer a field-values query.
///
/// The aggregator only depends on this trait, so tests can substitute a
/// canned histogram for the network.
#[allow(async_fn_in_trait)]
pub trait FieldValuesSource {
    async fn fetch_field_values(
        &self,
        expression: &FilterExpression,
        field: Field,
    ) -> Result<Vec<FieldValueEntry>>;
}

/// reqwest-backed [`FieldValuesSource`].
pub struct FieldValuesClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl FieldValuesClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("ctgov-query/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| QueryError::Transport {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    #[cfg(test)]
    fn with_http_client(config: ClientConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Full request URL for one expression and field.
    pub fn request_url(&self, expression: &FilterExpression, field: Field) -> String {
        format!(
            "{}?expr={}&field={}&fmt=json",
            self.config.base_url,
            expression.percent_encoded(),
            field.api_name()
        )
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<FieldValueEntry>> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| QueryError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| QueryError::Transport {
            url: url.to_string(),
            source,
        })?;

        parse_field_values(&body)
    }
}

impl FieldValuesSource for FieldValuesClient {
    async fn fetch_field_values(
        &self,
        expression: &FilterExpression,
        field: Field,
    ) -> Result<Vec<FieldValueEntry>> {
        let url = self.request_url(expression, field);
        debug!("GET {}", url);

        let mut attempt = 0;
        loop {
            match self.fetch_once(&url).await {
                Err(e) if e.is_transient() && attempt < self.config.retries => {
                    let delay = backoff_delay(self.config.retry_backoff_ms, attempt);
                    attempt += 1;
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {}ms",
                        attempt,
                        self.config.retries.saturating_add(1),
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

/// Delay before retry number `attempt` (zero-based).
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(1_u64 << attempt.min(16)))
}

/// Extract `FieldValuesResponse.FieldValues` from a response body.
pub fn parse_field_values(body: &str) -> Result<Vec<FieldValueEntry>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| QueryError::ResponseFormat(format!("body is not valid JSON: {}", e)))?;

    let values = document
        .get("FieldValuesResponse")
        .ok_or_else(|| QueryError::ResponseFormat("missing 'FieldValuesResponse'".to_string()))?
        .get("FieldValues")
        .ok_or_else(|| {
            QueryError::ResponseFormat("missing 'FieldValuesResponse.FieldValues'".to_string())
        })?;

    Vec::<FieldValueEntry>::deserialize(values)
        .map_err(|e| QueryError::ResponseFormat(format!("malformed 'FieldValues': {}", e)))
}
