//! Error types for querying and aggregating field values.

use thiserror::Error;

/// Everything that can go wrong while processing a sponsor.
///
/// `Transport` and `HttpStatus` together form the request-error family;
/// neither is retried unless retries are configured and the failure is
/// transient (see [`QueryError::is_transient`]).
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request never produced a response (DNS, connect, timeout, TLS...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("request to {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body was not the expected `FieldValuesResponse` document.
    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    /// An enrollment bucket could not be summed.
    #[error("cannot aggregate field value '{value}': {reason}")]
    Aggregation { value: String, reason: String },

    /// The requested field is not one this tool knows how to aggregate.
    #[error("unsupported field '{0}' (expected EnrollmentCount or StudyType)")]
    UnsupportedField(String),

    /// Writing a record to the output stream failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl QueryError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            QueryError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            QueryError::HttpStatus { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
