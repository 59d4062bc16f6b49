use thiserror::Error;

/// Failures talking to the provider API. Retryable kinds are retried with
/// backoff by the client before they ever reach the pipeline.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("received failure status: {0}")]
    Status(u16),
    #[error("could not decode response body: {0}")]
    InvalidPayload(String),
}

impl UpstreamError {
    /// Timeouts, transport errors, rate limits and server errors are worth
    /// retrying; other client errors and undecodable payloads are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Timeout(_) | UpstreamError::Request(_) => true,
            UpstreamError::Status(status) => *status == 429 || *status >= 500,
            UpstreamError::InvalidPayload(_) => false,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout(e.to_string())
        } else {
            UpstreamError::Request(e.to_string())
        }
    }
}

/// A single event that cannot be normalized. These are logged and skipped
/// at the normalization boundary; they never fail a run.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("event is missing required field {0}")]
    MissingField(&'static str),
    #[error("could not parse sent_time {0:?}")]
    InvalidTimestamp(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// The only errors that escape `Pipeline::run_fetch`. Upstream and
/// per-campaign failures are folded into the run's log entry instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("a fetch run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
}
