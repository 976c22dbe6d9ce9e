use chrono::{DateTime, Utc};

/// Classified outcome of a failed API request.
///
/// The retry executor only ever retries [`ApiError::QuotaExhausted`]; every other
/// variant is returned to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The remote reported zero remaining quota in the current window.
    #[error("API quota exhausted")]
    QuotaExhausted {
        /// When the quota window resets, if the server said so.
        reset_at: Option<DateTime<Utc>>,
    },

    /// Quota stayed exhausted through every permitted retry.
    #[error("API rate limit exceeded after {attempts} attempt(s)")]
    RateLimitExceeded { attempts: u32 },

    /// HTTP 404.
    #[error("resource not found")]
    NotFound,

    /// Any other unsuccessful HTTP status.
    #[error("API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived but its body could not be decoded.
    #[error("could not decode API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this error means the caller ran out of API quota.
    #[must_use]
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::QuotaExhausted { .. } | Self::RateLimitExceeded { .. })
    }
}
