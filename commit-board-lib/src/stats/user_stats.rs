use crate::fetch::ApiError;
use core::fmt::{Display, Formatter};
use serde::Serialize;

/// How the activity numbers of a [`UserStatistics`] were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Every commit was paged through and bucketed by date.
    Detailed,

    /// Counts came from the commit search index.
    Search,

    /// Participation statistics from a sample of repositories, scaled up.
    Sampled,
}

impl Strategy {
    /// Whether the activity numbers are an extrapolation.
    #[must_use]
    pub const fn is_estimate(self) -> bool {
        matches!(self, Self::Sampled)
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Detailed => "detailed",
            Self::Search => "search",
            Self::Sampled => "sampled",
        })
    }
}

/// Normalized commit activity for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatistics {
    pub username: String,
    pub avatar_url: String,
    pub commit_count: u64,
    pub pull_request_count: u64,
    pub repository_count: u64,
    pub commits_per_day: u64,
    pub commits_per_week: u64,
    pub weekly_commits: u64,
    pub monthly_commits: u64,
    pub total_commits: u64,
    /// Mean lines added plus removed per sampled commit.
    pub average_commit_size: u64,
    pub contribution_graph_url: String,
    pub strategy: Strategy,
}

/// Why statistics could not be produced for a user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("not a valid GitHub username")]
    Validation,

    #[error("user not found")]
    NotFound,

    #[error("GitHub API rate limit exceeded, try again later")]
    RateLimited,

    #[error("GitHub API error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<ApiError> for FetchError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::QuotaExhausted { .. } | ApiError::RateLimitExceeded { .. } => Self::RateLimited,
            ApiError::NotFound => Self::NotFound,
            ApiError::Network(message) => Self::Network(message),
            e @ (ApiError::Status { .. } | ApiError::Decode(_)) => Self::Api(e.to_string()),
        }
    }
}

/// A username whose statistics could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub username: String,
    pub error: FetchError,
}

impl FetchFailure {
    #[must_use]
    pub fn new(username: impl Into<String>, error: FetchError) -> Self {
        Self {
            username: username.into(),
            error,
        }
    }

    /// User-facing description of the failure.
    #[must_use]
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl Display for FetchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.username, self.error)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_onto_fetch_errors() {
        assert_eq!(FetchError::from(ApiError::NotFound), FetchError::NotFound);
        assert_eq!(FetchError::from(ApiError::QuotaExhausted { reset_at: None }), FetchError::RateLimited);
        assert_eq!(FetchError::from(ApiError::RateLimitExceeded { attempts: 4 }), FetchError::RateLimited);
        assert_eq!(
            FetchError::from(ApiError::Network("connection refused".to_string())),
            FetchError::Network("connection refused".to_string())
        );
        assert_eq!(
            FetchError::from(ApiError::Status {
                status: 500,
                message: "boom".to_string()
            }),
            FetchError::Api("API returned HTTP 500: boom".to_string())
        );
    }

    #[test]
    fn failure_message() {
        let failure = FetchFailure::new("bad", FetchError::NotFound);
        assert_eq!(failure.message(), "user not found");
        assert_eq!(failure.to_string(), "bad: user not found");
    }

    #[test]
    fn only_sampling_is_an_estimate() {
        assert!(Strategy::Sampled.is_estimate());
        assert!(!Strategy::Search.is_estimate());
        assert!(!Strategy::Detailed.is_estimate());
    }
}
