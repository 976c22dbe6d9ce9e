//! GitHub REST API client
//!
//! Thin typed access to the endpoints the aggregator needs. Every response is
//! classified into an [`ApiError`] variant before it leaves this module, so the
//! retry executor can tell quota exhaustion apart from everything else.

use super::models::{CommitDetail, CommitSummary, Participation, RateLimitStatus, Repository, SearchCount, User};
use crate::fetch::{ApiError, Clock};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

const LOG_TARGET: &str = "    github";

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// How a non-success response should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Quota(Option<DateTime<Utc>>),
    NotFound,
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: Url,
    clock: Arc<dyn Clock>,
}

impl Client {
    /// Create a new client with an optional bearer token and base URL
    pub fn new(token: Option<&str>, base_url: &str, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        use ohno::IntoAppError;
        use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};

        let base_url = Url::parse(base_url).into_app_err_with(|| format!("invalid GitHub API URL '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(ohno::app_err!("GitHub API URL '{base_url}' cannot be used as a base URL"));
        }

        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        let _ = headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent("commit-board")
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url, clock })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn get_user(&self, username: &str) -> Result<User, ApiError> {
        self.get_json(self.endpoint(&["users", username])).await
    }

    /// Up to `per_page` repositories owned by `username`, most recently updated first.
    pub async fn list_repositories(&self, username: &str, per_page: u32) -> Result<Vec<Repository>, ApiError> {
        let mut url = self.endpoint(&["users", username, "repos"]);
        let _ = url
            .query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("per_page", &per_page.to_string());
        self.get_json(url).await
    }

    pub async fn search_commits(&self, query: &str) -> Result<SearchCount, ApiError> {
        self.search("commits", query).await
    }

    pub async fn search_issues(&self, query: &str) -> Result<SearchCount, ApiError> {
        self.search("issues", query).await
    }

    /// One page of commits authored by `author` in `owner/repo`.
    pub async fn list_commits(&self, owner: &str, repo: &str, author: &str, page: u32, per_page: u32) -> Result<Vec<CommitSummary>, ApiError> {
        let mut url = self.endpoint(&["repos", owner, repo, "commits"]);
        let _ = url
            .query_pairs_mut()
            .append_pair("author", author)
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        self.get_json(url).await
    }

    pub async fn get_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitDetail, ApiError> {
        self.get_json(self.endpoint(&["repos", owner, repo, "commits", sha])).await
    }

    /// Weekly commit counts for `owner/repo`.
    ///
    /// GitHub answers 202 while it is still computing the statistics; that is
    /// reported as an empty series.
    pub async fn participation(&self, owner: &str, repo: &str) -> Result<Participation, ApiError> {
        let url = self.endpoint(&["repos", owner, repo, "stats", "participation"]);
        let resp = self.api_call(url).await?;

        if resp.status() == StatusCode::ACCEPTED {
            log::debug!(target: LOG_TARGET, "Participation statistics for {owner}/{repo} are still being computed");
            return Ok(Participation::default());
        }

        decode(resp).await
    }

    pub async fn rate_limit(&self) -> Result<RateLimitStatus, ApiError> {
        self.get_json(self.endpoint(&["rate_limit"])).await
    }

    async fn search(&self, kind: &str, query: &str) -> Result<SearchCount, ApiError> {
        let mut url = self.endpoint(&["search", kind]);
        let _ = url.query_pairs_mut().append_pair("q", query).append_pair("per_page", "1");
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        decode(self.api_call(url).await?).await
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: Url) -> Result<reqwest::Response, ApiError> {
        log::debug!(target: LOG_TARGET, "GET {url}");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        if let Some(info) = extract_rate_limit_from_headers(resp.headers()) {
            log::trace!(target: LOG_TARGET, "{} request(s) left until {}", info.remaining, info.reset_at);
        }

        if status.is_success() {
            return Ok(resp);
        }

        match classify_failure(status, resp.headers(), self.clock.now()) {
            Failure::Quota(reset_at) => {
                log::debug!(target: LOG_TARGET, "Quota exhausted for {url} (HTTP {})", status.as_u16());
                Err(ApiError::QuotaExhausted { reset_at })
            }
            Failure::NotFound => Err(ApiError::NotFound),
            Failure::Other => {
                let body = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorBody>(&body)
                    .map(|b| b.message)
                    .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unexpected status").to_string());
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            let _ = path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
}

/// Classify an unsuccessful response.
///
/// Quota exhaustion is HTTP 429, or HTTP 403 with either zero remaining quota or
/// a `Retry-After` header. Any other 403 is an ordinary failure.
fn classify_failure(status: StatusCode, headers: &HeaderMap, now: DateTime<Utc>) -> Failure {
    let rate_limit = extract_rate_limit_from_headers(headers);
    let retry_after = extract_retry_after(headers, now);

    match status {
        StatusCode::TOO_MANY_REQUESTS => Failure::Quota(retry_after.or(rate_limit.map(|r| r.reset_at))),
        StatusCode::FORBIDDEN if retry_after.is_some() => Failure::Quota(retry_after),
        StatusCode::FORBIDDEN if rate_limit.is_some_and(|r| r.remaining == 0) => Failure::Quota(rate_limit.map(|r| r.reset_at)),
        StatusCode::NOT_FOUND => Failure::NotFound,
        _ => Failure::Other,
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<u64>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

/// Resolve a `Retry-After` header (delta seconds or HTTP date) to an instant.
fn extract_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(secs) = value.parse::<i64>() {
        return now.checked_add_signed(chrono::Duration::seconds(secs.max(0)));
    }

    DateTime::parse_from_rfc2822(value).ok().map(|d| d.with_timezone(&Utc))
}
