//! Wire models for the subset of the GitHub REST API we consume.
//!
//! Only the fields we need are declared. Everything is `Serialize` as well as
//! `Deserialize` so responses can be stored in the response cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET /users/{username}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub avatar_url: String,
    #[serde(default)]
    pub public_repos: u64,
}

/// An element of `GET /users/{username}/repos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// An element of `GET /repos/{owner}/{repo}/commits`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    #[serde(default)]
    pub author: Option<CommitSignature>,
    #[serde(default)]
    pub committer: Option<CommitSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSignature {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl CommitSummary {
    /// Author date, falling back to the committer date.
    #[must_use]
    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit
            .author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| self.commit.committer.as_ref().and_then(|c| c.date))
    }
}

/// `GET /repos/{owner}/{repo}/commits/{sha}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    #[serde(default)]
    pub stats: Option<CommitStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

impl CommitDetail {
    /// Lines added plus lines removed, or zero when GitHub reported nothing.
    #[must_use]
    pub fn changed_lines(&self) -> u64 {
        self.stats.map_or(0, |s| s.additions.saturating_add(s.deletions))
    }
}

/// The part of a `/search/*` response we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCount {
    pub total_count: u64,
}

/// `GET /repos/{owner}/{repo}/stats/participation`
///
/// Weekly commit counts for the last 52 weeks, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participation {
    #[serde(default)]
    pub all: Vec<u64>,
    #[serde(default)]
    pub owner: Vec<u64>,
}

impl Participation {
    /// Commits by the owner in the most recent `weeks` weeks.
    #[must_use]
    pub fn owner_recent(&self, weeks: usize) -> u64 {
        self.owner.iter().rev().take(weeks).sum()
    }

    /// Commits by the owner over the whole series.
    #[must_use]
    pub fn owner_total(&self) -> u64 {
        self.owner.iter().sum()
    }
}

/// `GET /rate_limit`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitWindow,
    #[serde(default)]
    pub search: Option<RateLimitWindow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub limit: u64,
    pub remaining: u64,
    /// Unix timestamp of the next window reset.
    pub reset: i64,
    #[serde(default)]
    pub used: u64,
}

impl RateLimitWindow {
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }
}
