//! Per-user statistics aggregation
//!
//! One call to [`Aggregator::fetch_user_stats`] issues a sequence of API requests,
//! each through the retry executor under its own cache key:
//!
//! 1. Profile (fatal on failure)
//! 2. Repositories, most recently updated first (degrades to none)
//! 3. Commit activity, using one of two strategies:
//!    - few repositories: page through each repository's commits and bucket by date
//!    - many repositories: commit search, falling back to sampled participation
//!      statistics scaled up to the full repository count
//! 4. Average commit size over a small sample of commits (degrades to zero)
//! 5. Pull request count from issue search (degrades to zero)

use super::handle::is_valid_handle;
use super::{FetchError, FetchFailure, Strategy, UserStatistics};
use crate::fetch::{ApiError, Clock, RetryExecutor};
use crate::github::{Client, CommitDetail, CommitSummary, Participation, Repository, SearchCount, User};
use chrono::{DateTime, TimeDelta, Utc};
use core::cmp::Reverse;
use core::time::Duration;
use futures_util::future::join_all;
use std::sync::Arc;

const LOG_TARGET: &str = "     stats";
const REPOS_PER_PAGE: u32 = 100;
const COMMITS_PER_PAGE: u32 = 100;
const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;
const WEEKS_PER_MONTH: usize = 4;

pub const DEFAULT_GRAPH_URL_TEMPLATE: &str = "https://ghchart.rshah.org/{username}";

/// Anything that can turn a username into statistics.
pub trait StatsSource: Send + Sync {
    fn fetch_user_stats(&self, username: &str) -> impl Future<Output = Result<UserStatistics, FetchFailure>> + Send;
}

/// Cache lifetimes for each kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub profile: Duration,
    pub repositories: Duration,
    pub commits: Duration,
    pub search: Duration,
    pub participation: Duration,
    pub commit_detail: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            profile: Duration::from_mins(10),
            repositories: Duration::from_mins(10),
            commits: Duration::from_mins(5),
            search: Duration::from_mins(5),
            participation: Duration::from_mins(30),
            commit_detail: Duration::from_hours(1),
        }
    }
}

/// Tuning knobs for [`Aggregator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Users with at most this many repositories get the detailed strategy.
    ///
    /// Compared against the larger of the profile's public repository count and
    /// the number of repositories listed.
    pub detailed_repo_threshold: usize,
    /// Pages of commits read per repository in the detailed strategy.
    pub max_commit_pages: u32,
    /// Repositories sampled for participation statistics.
    pub participation_sample: usize,
    pub sample_commit_sizes: bool,
    pub size_sample_repos: usize,
    pub size_sample_commits: u32,
    /// Contribution graph URL with a `{username}` placeholder.
    pub graph_url_template: String,
    pub ttls: CacheTtls,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            detailed_repo_threshold: 5,
            max_commit_pages: 5,
            participation_sample: 10,
            sample_commit_sizes: true,
            size_sample_repos: 4,
            size_sample_commits: 10,
            graph_url_template: DEFAULT_GRAPH_URL_TEMPLATE.to_string(),
            ttls: CacheTtls::default(),
        }
    }
}

/// Commit counts over the three reporting windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Activity {
    weekly: u64,
    monthly: u64,
    total: u64,
}

impl Activity {
    fn add(&mut self, other: Self) {
        self.weekly = self.weekly.saturating_add(other.weekly);
        self.monthly = self.monthly.saturating_add(other.monthly);
        self.total = self.total.saturating_add(other.total);
    }

    /// Scale every window by `numerator / denominator`, rounding to nearest.
    fn scaled(self, numerator: u64, denominator: u64) -> Self {
        Self {
            weekly: scale(self.weekly, numerator, denominator),
            monthly: scale(self.monthly, numerator, denominator),
            total: scale(self.total, numerator, denominator),
        }
    }
}

const fn scale(value: u64, numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    value.saturating_mul(numerator).saturating_add(denominator / 2) / denominator
}

/// `value / divisor` rounded half up.
const fn rounded_div(value: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    value.saturating_add(divisor / 2) / divisor
}

const fn commits_per_day(monthly: u64) -> u64 {
    rounded_div(monthly, 30)
}

const fn commits_per_week(monthly: u64) -> u64 {
    rounded_div(monthly.saturating_mul(7), 30)
}

/// Bucket dated commits into windows ending at `now`.
fn bucket_commits(commits: &[CommitSummary], now: DateTime<Utc>) -> Activity {
    let week_start = now - TimeDelta::days(WEEK_DAYS);
    let month_start = now - TimeDelta::days(MONTH_DAYS);

    let mut activity = Activity {
        total: commits.len() as u64,
        ..Activity::default()
    };

    for date in commits.iter().filter_map(CommitSummary::authored_at) {
        if date >= week_start {
            activity.weekly += 1;
        }
        if date >= month_start {
            activity.monthly += 1;
        }
    }

    activity
}

fn participation_activity(participation: &Participation) -> Activity {
    Activity {
        weekly: participation.owner_recent(1),
        monthly: participation.owner_recent(WEEKS_PER_MONTH),
        total: participation.owner_total(),
    }
}

/// Mean changed lines over commits that changed anything.
fn average_size(details: &[CommitDetail]) -> u64 {
    let sizes: Vec<u64> = details.iter().map(CommitDetail::changed_lines).filter(|&n| n > 0).collect();
    rounded_div(sizes.iter().sum(), sizes.len() as u64)
}

/// Most recently pushed first; repositories never pushed go last.
fn sort_by_activity(repos: &mut [Repository]) {
    repos.sort_by_key(|r| Reverse(r.pushed_at.or(r.updated_at)));
}

/// Builds [`UserStatistics`] from the GitHub API.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: Client,
    retry: RetryExecutor,
    clock: Arc<dyn Clock>,
    settings: AggregatorSettings,
}

impl Aggregator {
    #[must_use]
    pub fn new(client: Client, retry: RetryExecutor, clock: Arc<dyn Clock>, settings: AggregatorSettings) -> Self {
        Self {
            client,
            retry,
            clock,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    #[must_use]
    pub const fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// Fetch statistics for `username`.
    ///
    /// Only an invalid handle or a failed profile lookup is fatal; every later
    /// step falls back to a default.
    pub async fn fetch_user_stats(&self, username: &str) -> Result<UserStatistics, FetchFailure> {
        if !is_valid_handle(username) {
            log::debug!(target: LOG_TARGET, "Rejecting invalid username '{username}'");
            return Err(FetchFailure::new(username, FetchError::Validation));
        }

        log::info!(target: LOG_TARGET, "Fetching statistics for '{username}'");

        let profile = self.profile(username).await.map_err(|e| {
            let failure = FetchFailure::new(username, FetchError::from(e));
            log::warn!(target: LOG_TARGET, "Could not fetch profile for '{username}': {}", failure.error);
            failure
        })?;

        let mut repos = self.repositories(username).await;
        sort_by_activity(&mut repos);
        let repository_count = profile.public_repos.max(repos.len() as u64);

        let (activity, strategy) = if repository_count <= self.settings.detailed_repo_threshold as u64 {
            (self.detailed_activity(username, &repos).await, Strategy::Detailed)
        } else {
            self.efficient_activity(username, &repos, repository_count).await
        };

        let average_commit_size = if self.settings.sample_commit_sizes {
            self.average_commit_size(username, &repos).await
        } else {
            0
        };

        let pull_request_count = self.pull_request_count(username).await;

        log::debug!(
            target: LOG_TARGET,
            "'{username}': {} total, {} monthly, {} weekly commit(s) via {strategy} strategy",
            activity.total,
            activity.monthly,
            activity.weekly
        );

        Ok(UserStatistics {
            username: username.to_string(),
            avatar_url: profile.avatar_url,
            commit_count: activity.total,
            pull_request_count,
            repository_count,
            commits_per_day: commits_per_day(activity.monthly),
            commits_per_week: commits_per_week(activity.monthly),
            weekly_commits: activity.weekly,
            monthly_commits: activity.monthly,
            total_commits: activity.total,
            average_commit_size,
            contribution_graph_url: self.settings.graph_url_template.replace("{username}", username),
            strategy,
        })
    }

    async fn profile(&self, username: &str) -> Result<User, ApiError> {
        let key = format!("user:{username}");
        self.retry
            .execute_cached(&key, self.settings.ttls.profile, || self.client.get_user(username))
            .await
    }

    async fn repositories(&self, username: &str) -> Vec<Repository> {
        let key = format!("repos:{username}:{REPOS_PER_PAGE}");
        self.retry
            .execute_cached(&key, self.settings.ttls.repositories, || {
                self.client.list_repositories(username, REPOS_PER_PAGE)
            })
            .await
            .unwrap_or_else(|e| {
                log::warn!(target: LOG_TARGET, "Could not list repositories for '{username}', assuming none: {e}");
                Vec::new()
            })
    }

    async fn commits_page(&self, username: &str, repo: &Repository, page: u32, per_page: u32) -> Result<Vec<CommitSummary>, ApiError> {
        let owner = repo.owner.login.as_str();
        let name = repo.name.as_str();
        let key = format!("commits:{owner}/{name}:{username}:{per_page}:{page}");
        self.retry
            .execute_cached(&key, self.settings.ttls.commits, || {
                self.client.list_commits(owner, name, username, page, per_page)
            })
            .await
    }

    /// All of `username`'s commits in one repository, up to the page cap.
    async fn repository_commits(&self, username: &str, repo: &Repository) -> Result<Vec<CommitSummary>, ApiError> {
        let mut commits = Vec::new();

        for page in 1..=self.settings.max_commit_pages {
            let batch = self.commits_page(username, repo, page, COMMITS_PER_PAGE).await?;
            let last_page = batch.len() < COMMITS_PER_PAGE as usize;
            commits.extend(batch);
            if last_page {
                break;
            }
        }

        Ok(commits)
    }

    async fn detailed_activity(&self, username: &str, repos: &[Repository]) -> Activity {
        let now = self.clock.now();
        let results = join_all(repos.iter().map(|repo| self.repository_commits(username, repo))).await;

        let mut activity = Activity::default();
        for (repo, result) in repos.iter().zip(results) {
            match result {
                Ok(commits) => activity.add(bucket_commits(&commits, now)),
                Err(e) => log::warn!(
                    target: LOG_TARGET,
                    "Could not list commits in {}/{} for '{username}': {e}",
                    repo.owner.login,
                    repo.name
                ),
            }
        }

        activity
    }

    async fn search_commit_count(&self, query: &str) -> Result<u64, ApiError> {
        let key = format!("search-commits:{query}");
        let result: SearchCount = self
            .retry
            .execute_cached(&key, self.settings.ttls.search, || self.client.search_commits(query))
            .await?;
        Ok(result.total_count)
    }

    async fn searched_activity(&self, username: &str) -> Result<Activity, ApiError> {
        let now = self.clock.now();
        let since = |days: i64| (now - TimeDelta::days(days)).format("%Y-%m-%d").to_string();

        let total = self.search_commit_count(&format!("author:{username}")).await?;
        let monthly = self
            .search_commit_count(&format!("author:{username} author-date:>={}", since(MONTH_DAYS)))
            .await?;
        let weekly = self
            .search_commit_count(&format!("author:{username} author-date:>={}", since(WEEK_DAYS)))
            .await?;

        Ok(Activity { weekly, monthly, total })
    }

    async fn efficient_activity(&self, username: &str, repos: &[Repository], repository_count: u64) -> (Activity, Strategy) {
        match self.searched_activity(username).await {
            Ok(activity) => return (activity, Strategy::Search),
            Err(e) => log::warn!(
                target: LOG_TARGET,
                "Commit search failed for '{username}', sampling participation statistics instead: {e}"
            ),
        }

        let mut sampled = Activity::default();
        let mut sample_size = 0u64;

        for repo in repos.iter().take(self.settings.participation_sample) {
            let owner = repo.owner.login.as_str();
            let name = repo.name.as_str();
            let key = format!("participation:{owner}/{name}");
            let result = self
                .retry
                .execute_cached(&key, self.settings.ttls.participation, || self.client.participation(owner, name))
                .await;

            match result {
                Ok(participation) if !participation.owner.is_empty() => {
                    sampled.add(participation_activity(&participation));
                    sample_size += 1;
                }
                Ok(_) => log::debug!(target: LOG_TARGET, "No participation statistics yet for {owner}/{name}"),
                Err(e) => log::debug!(target: LOG_TARGET, "Could not fetch participation for {owner}/{name}: {e}"),
            }
        }

        log::debug!(
            target: LOG_TARGET,
            "Extrapolating '{username}' from {sample_size} sampled repositories to {repository_count}"
        );

        (sampled.scaled(repository_count, sample_size), Strategy::Sampled)
    }

    async fn average_commit_size(&self, username: &str, repos: &[Repository]) -> u64 {
        let mut details = Vec::new();

        for repo in repos.iter().take(self.settings.size_sample_repos) {
            let Ok(commits) = self.commits_page(username, repo, 1, self.settings.size_sample_commits).await else {
                continue;
            };

            let owner = repo.owner.login.as_str();
            let name = repo.name.as_str();
            for commit in commits.iter().take(self.settings.size_sample_commits as usize) {
                let sha = commit.sha.as_str();
                let key = format!("commit:{owner}/{name}:{sha}");
                if let Ok(detail) = self
                    .retry
                    .execute_cached(&key, self.settings.ttls.commit_detail, || self.client.get_commit(owner, name, sha))
                    .await
                {
                    details.push(detail);
                }
            }
        }

        average_size(&details)
    }

    async fn pull_request_count(&self, username: &str) -> u64 {
        let query = format!("author:{username} type:pr");
        let key = format!("search-issues:{query}");
        self.retry
            .execute_cached(&key, self.settings.ttls.search, || self.client.search_issues(&query))
            .await
            .map_or_else(
                |e| {
                    log::debug!(target: LOG_TARGET, "Could not count pull requests for '{username}': {e}");
                    0
                },
                |result: SearchCount| result.total_count,
            )
    }
}

impl StatsSource for Aggregator {
    fn fetch_user_stats(&self, username: &str) -> impl Future<Output = Result<UserStatistics, FetchFailure>> + Send {
        Self::fetch_user_stats(self, username)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::github::{CommitInfo, CommitSignature, CommitStats, RepositoryOwner};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_704_067_200, 0).unwrap()
    }

    fn commit_at(days_ago: i64) -> CommitSummary {
        CommitSummary {
            sha: format!("sha{days_ago}"),
            commit: CommitInfo {
                author: Some(CommitSignature {
                    date: Some(now() - TimeDelta::days(days_ago)),
                }),
                committer: None,
            },
        }
    }

    fn repo(name: &str, pushed_days_ago: Option<i64>) -> Repository {
        Repository {
            name: name.to_string(),
            owner: RepositoryOwner { login: "octo".to_string() },
            pushed_at: pushed_days_ago.map(|d| now() - TimeDelta::days(d)),
            updated_at: None,
        }
    }

    fn detail(additions: u64, deletions: u64) -> CommitDetail {
        CommitDetail {
            sha: "x".to_string(),
            stats: Some(CommitStats { additions, deletions }),
        }
    }

    #[test]
    fn buckets_by_commit_date() {
        let commits = [commit_at(0), commit_at(3), commit_at(7), commit_at(8), commit_at(30), commit_at(31), commit_at(400)];

        let activity = bucket_commits(&commits, now());

        assert_eq!(activity, Activity { weekly: 3, monthly: 5, total: 7 });
    }

    #[test]
    fn undated_commits_count_only_toward_total() {
        let mut undated = commit_at(0);
        undated.commit.author = None;

        let activity = bucket_commits(&[undated], now());

        assert_eq!(activity, Activity { weekly: 0, monthly: 0, total: 1 });
    }

    #[test]
    fn per_day_and_per_week_rates() {
        assert_eq!(commits_per_day(0), 0);
        assert_eq!(commits_per_day(14), 0);
        assert_eq!(commits_per_day(15), 1);
        assert_eq!(commits_per_day(90), 3);
        assert_eq!(commits_per_week(30), 7);
        assert_eq!(commits_per_week(10), 2);
        assert_eq!(commits_per_week(2), 0);
    }

    #[test]
    fn scaling_extrapolates_linearly() {
        let sample = Activity { weekly: 3, monthly: 10, total: 100 };

        assert_eq!(sample.scaled(40, 10), Activity { weekly: 12, monthly: 40, total: 400 });
        assert_eq!(sample.scaled(15, 10), Activity { weekly: 5, monthly: 15, total: 150 });
        assert_eq!(sample.scaled(40, 0), Activity::default());
    }

    #[test]
    fn average_size_skips_empty_commits() {
        let details = [detail(10, 5), detail(0, 0), detail(3, 2), CommitDetail { sha: "y".to_string(), stats: None }];
        assert_eq!(average_size(&details), 10);
    }

    #[test]
    fn average_size_of_nothing_is_zero() {
        assert_eq!(average_size(&[]), 0);
        assert_eq!(average_size(&[detail(0, 0)]), 0);
    }

    #[test]
    fn participation_windows_use_owner_series() {
        let mut owner = vec![1u64; 52];
        owner[51] = 5;
        let participation = Participation { all: vec![100; 52], owner };

        assert_eq!(participation_activity(&participation), Activity { weekly: 5, monthly: 8, total: 56 });
    }

    #[test]
    fn sorts_most_recently_pushed_first() {
        let mut repos = vec![repo("old", Some(100)), repo("never", None), repo("new", Some(1)), repo("mid", Some(10))];

        sort_by_activity(&mut repos);

        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid", "old", "never"]);
    }
}
