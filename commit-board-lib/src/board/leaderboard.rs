//! The leaderboard: accepted users, failed users, and the entry point that
//! feeds new usernames through aggregation.

use super::{NoProgress, Progress};
use crate::fetch::{BatchExecutor, Clock, DEFAULT_BATCH_SIZE};
use crate::stats::{FetchFailure, StatsSource, UserStatistics};
use core::cmp::Ordering;
use core::time::Duration;
use std::collections::HashSet;
use std::sync::Arc;

const LOG_TARGET: &str = "     board";

/// Pause between users in sequential mode.
pub const DEFAULT_REQUEST_PAUSE: Duration = Duration::from_millis(500);

/// How a list of new usernames is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddMode {
    /// One user at a time with a fixed pause in between.
    #[default]
    Sequential,

    /// Concurrent groups through the batch executor.
    Batched,
}

/// Tally of one [`Leaderboard::add_users`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddOutcome {
    pub success: usize,
    pub errors: usize,
    /// Usernames filtered out because they were already known or repeated.
    pub skipped: usize,
}

impl AddOutcome {
    /// Nothing was aggregated because every username was filtered out.
    #[must_use]
    pub const fn is_nothing_to_do(&self) -> bool {
        self.success == 0 && self.errors == 0
    }
}

/// Column to sort the leaderboard by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    Username,
    #[default]
    Commits,
    PullRequests,
    Repositories,
    PerDay,
    PerWeek,
    Weekly,
    Monthly,
    AverageSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortKey {
    fn compare(self, a: &UserStatistics, b: &UserStatistics) -> Ordering {
        let numeric = |f: fn(&UserStatistics) -> u64| f(a).cmp(&f(b));
        match self {
            Self::Username => a.username.cmp(&b.username),
            Self::Commits => numeric(|s| s.commit_count),
            Self::PullRequests => numeric(|s| s.pull_request_count),
            Self::Repositories => numeric(|s| s.repository_count),
            Self::PerDay => numeric(|s| s.commits_per_day),
            Self::PerWeek => numeric(|s| s.commits_per_week),
            Self::Weekly => numeric(|s| s.weekly_commits),
            Self::Monthly => numeric(|s| s.monthly_commits),
            Self::AverageSize => numeric(|s| s.average_commit_size),
        }
    }
}

/// Accepted and failed users, plus the machinery to add more.
#[derive(Debug)]
pub struct Leaderboard<S> {
    source: S,
    batcher: BatchExecutor,
    clock: Arc<dyn Clock>,
    progress: Arc<dyn Progress>,
    batch_size: usize,
    request_pause: Duration,
    users: Vec<UserStatistics>,
    failures: Vec<FetchFailure>,
}

impl<S: StatsSource> Leaderboard<S> {
    #[must_use]
    pub fn new(source: S, batcher: BatchExecutor, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            batcher,
            clock,
            progress: Arc::new(NoProgress),
            batch_size: DEFAULT_BATCH_SIZE,
            request_pause: DEFAULT_REQUEST_PAUSE,
            users: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn with_request_pause(mut self, request_pause: Duration) -> Self {
        self.request_pause = request_pause;
        self
    }

    #[must_use]
    pub fn users(&self) -> &[UserStatistics] {
        &self.users
    }

    #[must_use]
    pub fn failures(&self) -> &[FetchFailure] {
        &self.failures
    }

    /// Aggregate every username that isn't already on the board.
    ///
    /// Usernames already accepted or failed, and repeats within `usernames`, are
    /// skipped (exact, case-sensitive match). Resolves once every remaining
    /// username has settled.
    pub async fn add_users(&mut self, usernames: &[String], mode: AddMode) -> AddOutcome {
        let pending = self.pending(usernames);
        let mut outcome = AddOutcome {
            skipped: usernames.len() - pending.len(),
            ..AddOutcome::default()
        };

        if pending.is_empty() {
            log::info!(target: LOG_TARGET, "Nothing to do: all {} username(s) already known", usernames.len());
            return outcome;
        }

        log::info!(target: LOG_TARGET, "Adding {} user(s) in {mode:?} mode", pending.len());
        self.progress.start(pending.len() as u64);

        let results = match mode {
            AddMode::Sequential => self.fetch_sequential(&pending).await,
            AddMode::Batched => self.fetch_batched(&pending).await,
        };

        self.progress.done();

        for result in results {
            match result {
                Ok(stats) => {
                    outcome.success += 1;
                    self.users.push(stats);
                }
                Err(failure) => {
                    outcome.errors += 1;
                    self.failures.push(failure);
                }
            }
        }

        outcome
    }

    /// Drop `username`'s failure record and try it again.
    pub async fn retry_user(&mut self, username: &str) -> AddOutcome {
        self.failures.retain(|f| f.username != username);
        self.add_users(&[username.to_string()], AddMode::Sequential).await
    }

    /// Retry every failed user at once.
    pub async fn retry_failed(&mut self, mode: AddMode) -> AddOutcome {
        let usernames: Vec<String> = self.failures.drain(..).map(|f| f.username).collect();
        self.add_users(&usernames, mode).await
    }

    /// Forget a failure without retrying it. Returns whether one was found.
    pub fn dismiss_failure(&mut self, username: &str) -> bool {
        let before = self.failures.len();
        self.failures.retain(|f| f.username != username);
        self.failures.len() != before
    }

    /// Remove an accepted user. Returns whether one was found.
    pub fn remove_user(&mut self, username: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.username != username);
        self.users.len() != before
    }

    /// Accepted users ordered by `key`; ties fall back to username.
    #[must_use]
    pub fn sorted(&self, key: SortKey, order: SortOrder) -> Vec<&UserStatistics> {
        let mut users: Vec<&UserStatistics> = self.users.iter().collect();
        users.sort_by(|a, b| {
            let ordering = match order {
                SortOrder::Ascending => key.compare(a, b),
                SortOrder::Descending => key.compare(b, a),
            };
            ordering.then_with(|| a.username.cmp(&b.username))
        });
        users
    }

    fn pending(&self, usernames: &[String]) -> Vec<String> {
        let mut seen: HashSet<&str> = self
            .users
            .iter()
            .map(|u| u.username.as_str())
            .chain(self.failures.iter().map(|f| f.username.as_str()))
            .collect();

        let mut pending = Vec::new();
        for username in usernames {
            if seen.insert(username.as_str()) {
                pending.push(username.clone());
            }
        }
        pending
    }

    async fn fetch_one(&self, username: &str) -> Result<UserStatistics, FetchFailure> {
        let result = self.source.fetch_user_stats(username).await;
        if let Err(failure) = &result {
            log::warn!(target: LOG_TARGET, "Could not add '{username}': {}", failure.message());
        }
        self.progress.user_settled(username, result.is_ok());
        result
    }

    async fn fetch_sequential(&self, usernames: &[String]) -> Vec<Result<UserStatistics, FetchFailure>> {
        let mut results = Vec::with_capacity(usernames.len());
        for (index, username) in usernames.iter().enumerate() {
            if index > 0 {
                self.clock.sleep(self.request_pause).await;
            }
            results.push(self.fetch_one(username).await);
        }
        results
    }

    async fn fetch_batched(&self, usernames: &[String]) -> Vec<Result<UserStatistics, FetchFailure>> {
        let tasks: Vec<_> = usernames
            .iter()
            .map(|username| move || self.fetch_one(username))
            .collect();
        self.batcher.run_batched(tasks, self.batch_size).await
    }
}
