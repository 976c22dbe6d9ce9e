use crate::stats::UserStatistics;

/// A numeric leaderboard column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub key: &'static str,
    pub value: fn(&UserStatistics) -> u64,
}

pub const COLUMNS: &[Column] = &[
    Column {
        header: "Commits",
        key: "commit_count",
        value: |s| s.commit_count,
    },
    Column {
        header: "PRs",
        key: "pull_request_count",
        value: |s| s.pull_request_count,
    },
    Column {
        header: "Repos",
        key: "repository_count",
        value: |s| s.repository_count,
    },
    Column {
        header: "Per day",
        key: "commits_per_day",
        value: |s| s.commits_per_day,
    },
    Column {
        header: "Per week",
        key: "commits_per_week",
        value: |s| s.commits_per_week,
    },
    Column {
        header: "Last 7d",
        key: "weekly_commits",
        value: |s| s.weekly_commits,
    },
    Column {
        header: "Last 30d",
        key: "monthly_commits",
        value: |s| s.monthly_commits,
    },
    Column {
        header: "Avg size",
        key: "average_commit_size",
        value: |s| s.average_commit_size,
    },
];

pub fn profile_url(username: &str) -> String {
    format!("https://github.com/{username}")
}

#[cfg(test)]
pub fn test_users() -> Vec<UserStatistics> {
    use crate::stats::Strategy;

    vec![
        UserStatistics {
            username: "octocat".to_string(),
            avatar_url: "https://avatars.example.com/u/1".to_string(),
            commit_count: 1200,
            pull_request_count: 85,
            repository_count: 8,
            commits_per_day: 2,
            commits_per_week: 14,
            weekly_commits: 12,
            monthly_commits: 60,
            total_commits: 1200,
            average_commit_size: 42,
            contribution_graph_url: "https://ghchart.rshah.org/octocat".to_string(),
            strategy: Strategy::Search,
        },
        UserStatistics {
            username: "hubot".to_string(),
            avatar_url: "https://avatars.example.com/u/2".to_string(),
            commit_count: 30,
            pull_request_count: 0,
            repository_count: 40,
            commits_per_day: 0,
            commits_per_week: 1,
            weekly_commits: 0,
            monthly_commits: 4,
            total_commits: 30,
            average_commit_size: 0,
            contribution_graph_url: "https://ghchart.rshah.org/hubot".to_string(),
            strategy: Strategy::Sampled,
        },
    ]
}
