//! End-to-end tests: usernames in, leaderboard out, against a wiremock GitHub API

use camino::Utf8PathBuf;
use chrono::DateTime;
use commit_board_lib::board::{
    AddMode, AddOutcome, DEFAULT_REQUEST_PAUSE, Leaderboard, NoticeLevel, SortKey, SortOrder, summary_notice,
};
use commit_board_lib::fetch::{BatchExecutor, Cache, Clock, DEFAULT_BATCH_PAUSE, ManualClock, RetryExecutor, RetryPolicy};
use commit_board_lib::github::Client;
use commit_board_lib::input::read_usernames;
use commit_board_lib::stats::{Aggregator, AggregatorSettings, FetchError};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap()))
}

fn leaderboard(server: &MockServer, clock: &Arc<ManualClock>) -> Leaderboard<Aggregator> {
    let clock: Arc<dyn Clock> = Arc::clone(clock) as Arc<dyn Clock>;
    let client = Client::new(Some("test-token"), &server.uri(), Arc::clone(&clock)).unwrap();
    let retry = RetryExecutor::new(Cache::new(Arc::clone(&clock)), Arc::clone(&clock), RetryPolicy::default());
    let batcher = BatchExecutor::new(retry.clone(), Arc::clone(&clock), DEFAULT_BATCH_PAUSE);
    let settings = AggregatorSettings {
        sample_commit_sizes: false,
        ..AggregatorSettings::default()
    };
    let aggregator = Aggregator::new(client, retry, Arc::clone(&clock), settings);

    Leaderboard::new(aggregator, batcher, clock).with_batch_size(2)
}

async fn mount_user(server: &MockServer, login: &str, public_repos: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{login}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": login,
            "avatar_url": format!("https://avatars.example.com/{login}"),
            "public_repos": public_repos,
        })))
        .mount(server)
        .await;
}

async fn profile_requests(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.starts_with("/users/") && p.matches('/').count() == 2)
        .collect()
}

#[tokio::test]
async fn test_partial_failure_is_tallied() {
    let server = MockServer::start().await;
    mount_user(&server, "good", 3).await;
    Mock::given(method("GET"))
        .and(path("/users/bad"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let clock = clock();
    let mut board = leaderboard(&server, &clock);

    let outcome = board.add_users(&["good".to_string(), "bad".to_string()], AddMode::Sequential).await;

    assert_eq!(outcome, AddOutcome { success: 1, errors: 1, skipped: 0 });
    assert_eq!(board.users().len(), 1);
    assert_eq!(board.users()[0].username, "good");
    assert_eq!(board.users()[0].repository_count, 3);
    assert_eq!(board.failures().len(), 1);
    assert_eq!(board.failures()[0].username, "bad");
    assert_eq!(board.failures()[0].error, FetchError::NotFound);
    assert_eq!(board.failures()[0].message(), "user not found");

    let notice = summary_notice(&outcome);
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.message, "Added 1 user(s), 1 could not be added");
}

#[tokio::test]
async fn test_csv_import_end_to_end() {
    let server = MockServer::start().await;
    mount_user(&server, "bob", 0).await;
    mount_user(&server, "carol", 0).await;

    let tmp = tempfile::tempdir().unwrap();
    let csv_path = Utf8PathBuf::try_from(tmp.path().join("users.csv")).unwrap();
    fs::write(&csv_path, "username\nbob\n123invalid_\ncarol\n").unwrap();

    let import = read_usernames(&csv_path).unwrap();
    assert_eq!(import.usernames, ["bob", "carol"]);
    assert_eq!(
        import.warning().as_deref(),
        Some("1 rows contain invalid GitHub usernames and were skipped")
    );

    let clock = clock();
    let mut board = leaderboard(&server, &clock);
    let outcome = board.add_users(&import.usernames, AddMode::Batched).await;

    assert_eq!(outcome, AddOutcome { success: 2, errors: 0, skipped: 0 });

    let mut profiles = profile_requests(&server).await;
    profiles.sort();
    assert_eq!(profiles, ["/users/bob", "/users/carol"]);
}

#[tokio::test]
async fn test_known_usernames_are_not_fetched_again() {
    let server = MockServer::start().await;
    mount_user(&server, "octocat", 1).await;

    let clock = clock();
    let mut board = leaderboard(&server, &clock);

    let first = board.add_users(&["octocat".to_string(), "octocat".to_string()], AddMode::Sequential).await;
    assert_eq!(first, AddOutcome { success: 1, errors: 0, skipped: 1 });

    let second = board.add_users(&["octocat".to_string()], AddMode::Batched).await;
    assert!(second.is_nothing_to_do());
    assert_eq!(summary_notice(&second).level, NoticeLevel::Info);

    assert_eq!(profile_requests(&server).await.len(), 1);
}

#[tokio::test]
async fn test_sequential_mode_pauses_between_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/users/[a-z]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "someone",
            "avatar_url": "https://avatars.example.com/someone",
        })))
        .mount(&server)
        .await;

    let clock = clock();
    let mut board = leaderboard(&server, &clock);
    let usernames: Vec<String> = ["ann", "ben", "cat"].into_iter().map(String::from).collect();

    let outcome = board.add_users(&usernames, AddMode::Sequential).await;

    assert_eq!(outcome.success, 3);
    let pauses = clock.sleeps().into_iter().filter(|d| *d == DEFAULT_REQUEST_PAUSE).count();
    assert_eq!(pauses, 2);
}

#[tokio::test]
async fn test_retry_recovers_a_failed_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/flaky"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "message": "Bad Gateway" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_user(&server, "flaky", 2).await;

    let clock = clock();
    let mut board = leaderboard(&server, &clock);

    let first = board.add_users(&["flaky".to_string()], AddMode::Sequential).await;
    assert_eq!(first, AddOutcome { success: 0, errors: 1, skipped: 0 });
    assert!(matches!(board.failures()[0].error, FetchError::Api(_)));

    let retried = board.retry_user("flaky").await;
    assert_eq!(retried, AddOutcome { success: 1, errors: 0, skipped: 0 });
    assert!(board.failures().is_empty());

    let sorted = board.sorted(SortKey::Repositories, SortOrder::Descending);
    assert_eq!(sorted[0].username, "flaky");
}
