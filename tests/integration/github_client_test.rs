//! Integration tests for the GitHub client against an in-process fake API.
//!
//! Run with: `cargo test --test github_client_test`

mod common;

use common::{spawn_fake_github, FakeUser, TOKEN};
use github_profile_analyzer::domain::{ApiCallCounter, SourceHost};
use github_profile_analyzer::infrastructure::GitHubClient;
use serde_json::json;
use std::collections::HashMap;

fn many_repos(count: usize) -> FakeUser {
    (0..count).fold(FakeUser::default(), |user, i| {
        user.with_repo(&format!("repo-{}", i), i as u64, "2020-05-01T10:00:00Z", false)
    })
}

async fn client_for(users: Vec<(&str, FakeUser)>) -> GitHubClient {
    let users: HashMap<String, FakeUser> = users
        .into_iter()
        .map(|(login, user)| (login.to_string(), user))
        .collect();
    let base_url = spawn_fake_github(users).await;
    GitHubClient::with_base_url(TOKEN.to_string(), &base_url).unwrap()
}

#[tokio::test]
async fn test_fetch_profile_sends_bearer_token() {
    let github = client_for(vec![("octocat", FakeUser::default())]).await;
    let calls = ApiCallCounter::new();

    let profile = github.fetch_profile("octocat", &calls).await.unwrap();

    // The fake answers 401 without the expected bearer token
    let profile = profile.expect("profile should be found");
    assert_eq!(profile.login, "octocat");
    assert_eq!(profile.followers, 3);
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_fetch_profile_of_unknown_user_is_none() {
    let github = client_for(vec![]).await;
    let calls = ApiCallCounter::new();

    let profile = github.fetch_profile("ghost", &calls).await.unwrap();

    assert!(profile.is_none());
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_wrong_token_reads_as_not_found() {
    let users = HashMap::from([("octocat".to_string(), FakeUser::default())]);
    let base_url = spawn_fake_github(users).await;
    let github = GitHubClient::with_base_url("wrong".to_string(), &base_url).unwrap();

    let profile = github
        .fetch_profile("octocat", &ApiCallCounter::new())
        .await
        .unwrap();

    assert!(profile.is_none());
}

#[tokio::test]
async fn test_fetch_repositories_follows_pages_until_short_page() {
    let github = client_for(vec![("octocat", many_repos(150))]).await;
    let calls = ApiCallCounter::new();

    let repos = github.fetch_repositories("octocat", &calls).await.unwrap();

    assert_eq!(repos.len(), 150);
    assert_eq!(repos[0].name, "repo-0");
    assert_eq!(repos[149].name, "repo-149");
    assert_eq!(calls.get(), 2);
}

#[tokio::test]
async fn test_fetch_repositories_counts_trailing_empty_page() {
    let github = client_for(vec![("octocat", many_repos(150))])
        .await
        .with_page_size(50);
    let calls = ApiCallCounter::new();

    let repos = github.fetch_repositories("octocat", &calls).await.unwrap();

    assert_eq!(repos.len(), 150);
    // 50 + 50 + 50 + an empty fourth page
    assert_eq!(calls.get(), 4);
}

#[tokio::test]
async fn test_oversized_page_size_still_reads_every_page() {
    let github = client_for(vec![("octocat", many_repos(150))])
        .await
        .with_page_size(200);
    let calls = ApiCallCounter::new();

    let repos = github.fetch_repositories("octocat", &calls).await.unwrap();

    assert_eq!(repos.len(), 150);
    assert_eq!(calls.get(), 2);
}

#[tokio::test]
async fn test_slash_in_login_stays_in_one_path_segment() {
    let github = client_for(vec![("octocat", many_repos(3))]).await;
    let calls = ApiCallCounter::new();

    // Without encoding this would resolve to /users/octocat/repos
    let profile = github.fetch_profile("octocat/repos", &calls).await.unwrap();

    assert!(profile.is_none());
}

#[tokio::test]
async fn test_fetch_repositories_of_user_without_repos() {
    let github = client_for(vec![("empty", FakeUser::default())]).await;
    let calls = ApiCallCounter::new();

    let repos = github.fetch_repositories("empty", &calls).await.unwrap();

    assert!(repos.is_empty());
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_fetch_repositories_of_unknown_user_fails() {
    let github = client_for(vec![]).await;

    let result = github
        .fetch_repositories("ghost", &ApiCallCounter::new())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_fetch_languages_defaults_to_empty_on_missing_repo() {
    let user = FakeUser::default()
        .with_repo("known", 1, "2020-01-01T00:00:00Z", false)
        .with_languages("known", json!({"Rust": 1200, "Shell": 30}));
    let github = client_for(vec![("octocat", user)]).await;
    let calls = ApiCallCounter::new();

    let known = github.fetch_languages("octocat", "known", &calls).await.unwrap();
    let renamed = github.fetch_languages("octocat", "renamed", &calls).await.unwrap();

    assert_eq!(known.get("Rust"), Some(&1200));
    assert_eq!(known.get("Shell"), Some(&30));
    assert!(renamed.is_empty());
    assert_eq!(calls.get(), 2);
}

#[tokio::test]
async fn test_fetch_commit_count_variants() {
    let user = FakeUser::default()
        .with_commits("busy", 342)
        .with_commits("single", 1);
    let github = client_for(vec![("octocat", user)]).await;
    let calls = ApiCallCounter::new();

    assert_eq!(github.fetch_commit_count("octocat", "busy", &calls).await.unwrap(), 342);
    assert_eq!(github.fetch_commit_count("octocat", "single", &calls).await.unwrap(), 1);
    assert_eq!(github.fetch_commit_count("octocat", "empty", &calls).await.unwrap(), 0);
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn test_unreachable_host_is_an_error() {
    // Nothing listens on the discard port
    let github = GitHubClient::with_base_url(TOKEN.to_string(), "http://127.0.0.1:9").unwrap();
    let calls = ApiCallCounter::new();

    assert!(github.fetch_profile("octocat", &calls).await.is_err());
    assert!(github.fetch_languages("octocat", "x", &calls).await.is_err());
    assert_eq!(calls.get(), 2);
}
