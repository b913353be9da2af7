//! Shared fixtures: an in-process fake of the GitHub REST API and an
//! in-memory cache.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use github_profile_analyzer::domain::CacheRepository;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "test-token";

/// One fake account: its repositories and per-repository sub-resources.
#[derive(Clone, Default)]
pub struct FakeUser {
    pub repos: Vec<Value>,
    /// Missing entry → 404 from the languages endpoint
    pub languages: HashMap<String, Value>,
    /// Repositories whose languages endpoint answers 500
    pub broken_languages: Vec<String>,
    /// Missing entry → empty repository (409)
    pub commits: HashMap<String, u64>,
}

impl FakeUser {
    pub fn with_repo(mut self, name: &str, stars: u64, created_at: &str, fork: bool) -> Self {
        self.repos.push(repo_json(name, stars, created_at, fork));
        self
    }

    pub fn with_languages(mut self, repo: &str, languages: Value) -> Self {
        self.languages.insert(repo.to_string(), languages);
        self
    }

    pub fn with_commits(mut self, repo: &str, count: u64) -> Self {
        self.commits.insert(repo.to_string(), count);
        self
    }

    pub fn with_broken_languages(mut self, repo: &str) -> Self {
        self.broken_languages.push(repo.to_string());
        self
    }
}

pub fn repo_json(name: &str, stars: u64, created_at: &str, fork: bool) -> Value {
    json!({
        "name": name,
        "stargazers_count": stars,
        "forks_count": 1,
        "fork": fork,
        "language": "Rust",
        "size": 2048,
        "created_at": created_at,
        "updated_at": created_at,
        "html_url": format!("https://github.com/octocat/{}", name),
    })
}

#[derive(Clone, Default)]
struct FakeGitHub {
    users: Arc<HashMap<String, FakeUser>>,
    base_url: Arc<Mutex<String>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response()
}

async fn user_handler(
    State(fake): State<FakeGitHub>,
    Path(user): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match fake.users.get(&user) {
        Some(account) => Json(json!({
            "login": user,
            "name": "Fake User",
            "avatar_url": format!("https://avatars.example/{}", user),
            "bio": null,
            "location": "Nowhere",
            "company": null,
            "blog": "",
            "followers": 3,
            "following": 4,
            "public_repos": account.repos.len(),
            "created_at": "2011-01-25T18:44:36Z",
            "html_url": format!("https://github.com/{}", user),
        }))
        .into_response(),
        None => not_found(),
    }
}

async fn repos_handler(
    State(fake): State<FakeGitHub>,
    Path(user): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(account) = fake.users.get(&user) else {
        return not_found();
    };
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);

    let items: Vec<Value> = account
        .repos
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(items).into_response()
}

async fn languages_handler(
    State(fake): State<FakeGitHub>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let Some(account) = fake.users.get(&owner) else {
        return not_found();
    };
    if account.broken_languages.contains(&repo) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match account.languages.get(&repo) {
        Some(langs) => Json(langs.clone()).into_response(),
        None => not_found(),
    }
}

async fn commits_handler(
    State(fake): State<FakeGitHub>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let Some(account) = fake.users.get(&owner) else {
        return not_found();
    };
    let count = account.commits.get(&repo).copied().unwrap_or(0);
    let body = Json(json!([{ "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e" }]));

    match count {
        0 => (
            StatusCode::CONFLICT,
            Json(json!({"message": "Git Repository is empty."})),
        )
            .into_response(),
        1 => body.into_response(),
        n => {
            let base = fake.base_url.lock().unwrap().clone();
            let link = format!(
                "<{base}/repos/{owner}/{repo}/commits?per_page=1&page=2>; rel=\"next\", \
                 <{base}/repos/{owner}/{repo}/commits?per_page=1&page={n}>; rel=\"last\""
            );
            ([(header::LINK, link)], body).into_response()
        }
    }
}

/// Serve a fake GitHub API for `users` on an ephemeral port; returns its base URL.
pub async fn spawn_fake_github(users: HashMap<String, FakeUser>) -> String {
    let fake = FakeGitHub {
        users: Arc::new(users),
        base_url: Arc::default(),
    };

    let app = Router::new()
        .route("/users/{user}", get(user_handler))
        .route("/users/{user}/repos", get(repos_handler))
        .route("/repos/{owner}/{repo}/languages", get(languages_handler))
        .route("/repos/{owner}/{repo}/commits", get(commits_handler))
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    *fake.base_url.lock().unwrap() = base_url.clone();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

/// Cache double with real get/set semantics; TTLs are recorded, not enforced.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, u64)>>,
}

impl MemoryCache {
    pub fn entry(&self, key: &str) -> Option<(String, u64)> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl CacheRepository for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entry(key).map(|(value, _)| value))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl_seconds));
        Ok(())
    }
}
