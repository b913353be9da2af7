//! GitHub REST API v3 integration.
//!
//! This module provides the `GitHubClient` implementation of the `SourceHost` trait,
//! used to collect a user's profile, repository list and per-repository details.
//!
//! # Features
//!
//! - Bearer-token authentication on every request
//! - Page-by-page repository listing that stops on the first short page
//! - Commit counting from the `Link` header of a one-commit-per-page listing
//! - Detailed logging of rate limit status
//!
//! # Rate Limiting
//!
//! GitHub's authenticated API allows 5,000 requests per hour. This implementation:
//! - Monitors `X-RateLimit-Remaining` header
//! - Logs warnings when < 100 requests remaining
//! - Never retries: a failed call is final for that call
//!
//! # Examples
//!
//! ```no_run
//! use github_profile_analyzer::domain::{ApiCallCounter, SourceHost};
//! use github_profile_analyzer::infrastructure::GitHubClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let token = std::env::var("GITHUB_TOKEN")?;
//!     let github = GitHubClient::new(token)?;
//!     let calls = ApiCallCounter::new();
//!
//!     let repos = github.fetch_repositories("octocat", &calls).await?;
//!     println!("{} repositories in {} calls", repos.len(), calls.get());
//!     Ok(())
//! }
//! ```

use crate::domain::{ApiCallCounter, LanguageTotals, Profile, RepositorySummary, SourceHost};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default GitHub API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default `User-Agent` sent with every request
pub const DEFAULT_USER_AGENT: &str = "GitHub-Analyzer-App";

/// Repositories requested per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest `per_page` GitHub honours; bigger values are silently capped
pub const MAX_PAGE_SIZE: usize = 100;

/// GitHub API client.
///
/// The call counter is not part of the client: every method takes the
/// per-request [`ApiCallCounter`] so one shared client can serve concurrent
/// analyses.
pub struct GitHubClient {
    /// HTTP client configured with a connect timeout
    client: Client,
    /// Personal access token sent as a bearer credential
    token: String,
    base_url: Url,
    user_agent: String,
    page_size: usize,
}

impl GitHubClient {
    /// Create a client for the public GitHub API.
    pub fn new(token: String) -> anyhow::Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom API endpoint (GitHub Enterprise, tests).
    pub fn with_base_url(token: String, base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid GitHub API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("GitHub API base URL cannot carry paths: {}", base_url);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            token,
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the repository page size, kept within GitHub's 1..=100.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Check and log rate limit information from response headers.
    ///
    /// Monitors the `X-RateLimit-Remaining` header and logs warnings when
    /// rate limits are low or exceeded.
    fn check_rate_limit(&self, resp: &Response) {
        let remaining = resp
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());

        if let Some(remaining_count) = remaining {
            if remaining_count < 100 {
                warn!(
                    "GitHub API rate limit low: {} requests remaining",
                    remaining_count
                );
            }
            if remaining_count == 0 {
                if let Some(reset) = resp
                    .headers()
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                {
                    info!("GitHub API rate limit exceeded, resets at: {}", reset);
                }
            }
        }
    }

    /// API URL for `segments` under the base URL. Each segment is
    /// percent-encoded on its own, so a `/` inside a login stays inside it.
    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("GitHub API base URL cannot carry paths: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue one authenticated GET and count it against `calls`.
    async fn get(&self, url: Url, calls: &ApiCallCounter) -> anyhow::Result<Response> {
        calls.record();
        debug!("Fetching from GitHub API: {}", url);

        let resp = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .with_context(|| format!("Failed to fetch from {}", url))?;

        self.check_rate_limit(&resp);
        Ok(resp)
    }
}

/// Extract the page number of the `rel="last"` entry of a `Link` header.
///
/// `<https://api.github.com/repositories/1/commits?per_page=1&page=342>; rel="last"`
/// yields `Some(342)`.
pub fn last_page_from_link(link: &str) -> Option<u64> {
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == r#"rel="last""#) {
            return None;
        }
        let url = target.trim().trim_start_matches('<').trim_end_matches('>');
        let parsed = Url::parse(url).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse::<u64>().ok())
    })
}

/// Data transfer object for the GitHub user response.
#[derive(Deserialize)]
struct UserDto {
    login: String,
    name: Option<String>,
    avatar_url: String,
    bio: Option<String>,
    location: Option<String>,
    company: Option<String>,
    blog: Option<String>,
    #[serde(default)]
    followers: u64,
    #[serde(default)]
    following: u64,
    #[serde(default)]
    public_repos: u64,
    created_at: String,
    html_url: String,
}

impl From<UserDto> for Profile {
    fn from(dto: UserDto) -> Self {
        Profile {
            login: dto.login,
            name: dto.name,
            avatar_url: dto.avatar_url,
            bio: dto.bio,
            location: dto.location,
            company: dto.company,
            blog: dto.blog,
            followers: dto.followers,
            following: dto.following,
            public_repos: dto.public_repos,
            created_at: dto.created_at,
            html_url: dto.html_url,
        }
    }
}

/// Data transfer object for one entry of `/users/{user}/repos`.
#[derive(Deserialize)]
struct RepoDto {
    name: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    fork: bool,
    language: Option<String>,
    #[serde(default)]
    size: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    html_url: String,
}

impl From<RepoDto> for RepositorySummary {
    fn from(dto: RepoDto) -> Self {
        RepositorySummary {
            name: dto.name,
            stars: dto.stargazers_count,
            forks: dto.forks_count,
            is_fork: dto.fork,
            language: dto.language,
            size: dto.size,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            html_url: dto.html_url,
        }
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    async fn fetch_profile(
        &self,
        username: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<Option<Profile>> {
        let url = self.endpoint(&["users", username])?;
        let resp = self.get(url, calls).await?;

        if !resp.status().is_success() {
            debug!("Profile lookup for {} returned {}", username, resp.status());
            return Ok(None);
        }

        let dto: UserDto = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse profile of {}", username))?;
        Ok(Some(Profile::from(dto)))
    }

    async fn fetch_repositories(
        &self,
        username: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<Vec<RepositorySummary>> {
        let mut all_repos = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.endpoint(&["users", username, "repos"])?;
            url.query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &self.page_size.to_string());
            let resp = self.get(url, calls).await?;

            if !resp.status().is_success() {
                anyhow::bail!("GitHub API Error: {} listing repos of {}", resp.status(), username);
            }

            let dtos: Vec<RepoDto> = resp
                .json()
                .await
                .with_context(|| format!("Failed to parse page {} of {}'s repos", page, username))?;

            let page_len = dtos.len();
            all_repos.extend(dtos.into_iter().map(RepositorySummary::from));

            // A short page (including an empty one) is the last page
            if page_len < self.page_size {
                break;
            }
            page += 1;
        }

        Ok(all_repos)
    }

    async fn fetch_languages(
        &self,
        username: &str,
        repo: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<LanguageTotals> {
        let resp = self
            .get(self.endpoint(&["repos", username, repo, "languages"])?, calls)
            .await?;

        if !resp.status().is_success() {
            debug!("Languages of {}/{} returned {}", username, repo, resp.status());
            return Ok(LanguageTotals::new());
        }

        let languages: LanguageTotals = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse languages of {}/{}", username, repo))?;
        Ok(languages)
    }

    async fn fetch_commit_count(
        &self,
        username: &str,
        repo: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<u64> {
        let mut url = self.endpoint(&["repos", username, repo, "commits"])?;
        url.query_pairs_mut().append_pair("per_page", "1");
        let resp = self.get(url, calls).await?;

        if !resp.status().is_success() {
            debug!("Commits of {}/{} returned {}", username, repo, resp.status());
            return Ok(0);
        }

        let last_page = resp
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(last_page_from_link);
        if let Some(count) = last_page {
            return Ok(count);
        }

        let commits: Vec<serde_json::Value> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse commits of {}/{}", username, repo))?;
        Ok(commits.len() as u64)
    }
}
