//! Application configuration loaded from `config.yaml`.
//!
//! Every key has a default, so an empty file is a valid configuration.
//! Secrets (`GITHUB_TOKEN`, `REDIS_URL`) come from the environment instead.

use crate::application::AnalysisSettings;
use crate::infrastructure::github::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_USER_AGENT};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    /// Server configuration (host, port, CORS origins)
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,
    /// Cache and selection settings for the analysis
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Server configuration settings.
///
/// Defines how the HTTP server should bind and what CORS origins to allow.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct GitHubConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Repositories per page when listing a user's repositories (capped at 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AnalysisConfig {
    /// Seconds a report stays cached (default: 3600)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Original repositories analysed in detail (default: 20)
    #[serde(default = "default_max_top_repos")]
    pub max_top_repos: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            max_top_repos: default_max_top_repos(),
        }
    }
}

impl From<&AnalysisConfig> for AnalysisSettings {
    fn from(config: &AnalysisConfig) -> Self {
        AnalysisSettings {
            cache_ttl_secs: config.cache_ttl_secs,
            max_top_repos: config.max_top_repos,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_max_top_repos() -> usize {
    20
}

impl Config {
    /// Read and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read {} - ensure file exists in working directory",
                path.display()
            )
        })?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse {} - check YAML syntax and structure", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        // Redis rejects `SET .. EX 0`
        anyhow::ensure!(
            config.analysis.cache_ttl_secs > 0,
            "analysis.cache_ttl_secs must be at least 1"
        );
        Ok(config)
    }
}
