//! Domain layer - Core entities and the traits infrastructure must implement.
//!
//! This module defines the domain model for the profile analysis service,
//! following clean architecture principles. It contains:
//! - Traits for the upstream source host and the cache store
//! - Profile and repository entities as returned by the upstream API
//! - The aggregated report and the pure computations that build it

pub mod models;
pub use models::*;

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};

/// Count of upstream calls made while serving a single analysis request.
///
/// A fresh counter is created for every request and passed by reference to
/// each [`SourceHost`] call, so concurrent requests never share one.
#[derive(Debug, Default)]
pub struct ApiCallCounter(AtomicU32);

impl ApiCallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one upstream call.
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("github_api_calls_total").increment(1);
    }

    /// Number of calls recorded so far.
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Read access to a source-hosting service (e.g. GitHub).
///
/// Implementations must be thread-safe (`Send + Sync`) because per-repository
/// fetches for one request run concurrently.
///
/// # Implementations
///
/// See `infrastructure::github::GitHubClient` for the GitHub implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Fetch a user's public profile.
    ///
    /// Returns `Ok(None)` when the host answers with any non-success status,
    /// so callers can tell "no such user" apart from a failed request.
    ///
    /// # Errors
    ///
    /// - Returns error if network communication fails
    /// - Returns error if the response body cannot be decoded
    async fn fetch_profile(
        &self,
        username: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<Option<Profile>>;

    /// Fetch every repository owned by the user, following pagination
    /// until a short page is returned.
    ///
    /// # Errors
    ///
    /// - Returns error if any page answers with a non-success status
    /// - Returns error if network communication fails
    async fn fetch_repositories(
        &self,
        username: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<Vec<RepositorySummary>>;

    /// Fetch the language byte breakdown of one repository.
    ///
    /// A non-success status yields an empty map.
    async fn fetch_languages(
        &self,
        username: &str,
        repo: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<LanguageTotals>;

    /// Fetch the number of commits on the default branch of one repository.
    ///
    /// A non-success status (for example an empty repository) yields zero.
    async fn fetch_commit_count(
        &self,
        username: &str,
        repo: &str,
        calls: &ApiCallCounter,
    ) -> anyhow::Result<u64>;
}

/// Repository trait for caching operations.
///
/// Defines the interface for the caching layer (e.g., Redis) used
/// read-through/write-through around the analysis.
///
/// # Implementations
///
/// See `infrastructure::redis::RedisRepository` for the Redis implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Retrieve a cached value by key.
    ///
    /// Returns `Ok(Some(String))` if the key exists and is not expired,
    /// `Ok(None)` if the key doesn't exist or has expired.
    ///
    /// # Errors
    ///
    /// - Returns error if the cache connection fails
    /// - Never errors on cache miss (returns None instead)
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Store a value in the cache with a TTL.
    ///
    /// # Errors
    ///
    /// - Returns error if the cache connection fails
    /// - Returns error if the value cannot be stored
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> anyhow::Result<()>;
}
