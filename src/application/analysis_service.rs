//! Profile analysis: cache-aside around a fan-out over the user's repositories.
//!
//! Flow for one request:
//! 1. Look up `analysis:<login>` in the cache and return it untouched on a hit
//! 2. Fetch the profile, then every page of the repository list
//! 3. Select the most starred original repositories and fetch their languages
//!    and commit counts concurrently, keeping the selection order
//! 4. Fold languages, bucket creation dates, render insights
//! 5. Store the finished report with the configured TTL
//!
//! Only complete reports are ever cached.

use crate::application::error::AnalysisError;
use crate::application::insights::InsightGenerator;
use crate::domain::{
    fold_language_totals, report_cache_key, select_top_repositories, ActivityPattern,
    AnalysisReport, AnalysisStats, ApiCallCounter, CacheRepository, LanguageTotals,
    RepositoryDetail, RepositorySummary, ReportSummary, SourceHost,
};
use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Cache TTL and selection limits for [`AnalysisService`].
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Seconds a finished report stays in the cache
    pub cache_ttl_secs: u64,
    /// Number of original repositories analysed in detail
    pub max_top_repos: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            max_top_repos: 20,
        }
    }
}

/// Where a returned report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    Cache,
    Fresh,
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSource::Cache => "HIT",
            ReportSource::Fresh => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub source: ReportSource,
}

pub struct AnalysisService {
    source: Arc<dyn SourceHost>,
    cache: Arc<dyn CacheRepository>,
    insights: InsightGenerator,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        source: Arc<dyn SourceHost>,
        cache: Arc<dyn CacheRepository>,
        insights: InsightGenerator,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            source,
            cache,
            insights,
            settings,
        }
    }

    /// Check cache health for deep health checks
    pub async fn check_cache_health(&self) -> bool {
        self.cache.get("_health_check").await.is_ok()
    }

    /// Analyse `username`, serving from the cache when possible.
    pub async fn analyze(&self, username: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AnalysisError::MissingUsername);
        }
        metrics::counter!("analysis_requests_total").increment(1);

        let cache_key = report_cache_key(username);

        // 1. Try Cache
        let cached = self
            .cache
            .get(&cache_key)
            .await
            .map_err(AnalysisError::Cache)?;
        if let Some(raw) = cached {
            match serde_json::from_str::<AnalysisReport>(&raw) {
                Ok(report) => {
                    info!("Cache HIT: {}", cache_key);
                    metrics::counter!("cache_operations_total", "operation" => "hit").increment(1);
                    return Ok(AnalysisOutcome {
                        report,
                        source: ReportSource::Cache,
                    });
                }
                Err(e) => warn!("Discarding undecodable cache entry {}: {}", cache_key, e),
            }
        }
        metrics::counter!("cache_operations_total", "operation" => "miss").increment(1);

        // 2. Compute
        let report = self.build_report(username).await?;

        // 3. Cache
        let json = serde_json::to_string(&report)?;
        self.cache
            .set(&cache_key, &json, self.settings.cache_ttl_secs)
            .await
            .map_err(AnalysisError::Cache)?;

        Ok(AnalysisOutcome {
            report,
            source: ReportSource::Fresh,
        })
    }

    async fn build_report(&self, username: &str) -> Result<AnalysisReport, AnalysisError> {
        let started = Instant::now();
        let calls = ApiCallCounter::new();
        info!("Starting analysis for: {}", username);

        let profile = self
            .source
            .fetch_profile(username, &calls)
            .await
            .map_err(AnalysisError::Upstream)?
            .ok_or_else(|| AnalysisError::UserNotFound(username.to_string()))?;

        let repos = self
            .source
            .fetch_repositories(username, &calls)
            .await
            .map_err(AnalysisError::Upstream)?;
        if repos.is_empty() {
            return Err(AnalysisError::NoRepositories);
        }

        let originals = repos.iter().filter(|r| !r.is_fork).count();
        let selected = select_top_repositories(&repos, self.settings.max_top_repos);
        info!(
            "Analyzing top {} of {} original repos for {}",
            selected.len(),
            originals,
            username
        );

        let top_repos = self.fetch_details(username, &selected, &calls).await;
        let language_stats = fold_language_totals(top_repos.iter().map(|r| &r.languages));
        let activity = ActivityPattern::from_repositories(&repos);

        let now = Utc::now();
        let insights = self
            .insights
            .generate(&repos, &language_stats, &activity, now);

        let elapsed = started.elapsed();
        metrics::histogram!("analysis_duration_seconds").record(elapsed.as_secs_f64());
        info!(
            "Analysis of {} complete in {:.2}s with {} GitHub API calls",
            username,
            elapsed.as_secs_f64(),
            calls.get()
        );

        Ok(AnalysisReport {
            user_info: profile,
            user: username.to_string(),
            summary: ReportSummary {
                total_repos: repos.len(),
                public_repos: originals,
                total_languages: language_stats.len(),
            },
            top_repos,
            language_stats,
            activity,
            insights,
            generated_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            stats: AnalysisStats {
                github_api_calls: calls.get(),
                analysis_time_seconds: format!("{:.2}", elapsed.as_secs_f64()),
            },
        })
    }

    /// Fetch languages and commit counts for every selected repository.
    ///
    /// All repositories are in flight at once; the output keeps `selected` order.
    async fn fetch_details(
        &self,
        username: &str,
        selected: &[RepositorySummary],
        calls: &ApiCallCounter,
    ) -> Vec<RepositoryDetail> {
        join_all(
            selected
                .iter()
                .map(|repo| self.fetch_detail(username, repo, calls)),
        )
        .await
    }

    /// Both sub-resources of one repository, requested together. A failed
    /// fetch degrades to an empty map or zero commits.
    async fn fetch_detail(
        &self,
        username: &str,
        repo: &RepositorySummary,
        calls: &ApiCallCounter,
    ) -> RepositoryDetail {
        let (languages, commits) = tokio::join!(
            self.source.fetch_languages(username, &repo.name, calls),
            self.source.fetch_commit_count(username, &repo.name, calls),
        );

        let languages = languages.unwrap_or_else(|e| {
            warn!("Failed to fetch languages of {}/{}: {:#}", username, repo.name, e);
            LanguageTotals::new()
        });
        let commits = commits.unwrap_or_else(|e| {
            warn!("Failed to fetch commits of {}/{}: {:#}", username, repo.name, e);
            0
        });

        RepositoryDetail::new(repo, languages, commits)
    }
}

/// Log a failed analysis at a level matching who is at fault.
pub fn log_failure(username: &str, err: &AnalysisError) {
    if err.is_client_error() {
        info!("Analysis of {} rejected: {}", username, err);
    } else {
        error!("Analysis of {} failed: {}", username, err);
    }
}
