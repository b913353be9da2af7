//! Profile, repository and report models.
//!
//! Upstream payloads are mapped into these types by the infrastructure layer;
//! the pure computations over them (selection, language folding, activity
//! bucketing) live here so they can be tested without any I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Language name → byte count. Ordered so serialized reports are stable.
pub type LanguageTotals = BTreeMap<String, u64>;

/// Public profile of the analysed user, as reported by the source host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub created_at: String,
    pub html_url: String,
}

/// One entry of the user's repository list.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositorySummary {
    pub name: String,
    pub stars: u64,
    pub forks: u64,
    pub is_fork: bool,
    pub language: Option<String>,
    /// Size in KiB, as reported upstream
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
}

/// A selected repository enriched with its commit count and language breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDetail {
    pub name: String,
    pub stars: u64,
    pub forks: u64,
    pub commits: u64,
    pub primary_language: Option<String>,
    /// Size in MiB with two decimals
    #[serde(rename = "sizeMB")]
    pub size_mb: String,
    #[schema(value_type = String)]
    pub created: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated: DateTime<Utc>,
    pub url: String,
    #[schema(value_type = Object)]
    pub languages: LanguageTotals,
}

impl RepositoryDetail {
    pub fn new(repo: &RepositorySummary, languages: LanguageTotals, commits: u64) -> Self {
        Self {
            name: repo.name.clone(),
            stars: repo.stars,
            forks: repo.forks,
            commits,
            primary_language: repo.language.clone(),
            size_mb: format!("{:.2}", repo.size as f64 / 1024.0),
            created: repo.created_at,
            updated: repo.updated_at,
            url: repo.html_url.clone(),
            languages,
        }
    }
}

/// Repository creation counts bucketed by year and by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityPattern {
    /// "YYYY" → repositories created that year
    pub yearly: BTreeMap<String, u32>,
    /// "YYYY-MM" → repositories created that month
    pub monthly: BTreeMap<String, u32>,
}

impl ActivityPattern {
    /// Bucket every repository by its creation timestamp (UTC).
    pub fn from_repositories(repos: &[RepositorySummary]) -> Self {
        let mut pattern = Self::default();
        for repo in repos {
            let year = repo.created_at.format("%Y").to_string();
            let month = repo.created_at.format("%Y-%m").to_string();
            *pattern.yearly.entry(year).or_insert(0) += 1;
            *pattern.monthly.entry(month).or_insert(0) += 1;
        }
        pattern
    }

    /// The year with the most repositories; the earliest such year on ties.
    pub fn busiest_year(&self) -> Option<(&str, u32)> {
        self.yearly
            .iter()
            .fold(None, |best: Option<(&str, u32)>, (year, &count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((year.as_str(), count)),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_repos: usize,
    pub public_repos: usize,
    pub total_languages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub github_api_calls: u32,
    /// Wall-clock seconds with two decimals
    pub analysis_time_seconds: String,
}

/// The complete analysis of one user. This is the cached artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub user_info: Profile,
    pub user: String,
    pub summary: ReportSummary,
    pub top_repos: Vec<RepositoryDetail>,
    #[schema(value_type = Object)]
    pub language_stats: LanguageTotals,
    pub activity: ActivityPattern,
    pub insights: Vec<String>,
    pub generated_at: String,
    pub stats: AnalysisStats,
}

/// Pick the repositories worth a detailed look: originals only, most starred
/// first, most recently created first among equal stars.
pub fn select_top_repositories(
    repos: &[RepositorySummary],
    limit: usize,
) -> Vec<RepositorySummary> {
    let mut originals: Vec<RepositorySummary> =
        repos.iter().filter(|r| !r.is_fork).cloned().collect();
    originals.sort_by(|a, b| {
        b.stars
            .cmp(&a.stars)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    originals.truncate(limit);
    originals
}

/// Sum the per-repository language maps into one total.
pub fn fold_language_totals<'a, I>(maps: I) -> LanguageTotals
where
    I: IntoIterator<Item = &'a LanguageTotals>,
{
    let mut totals = LanguageTotals::new();
    for map in maps {
        for (language, bytes) in map {
            *totals.entry(language.clone()).or_insert(0) += bytes;
        }
    }
    totals
}

/// Cache key for a user's report. Logins are case-insensitive upstream, so
/// the key is case-folded.
pub fn report_cache_key(username: &str) -> String {
    format!("analysis:{}", username.trim().to_lowercase())
}
