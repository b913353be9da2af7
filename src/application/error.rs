use thiserror::Error;

/// Outcome of an analysis that did not produce a report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Username is required as query param or in POST body")]
    MissingUsername,

    #[error("GitHub user not found: {0}")]
    UserNotFound(String),

    #[error("No public repositories found")]
    NoRepositories,

    #[error("Cache error: {0:#}")]
    Cache(anyhow::Error),

    #[error("GitHub API error: {0:#}")]
    Upstream(anyhow::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Whether the failure is the caller's (4xx) rather than ours (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingUsername
                | AnalysisError::UserNotFound(_)
                | AnalysisError::NoRepositories
        )
    }
}
