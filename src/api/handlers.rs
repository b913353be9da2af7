use crate::api::state::AppState;
use crate::application::analysis_service::log_failure;
use crate::application::AnalysisError;
use crate::domain::AnalysisReport;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response header telling whether the report came from the cache
pub const CACHE_STATUS_HEADER: &str = "x-cache";

#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct AnalyzeQuery {
    /// GitHub login to analyse (takes precedence over the body field)
    #[param(example = "octocat")]
    pub username: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct AnalyzeBody {
    /// GitHub login to analyse
    #[schema(example = "octocat")]
    pub username: Option<String>,
}

/// A resolved username, checked against GitHub's login rules.
#[derive(Debug, Validate)]
struct AnalyzeRequest {
    #[validate(length(min = 1, max = 39), custom(function = "validate_login"))]
    username: String,
}

/// Logins are ASCII alphanumerics and hyphens, never starting with a hyphen.
fn validate_login(username: &str) -> Result<(), ValidationError> {
    let allowed = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if allowed && !username.starts_with('-') {
        Ok(())
    } else {
        Err(ValidationError::new("login_charset")
            .with_message("only letters, digits and hyphens are allowed".into()))
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Echo of the requested login (unknown user only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Underlying failure (server errors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            user: None,
            message: None,
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AnalysisError::MissingUsername => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(self.to_string()))
            }
            AnalysisError::UserNotFound(user) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    user: Some(user.clone()),
                    ..ErrorResponse::new("GitHub user not found")
                },
            ),
            AnalysisError::NoRepositories => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(self.to_string()))
            }
            AnalysisError::Cache(_) | AnalysisError::Upstream(_) | AnalysisError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    message: Some(self.to_string()),
                    ..ErrorResponse::new("Failed to analyze user")
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Pick the username from the query string, falling back to a JSON body.
fn resolve_username(query: AnalyzeQuery, body: &Bytes) -> Result<Option<String>, Response> {
    let from_query = query.username.filter(|u| !u.trim().is_empty());
    if from_query.is_some() {
        return Ok(from_query);
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let parsed: AnalyzeBody = serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: Some(e.to_string()),
                ..ErrorResponse::new("Invalid JSON body")
            }),
        )
            .into_response()
    })?;
    Ok(parsed.username.filter(|u| !u.trim().is_empty()))
}

async fn run_analysis(state: &AppState, username: Option<String>) -> Response {
    let Some(username) = username else {
        return AnalysisError::MissingUsername.into_response();
    };
    let username = username.trim().to_string();

    let request = AnalyzeRequest { username };
    if let Err(e) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: Some(e.to_string()),
                ..ErrorResponse::new("Invalid username")
            }),
        )
            .into_response();
    }

    match state.analysis_service.analyze(&request.username).await {
        Ok(outcome) => (
            StatusCode::OK,
            [(CACHE_STATUS_HEADER, outcome.source.as_str())],
            Json(outcome.report),
        )
            .into_response(),
        Err(e) => {
            log_failure(&request.username, &e);
            e.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/analyze",
    params(AnalyzeQuery),
    request_body(content = AnalyzeBody, description = "Alternative to the `username` query parameter", content_type = "application/json"),
    tag = "analysis",
    responses(
        (status = 200, description = "Profile analysis (fresh or cached, see the x-cache header)", body = AnalysisReport),
        (status = 400, description = "Username missing or invalid", body = ErrorResponse,
            example = json!({"error": "Username is required as query param or in POST body"})
        ),
        (status = 404, description = "Unknown user or user without repositories", body = ErrorResponse,
            example = json!({"error": "GitHub user not found", "user": "ghost-user-404"})
        ),
        (status = 405, description = "Only POST is allowed", body = ErrorResponse),
        (status = 500, description = "Upstream or cache failure", body = ErrorResponse,
            example = json!({"error": "Failed to analyze user", "message": "GitHub API error: 502 Bad Gateway"})
        )
    )
)]
#[instrument(skip(state, body), fields(username = ?query.username))]
pub async fn analyze_handler(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    body: Bytes,
) -> Response {
    match resolve_username(query, &body) {
        Ok(username) => run_analysis(&state, username).await,
        Err(rejection) => rejection,
    }
}

#[utoipa::path(
    post,
    path = "/analyze/{username}",
    params(("username" = String, Path, description = "GitHub login to analyse", example = "octocat")),
    tag = "analysis",
    responses(
        (status = 200, description = "Profile analysis", body = AnalysisReport),
        (status = 404, description = "Unknown user or user without repositories", body = ErrorResponse),
        (status = 500, description = "Upstream or cache failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn analyze_path_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Response {
    run_analysis(&state, Some(username)).await
}

/// Answer any non-POST method on the analyze routes.
pub async fn method_not_allowed_handler(method: Method) -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorResponse::new(format!("Method {} Not Allowed", method))),
    )
        .into_response()
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dependencies: HealthDependencies,
}

#[derive(Serialize, ToSchema)]
pub struct HealthDependencies {
    pub redis: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Health check passed", body = HealthResponse),
        (status = 503, description = "Service degraded or unavailable", body = HealthResponse)
    )
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let redis_healthy = state.analysis_service.check_cache_health().await;

    let response = HealthResponse {
        status: if redis_healthy { "ok" } else { "degraded" }.to_string(),
        version: VERSION.to_string(),
        dependencies: HealthDependencies {
            redis: if redis_healthy { "healthy" } else { "unavailable" }.to_string(),
        },
    };

    if redis_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain"),
        (status = 404, description = "Metrics recorder not installed")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
