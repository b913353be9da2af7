use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::analyze_handler,
        crate::api::handlers::analyze_path_handler,
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler
    ),
    components(
        schemas(
            crate::api::handlers::AnalyzeBody,
            crate::api::handlers::ErrorResponse,
            crate::api::handlers::HealthResponse,
            crate::api::handlers::HealthDependencies,
            crate::domain::AnalysisReport,
            crate::domain::AnalysisStats,
            crate::domain::ActivityPattern,
            crate::domain::Profile,
            crate::domain::RepositoryDetail,
            crate::domain::ReportSummary
        )
    ),
    tags(
        (name = "analysis", description = "GitHub profile analysis"),
        (name = "system", description = "System endpoints for health checks and metrics")
    ),
    info(
        title = "GitHub Profile Analyzer API",
        version = "0.1.0",
        description = "Aggregates a GitHub user's profile and repositories into language, activity and popularity statistics, cached in Redis."
    )
)]
pub struct ApiDoc;
