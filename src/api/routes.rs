use crate::api::doc::ApiDoc;
use crate::api::handlers::{
    analyze_handler, analyze_path_handler, health_handler, method_not_allowed_handler,
    metrics_handler,
};
use crate::api::state::AppState;
use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the CORS layer from a comma-separated origin list ("*" allows any).
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins == "*" {
        return CorsLayer::permissive();
    }

    let origin_values: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origin_values.is_empty() {
        tracing::warn!("No valid CORS origins found, falling back to permissive CORS");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origin_values))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_router(state: AppState, allowed_origins: &str) -> Router {
    // Create middleware stack with security headers and observability
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path()
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status().as_u16().to_string();
                        metrics::counter!("http_requests_total", "status" => status.clone())
                            .increment(1);
                        metrics::histogram!("http_request_duration_seconds", "status" => status)
                            .record(latency.as_secs_f64());

                        // Log slow requests
                        if latency.as_secs() > 10 {
                            tracing::warn!("Slow HTTP request: {}ms", latency.as_millis());
                        }
                    },
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(cors_layer(allowed_origins));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // System endpoints
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        // Analysis
        .route(
            "/analyze",
            post(analyze_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/api/analyze",
            post(analyze_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/analyze/{username}",
            post(analyze_path_handler).fallback(method_not_allowed_handler),
        )
        .layer(middleware)
        .with_state(state)
}
