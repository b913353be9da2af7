//! GitHub Profile Analyzer
//!
//! An HTTP service that analyses a GitHub user's public profile and repositories,
//! with Redis caching of finished reports.
//!
//! # Architecture
//!
//! The service follows clean/onion architecture with clear separation of concerns:
//! - **Domain**: Profile/repository/report entities and the source-host and cache traits
//! - **Application**: The analysis use case and insight rendering
//! - **Infrastructure**: External integrations (GitHub, Redis)
//! - **API**: HTTP handlers, routing, and middleware
//!
//! # Configuration
//!
//! The service is configured via `config.yaml` and environment variables:
//! - `GITHUB_TOKEN`: GitHub personal access token (required)
//! - `REDIS_URL`: Redis connection string (default: redis://127.0.0.1:6379)
//! - `CONFIG_PATH`: Alternative location of `config.yaml`
//! - `PORT`: Overrides `server.port`
//! - `RUST_LOG`: Logging level (default: info)
//! - `LOG_FORMAT`: `text` (default) or `json`
//!
//! # Quick Start
//!
//! ```bash
//! export GITHUB_TOKEN="your_token_here"
//! export REDIS_URL="redis://localhost:6379"
//!
//! cargo run --release
//!
//! curl -X POST "http://localhost:3000/analyze?username=octocat"
//! curl -X POST http://localhost:3000/analyze -H 'content-type: application/json' -d '{"username":"octocat"}'
//! ```

use anyhow::Context;
use github_profile_analyzer::api::routes::create_router;
use github_profile_analyzer::api::state::AppState;
use github_profile_analyzer::application::{AnalysisService, AnalysisSettings, InsightGenerator};
use github_profile_analyzer::config::Config;
use github_profile_analyzer::infrastructure::redis::DEFAULT_REDIS_URL;
use github_profile_analyzer::infrastructure::{GitHubClient, RedisRepository};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let github_token = env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .context("GITHUB_TOKEN not found in environment variables")?;

    // Load Config
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string());

    // Infrastructure
    let github = GitHubClient::with_base_url(github_token, &config.github.base_url)?
        .with_user_agent(config.github.user_agent.clone())
        .with_page_size(config.github.page_size);
    let redis_repo = RedisRepository::new(&redis_url)?;

    // Application
    let settings = AnalysisSettings::from(&config.analysis);
    tracing::info!(
        "Reports cached for {}s, top {} repositories analysed",
        settings.cache_ttl_secs,
        settings.max_top_repos
    );
    let analysis_service = Arc::new(AnalysisService::new(
        Arc::new(github),
        Arc::new(redis_repo),
        InsightGenerator::new(),
        settings,
    ));

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    let state = AppState {
        analysis_service,
        metrics,
    };

    let app = create_router(state, &config.server.allowed_origins);

    // Allow PORT env var override
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("Server running at http://{}", addr);

    // Graceful shutdown handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error during operation")?;

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
