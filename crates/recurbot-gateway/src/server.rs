//! HTTP server implementation using Axum.

use axum::{Router, routing::get, routing::post};
use recurbot_core::config::GatewayConfig;
use recurbot_scheduler::{DispatchExecutor, TemplateRegistry};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub registry: TemplateRegistry,
    /// Manual-send path; shares the registry with the scheduler.
    pub executor: DispatchExecutor,
}

impl AppState {
    pub fn new(executor: DispatchExecutor) -> Self {
        Self {
            registry: executor.registry().clone(),
            executor,
        }
    }
}

/// Build the Axum router with all routes.
///
/// Unknown paths, and known paths hit with an unsupported method, all
/// answer `404 Not found`.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);
    let not_found = super::routes::not_found;

    Router::new()
        .route("/", get(super::routes::dashboard_page).fallback(not_found))
        .route(
            "/api/templates",
            get(super::routes::list_templates)
                .post(super::routes::create_template)
                .fallback(not_found),
        )
        .route(
            "/api/templates/{id}",
            axum::routing::delete(super::routes::delete_template).fallback(not_found),
        )
        .route(
            "/api/send/{id}",
            post(super::routes::send_template).fallback(not_found),
        )
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .allow_origin(Any)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Bind and serve until the process stops.
pub async fn start(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Recurbot listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
