//! HTTP server facade for the catalog service: Axum, uniform error envelope,
//! liveness probe and merged OpenAPI document.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use catalog_kernel::{settings::Settings, HealthCheck, ModuleRegistry};

pub mod error;
pub mod extract;
pub mod health;
pub mod router;

use router::RouterBuilder;

/// Bind the configured address and serve until Ctrl+C or SIGTERM.
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &Settings,
    health: Arc<dyn HealthCheck>,
) -> anyhow::Result<()> {
    let app = build_router(registry, settings, health);

    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router: module routes under the API prefix, the
/// health probe and OpenAPI document at the root, then the global layers.
pub fn build_router(
    registry: &ModuleRegistry,
    settings: &Settings,
    health: Arc<dyn HealthCheck>,
) -> Router {
    let mut api = Router::new();
    for module in registry.modules() {
        tracing::info!(
            module = module.name(),
            prefix = %settings.server.api_prefix,
            "mounting module routes"
        );
        api = api.merge(module.routes());
    }

    RouterBuilder::new()
        .mount_api(&settings.server.api_prefix, api)
        .merge(health::router(health))
        .with_openapi(registry, &settings.server.api_prefix)
        .with_timeout(settings.server.request_timeout_ms)
        .with_tracing()
        .with_cors()
        .with_request_id()
        .build()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, starting shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting shutdown"),
    }
}
