mod error;
mod handlers;
mod routes;
mod state;

pub use error::{AppError, AppResult};
pub use state::AppState;

use crate::{Config, Database};
use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Extra time allowed on top of the dispatch ceiling before a request is cut off.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

pub fn router(state: Arc<AppState>) -> Router {
    let request_timeout =
        Duration::from_millis(state.config.dispatch.ceiling_ms) + REQUEST_TIMEOUT_MARGIN;

    Router::new()
        .merge(routes::webhook_routes())
        .merge(routes::monitoring_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db)?);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let app = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining in-flight deliveries");
}
