use super::handlers;
use super::state::AppState;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook/:slug", post(handlers::webhook::receive))
        .route("/health", get(health))
}

/// Read and test surfaces consumed by the monitoring UI.
pub fn monitoring_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/redirecionamentos/:id/testar",
            post(handlers::test_trigger::test_endpoint),
        )
        .route("/logs-webhook", get(handlers::logs::list_logs))
        .route("/logs-webhook/stats", get(handlers::logs::stats))
        .route(
            "/logs-webhook/stats/by-endpoint",
            get(handlers::logs::stats_by_endpoint),
        )
        .route("/logs-webhook/:id", get(handlers::logs::get_log))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
