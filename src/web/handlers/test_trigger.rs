use crate::models::{DeliveryOutcome, DestinationResult};
use crate::services::aggregator::DeliveryStatistics;
use crate::services::ingest;
use crate::web::error::{AppError, AppResult};
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct DestinationRef {
    pub nome: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultItem {
    pub destino: DestinationRef,
    pub success: bool,
    pub status: u16,
    pub status_text: String,
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub results: Vec<TestResultItem>,
    pub statistics: DeliveryStatistics,
    pub payload: serde_json::Value,
    pub tested_at: String,
}

impl From<&DestinationResult> for TestResultItem {
    fn from(result: &DestinationResult) -> Self {
        let destino = DestinationRef {
            nome: result.destination.name.clone(),
            url: result.destination.url.clone(),
        };
        let outcome = &result.outcome;
        let response_data = outcome.body_snippet().map(|body| {
            serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
        });

        let status_text = match outcome {
            DeliveryOutcome::Success { status, .. } => canonical_reason(*status),
            DeliveryOutcome::Failure {
                status, message, ..
            } => {
                if *status > 0 {
                    canonical_reason(*status)
                } else {
                    message.clone()
                }
            }
        };

        TestResultItem {
            destino,
            success: outcome.is_success(),
            status: outcome.status(),
            status_text,
            response_time: outcome.response_time_ms(),
            error: outcome.failure_kind().map(|k| k.as_str().to_string()),
            response_data,
            headers: outcome.headers().cloned(),
        }
    }
}

fn canonical_reason(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
        .to_string()
}

/// POST /redirecionamentos/:id/testar
///
/// The optional request body is used as the test payload; an empty body gets a synthetic one.
pub async fn test_endpoint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Json<TestResponse>> {
    let payload = if body.iter().all(|b| b.is_ascii_whitespace()) {
        None
    } else {
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("Test payload is not valid JSON: {}", e)))?;
        Some(value)
    };

    let run = ingest::test_endpoint(&state.db, &state.dispatcher, id, payload).await?;

    Ok(Json(TestResponse {
        results: run.report.results.iter().map(TestResultItem::from).collect(),
        statistics: run.report.statistics,
        payload: run.payload,
        tested_at: run.tested_at.to_rfc3339(),
    }))
}
