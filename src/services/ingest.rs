use crate::models::{DestinationResult, EventOutcome};
use crate::services::aggregator::{aggregate, DispatchReport};
use crate::services::delivery_log::{self, EventRecord};
use crate::services::dispatcher::{DispatchRequest, Dispatcher};
use crate::services::resolver::{self, ResolveError};
use crate::Database;
use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::net::IpAddr;
use std::time::Instant;

/// One inbound webhook call as received at `/webhook/{slug}`.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub slug: String,
    pub payload: Bytes,
    pub headers: HeaderMap,
    pub peer_ip: Option<IpAddr>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboundResponse {
    pub success: bool,
    pub message: String,
    pub destinations_reached: usize,
    pub status: u16,
}

#[derive(Debug, Clone)]
pub struct IngestResult {
    pub correlation_id: String,
    pub outcome: EventOutcome,
    pub response: InboundResponse,
    /// `None` when the event could not be written to the log.
    pub event_id: Option<i64>,
}

/// Run one inbound event through resolve, dispatch, aggregate and log.
///
/// Always produces a response for the sender: resolution failures, destination failures and
/// log write failures are all folded into the result rather than returned as errors.
pub async fn process_inbound(
    db: &Database,
    dispatcher: &Dispatcher,
    request: InboundRequest,
) -> IngestResult {
    let started = Instant::now();
    let received_at = Utc::now();
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let origin_ip = origin_ip(&request.headers, request.peer_ip);
    let user_agent = header_str(&request.headers, USER_AGENT.as_str());

    let (outcome, endpoint_id, results, message, error_message) =
        match resolver::resolve(db, &request.slug) {
            Ok(resolved) => {
                let dispatch_request = DispatchRequest {
                    correlation_id: correlation_id.clone(),
                    endpoint_slug: resolved.endpoint.slug.clone(),
                    payload: request.payload.clone(),
                    content_type: header_str(&request.headers, CONTENT_TYPE.as_str()),
                    forwarded_headers: forwardable_headers(&request.headers),
                    origin_ip: origin_ip.clone(),
                    test: false,
                };
                let results = dispatcher
                    .dispatch(dispatch_request, resolved.destinations.clone())
                    .await;
                let report = aggregate(results);
                let outcome = report.outcome();
                let message = delivery_message(&report);
                let error_message = report.error_summary();
                (
                    outcome,
                    Some(resolved.endpoint.id),
                    report.results,
                    message,
                    error_message,
                )
            }
            Err(ResolveError::NotFound(slug)) => {
                let message = format!("Endpoint '{}' not found", slug);
                (EventOutcome::NotFound, None, Vec::new(), message.clone(), Some(message))
            }
            Err(ResolveError::Inactive(endpoint)) => {
                let message = format!("Endpoint '{}' is inactive", endpoint.slug);
                (
                    EventOutcome::Inactive,
                    Some(endpoint.id),
                    Vec::new(),
                    message.clone(),
                    Some(message),
                )
            }
            Err(e @ ResolveError::Store(_)) => {
                tracing::error!("Webhook {} for '{}': {}", correlation_id, request.slug, e);
                (
                    EventOutcome::Unavailable,
                    None,
                    Vec::new(),
                    "Endpoint configuration is temporarily unavailable".to_string(),
                    Some(e.to_string()),
                )
            }
        };

    let response_time_ms = started.elapsed().as_millis() as u64;

    let record = EventRecord {
        correlation_id: correlation_id.clone(),
        endpoint_slug: request.slug.clone(),
        endpoint_id,
        received_at,
        payload: String::from_utf8_lossy(&request.payload).into_owned(),
        headers: headers_to_json(&request.headers),
        outcome,
        response_time_ms,
        error_message,
        origin_ip,
        user_agent,
    };

    let event_id = match delivery_log::record_event(db, &record, &results) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::error!(
                "Failed to record webhook event {} for '{}': {:#}",
                correlation_id,
                request.slug,
                e
            );
            None
        }
    };

    let successful = results.iter().filter(|r| r.outcome.is_success()).count();
    tracing::info!(
        "Webhook {} for '{}': {} ({} of {} delivered, {}ms)",
        correlation_id,
        request.slug,
        outcome.as_str(),
        successful,
        results.len(),
        response_time_ms
    );

    IngestResult {
        correlation_id,
        outcome,
        response: InboundResponse {
            success: outcome.is_success(),
            message,
            destinations_reached: results.len(),
            status: outcome.status_code(),
        },
        event_id,
    }
}

/// Result of a manual test delivery. Not written to the delivery log.
#[derive(Debug, Clone)]
pub struct TestRun {
    pub report: DispatchReport,
    pub payload: serde_json::Value,
    pub tested_at: DateTime<Utc>,
}

/// Send a test payload to every active destination of endpoint `endpoint_id` and wait for all
/// results. A synthetic payload is generated when none is supplied.
pub async fn test_endpoint(
    db: &Database,
    dispatcher: &Dispatcher,
    endpoint_id: i64,
    payload: Option<serde_json::Value>,
) -> Result<TestRun, ResolveError> {
    let resolved = resolver::resolve_by_id(db, endpoint_id)?;
    let tested_at = Utc::now();

    let payload = payload.unwrap_or_else(|| synthetic_payload(&resolved.endpoint.slug, tested_at));

    let dispatch_request = DispatchRequest {
        correlation_id: uuid::Uuid::new_v4().to_string(),
        endpoint_slug: resolved.endpoint.slug.clone(),
        payload: Bytes::from(payload.to_string()),
        content_type: Some("application/json".to_string()),
        forwarded_headers: Vec::new(),
        origin_ip: None,
        test: true,
    };

    let results: Vec<DestinationResult> = dispatcher
        .dispatch(dispatch_request, resolved.destinations.clone())
        .await;
    let report = aggregate(results);

    tracing::info!(
        "Test delivery for '{}': {} of {} succeeded",
        resolved.endpoint.slug,
        report.statistics.successful,
        report.statistics.total
    );

    Ok(TestRun {
        report,
        payload,
        tested_at,
    })
}

pub fn synthetic_payload(slug: &str, at: DateTime<Utc>) -> serde_json::Value {
    json!({
        "test": true,
        "event": "webhook.test",
        "endpoint": slug,
        "message": "Test delivery from hookrelay",
        "timestamp": at.to_rfc3339(),
    })
}

fn delivery_message(report: &DispatchReport) -> String {
    let stats = &report.statistics;
    match report.outcome() {
        EventOutcome::NoDestinations => {
            "Webhook received; endpoint has no active destinations".to_string()
        }
        EventOutcome::Delivered => format!("Webhook delivered to {} destination(s)", stats.total),
        EventOutcome::Partial => format!(
            "Webhook delivered to {} of {} destination(s)",
            stats.successful, stats.total
        ),
        _ => format!("Webhook delivery failed for all {} destination(s)", stats.total),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Client address, preferring proxy headers over the socket peer.
pub fn origin_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .or_else(|| peer.map(|ip| ip.to_string()))
}

fn forwardable_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(k, _)| k.as_str().starts_with("x-"))
        .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
        .collect()
}

fn headers_to_json(headers: &HeaderMap) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|s| (k.to_string(), serde_json::Value::String(s.to_string())))
        })
        .collect();
    serde_json::Value::Object(map)
}
