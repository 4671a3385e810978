use crate::config::DispatchConfig;
use crate::models::{DeliveryOutcome, Destination, DestinationResult, FailureKind};
use anyhow::Result;
use axum::body::Bytes;
use futures_util::future::join_all;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const HEADER_ENDPOINT: &str = "x-webhook-endpoint";
pub const HEADER_DELIVERY: &str = "x-webhook-delivery";
pub const HEADER_DESTINATION: &str = "x-webhook-destination";
pub const HEADER_TEST: &str = "x-webhook-test";
const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

/// Everything a destination receives for one event, shared read-only by every delivery task.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub correlation_id: String,
    pub endpoint_slug: String,
    pub payload: Bytes,
    pub content_type: Option<String>,
    /// Inbound `x-*` headers passed through to destinations.
    pub forwarded_headers: Vec<(String, String)>,
    pub origin_ip: Option<String>,
    pub test: bool,
}

/// Concurrent fan-out of one payload to a frozen destination list.
#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    settings: DispatchConfig,
}

impl Dispatcher {
    pub fn new(settings: DispatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &DispatchConfig {
        &self.settings
    }

    /// Deliver to every destination in parallel and wait for all of them to settle.
    ///
    /// The returned list has one entry per destination, in the order of `destinations`,
    /// regardless of completion order. Failures of any kind are reported as
    /// [`DeliveryOutcome::Failure`] values; this never errors.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        destinations: Arc<[Destination]>,
    ) -> Vec<DestinationResult> {
        if destinations.is_empty() {
            return Vec::new();
        }

        let request = Arc::new(request);
        let handles: Vec<_> = destinations
            .iter()
            .map(|destination| {
                let client = self.client.clone();
                let request = request.clone();
                let destination = destination.clone();
                let timeout_ms = destination
                    .effective_timeout_ms(self.settings.default_timeout_ms, self.settings.ceiling_ms);
                let snippet_len = self.settings.body_snippet_len;
                tokio::spawn(async move {
                    deliver(&client, &request, &destination, timeout_ms, snippet_len).await
                })
            })
            .collect();

        let settled = join_all(handles).await;

        destinations
            .iter()
            .zip(settled)
            .map(|(destination, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    tracing::error!(
                        "Delivery task for destination {} did not complete: {}",
                        destination.id,
                        e
                    );
                    DeliveryOutcome::Failure {
                        kind: FailureKind::Unknown,
                        status: 0,
                        message: format!("delivery task aborted: {}", e),
                        response_time_ms: 0,
                        body_snippet: None,
                        headers: None,
                    }
                });
                DestinationResult {
                    destination: destination.clone(),
                    outcome,
                }
            })
            .collect()
    }
}

async fn deliver(
    client: &reqwest::Client,
    request: &DispatchRequest,
    destination: &Destination,
    timeout_ms: u64,
    snippet_len: usize,
) -> DeliveryOutcome {
    let started = Instant::now();

    let call = async {
        let response = build_request(client, request, destination).send().await?;
        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response.text().await?;
        Ok::<_, reqwest::Error>((status, headers, body))
    };

    let outcome = match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
        Err(_) => DeliveryOutcome::Failure {
            kind: FailureKind::Timeout,
            status: 0,
            message: format!("Request timed out after {}ms", timeout_ms),
            response_time_ms: timeout_ms,
            body_snippet: None,
            headers: None,
        },
        Ok(Err(e)) => DeliveryOutcome::Failure {
            kind: classify_error(&e),
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            message: e.to_string(),
            response_time_ms: elapsed_ms(started).min(timeout_ms),
            body_snippet: None,
            headers: None,
        },
        Ok(Ok((status, headers, body))) => {
            let response_time_ms = elapsed_ms(started);
            let body_snippet = truncate_chars(&body, snippet_len);
            if status.is_success() {
                DeliveryOutcome::Success {
                    status: status.as_u16(),
                    response_time_ms,
                    body_snippet,
                    headers,
                }
            } else {
                DeliveryOutcome::Failure {
                    kind: FailureKind::HttpError,
                    status: status.as_u16(),
                    message: format!(
                        "HTTP {} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("")
                    )
                    .trim_end()
                    .to_string(),
                    response_time_ms,
                    body_snippet: Some(body_snippet),
                    headers: Some(headers),
                }
            }
        }
    };

    match &outcome {
        DeliveryOutcome::Success {
            status,
            response_time_ms,
            ..
        } => tracing::debug!(
            "Delivered {} -> {} ({}, {}ms)",
            request.correlation_id,
            destination.url,
            status,
            response_time_ms
        ),
        DeliveryOutcome::Failure { kind, message, .. } => tracing::warn!(
            "Delivery {} -> {} failed [{}]: {}",
            request.correlation_id,
            destination.url,
            kind,
            message
        ),
    }

    outcome
}

fn build_request(
    client: &reqwest::Client,
    request: &DispatchRequest,
    destination: &Destination,
) -> reqwest::RequestBuilder {
    let content_type = request
        .content_type
        .as_deref()
        .unwrap_or("application/json");

    let mut builder = client.post(&destination.url);

    for (name, value) in &request.forwarded_headers {
        if !is_provenance_header(name) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    builder = builder
        .header(CONTENT_TYPE, content_type)
        .header(HEADER_ENDPOINT, request.endpoint_slug.as_str())
        .header(HEADER_DELIVERY, request.correlation_id.as_str())
        .header(HEADER_DESTINATION, destination.id.to_string());

    if let Some(ref ip) = request.origin_ip {
        builder = builder.header(HEADER_FORWARDED_FOR, ip.as_str());
    }
    if request.test {
        builder = builder.header(HEADER_TEST, "true");
    }

    builder.body(request.payload.clone())
}

fn is_provenance_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    [
        HEADER_ENDPOINT,
        HEADER_DELIVERY,
        HEADER_DESTINATION,
        HEADER_TEST,
        HEADER_FORWARDED_FOR,
    ]
    .contains(&name.as_str())
}

pub fn classify_error(e: &reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_connect() {
        FailureKind::ConnectionRefused
    } else {
        FailureKind::Unknown
    }
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Keep at most `max` characters, cutting on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
