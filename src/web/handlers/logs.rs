use crate::services::delivery_log::{self, EventDetail, EventFilter, EventPage, StatusFilter};
use crate::services::stats::{self, DeliveryStats, EndpointUsage, StatsRange};
use crate::web::error::{AppError, AppResult};
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query string for `GET /logs-webhook`. Every field arrives as text so that empty values from
/// form-driven clients (`?slug=&status=`) are treated as absent rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub slug: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EndpointUsageResponse {
    pub range: StatsRange,
    pub endpoints: Vec<EndpointUsage>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number(name: &str, value: Option<String>) -> AppResult<Option<usize>> {
    non_empty(value)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| AppError::bad_request(format!("'{}' must be a positive integer", name)))
        })
        .transpose()
}

fn parse_range(value: Option<String>) -> AppResult<StatsRange> {
    match non_empty(value) {
        None => Ok(StatsRange::default()),
        Some(v) => StatsRange::parse(&v).ok_or_else(|| {
            AppError::bad_request(format!(
                "Unknown range '{}': expected one of 1h, 24h, 7d, 30d",
                v
            ))
        }),
    }
}

/// GET /logs-webhook
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogQuery>,
) -> AppResult<Json<EventPage>> {
    let status = non_empty(query.status)
        .map(|s| {
            StatusFilter::parse(&s)
                .ok_or_else(|| AppError::bad_request(format!("Unknown status filter '{}'", s)))
        })
        .transpose()?;

    let filter = EventFilter {
        slug: non_empty(query.slug),
        status,
        start_date: non_empty(query.start_date),
        end_date: non_empty(query.end_date),
        search: non_empty(query.search),
    };

    let (page, limit) = delivery_log::paginate(
        parse_number("page", query.page)?,
        parse_number("limit", query.limit)?,
        state.config.logs.default_page_size,
        state.config.logs.max_page_size,
    );

    let result = delivery_log::query_events(&state.db, &filter, page, limit)?;
    Ok(Json(result))
}

/// GET /logs-webhook/:id
pub async fn get_log(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<EventDetail>> {
    match delivery_log::get_event(&state.db, id)? {
        Some(detail) => Ok(Json(detail)),
        None => Err(AppError::not_found(format!("Log entry {} not found", id))),
    }
}

/// GET /logs-webhook/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<DeliveryStats>> {
    let range = parse_range(query.range)?;
    Ok(Json(stats::get_stats(&state.db, range)?))
}

/// GET /logs-webhook/stats/by-endpoint
pub async fn stats_by_endpoint(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<EndpointUsageResponse>> {
    let range = parse_range(query.range)?;
    let endpoints = stats::get_endpoint_usage(&state.db, range)?;
    Ok(Json(EndpointUsageResponse { range, endpoints }))
}
