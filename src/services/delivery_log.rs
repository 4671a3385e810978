use crate::db::{format_timestamp, Database};
use crate::models::{DeliveryAttempt, DestinationResult, EventOutcome, WebhookEvent};
use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use rusqlite::{OptionalExtension, Row};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{0}")]
    InvalidFilter(String),
    #[error("Log store unavailable: {0}")]
    Store(#[from] anyhow::Error),
    #[error("Log query failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Everything about an inbound event except its per-destination attempts.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub correlation_id: String,
    pub endpoint_slug: String,
    pub endpoint_id: Option<i64>,
    pub received_at: DateTime<Utc>,
    pub payload: String,
    pub headers: serde_json::Value,
    pub outcome: EventOutcome,
    pub response_time_ms: u64,
    pub error_message: Option<String>,
    pub origin_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Append one event and its attempts. `destinations_reached` is always `results.len()`.
pub fn record_event(db: &Database, record: &EventRecord, results: &[DestinationResult]) -> Result<i64> {
    let mut conn = db.get()?;
    let tx = conn.transaction()?;

    tx.execute(
        r#"
        INSERT INTO webhook_events (
            correlation_id, endpoint_slug, endpoint_id, received_at, payload, headers,
            status, outcome, destinations_reached, response_time_ms, error_message,
            origin_ip, user_agent
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
        rusqlite::params![
            record.correlation_id,
            record.endpoint_slug,
            record.endpoint_id,
            format_timestamp(record.received_at),
            record.payload,
            record.headers.to_string(),
            record.outcome.status_code() as i64,
            record.outcome.as_str(),
            results.len() as i64,
            record.response_time_ms as i64,
            record.error_message,
            record.origin_ip,
            record.user_agent,
        ],
    )?;
    let event_id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO delivery_attempts (
                event_id, destination_id, destination_name, destination_url, position,
                success, status_code, response_time_ms, error_kind, error_message,
                response_body, response_headers, attempt_number, max_retries
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13)
            "#,
        )?;

        for (position, result) in results.iter().enumerate() {
            let outcome = &result.outcome;
            let headers_json = outcome
                .headers()
                .map(|h| serde_json::to_string(h))
                .transpose()?;
            stmt.execute(rusqlite::params![
                event_id,
                result.destination.id,
                result.destination.name,
                result.destination.url,
                position as i64,
                outcome.is_success(),
                outcome.status() as i64,
                outcome.response_time_ms() as i64,
                outcome.failure_kind().map(|k| k.as_str()),
                outcome.error_message(),
                outcome.body_snippet(),
                headers_json,
                result.destination.max_retries,
            ])?;
        }
    }

    tx.commit()?;
    Ok(event_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// 2xx
    Success,
    /// 400 and above
    Error,
    Outcome(EventOutcome),
}

impl StatusFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            other => EventOutcome::from_str(other).map(Self::Outcome),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub slug: Option<String>,
    pub status: Option<StatusFilter>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub logs: Vec<WebhookEvent>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub log: WebhookEvent,
    pub attempts: Vec<DeliveryAttempt>,
}

/// Clamp page and limit to their allowed ranges.
pub fn paginate(
    page: Option<usize>,
    limit: Option<usize>,
    default_size: usize,
    max_size: usize,
) -> (usize, usize) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_size).min(max_size).max(1);
    (page, limit)
}

/// Row offset for `page`, or an error when it does not fit SQLite's signed 64-bit OFFSET.
fn page_offset(page: usize, limit: usize) -> Result<i64, QueryError> {
    page.saturating_sub(1)
        .checked_mul(limit)
        .and_then(|offset| i64::try_from(offset).ok())
        .ok_or_else(|| QueryError::InvalidFilter(format!("page {} is out of range", page)))
}

const EVENT_COLUMNS: &str = "id, correlation_id, endpoint_slug, endpoint_id, received_at, payload, \
     headers, status, outcome, destinations_reached, response_time_ms, error_message, origin_ip, user_agent";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<WebhookEvent> {
    Ok(WebhookEvent {
        id: row.get(0)?,
        correlation_id: row.get(1)?,
        endpoint_slug: row.get(2)?,
        endpoint_id: row.get(3)?,
        received_at: row.get(4)?,
        payload: row.get(5)?,
        headers: row
            .get::<_, String>(6)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(json!({})),
        status: row.get(7)?,
        outcome: row.get(8)?,
        destinations_reached: row.get(9)?,
        response_time_ms: row.get(10)?,
        error_message: row.get(11)?,
        origin_ip: row.get(12)?,
        user_agent: row.get(13)?,
    })
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<DeliveryAttempt> {
    Ok(DeliveryAttempt {
        id: row.get(0)?,
        event_id: row.get(1)?,
        destination_id: row.get(2)?,
        destination_name: row.get(3)?,
        destination_url: row.get(4)?,
        position: row.get(5)?,
        success: row.get(6)?,
        status_code: row.get(7)?,
        response_time_ms: row.get(8)?,
        error_kind: row.get(9)?,
        error_message: row.get(10)?,
        response_body: row.get(11)?,
        response_headers: row
            .get::<_, Option<String>>(12)?
            .and_then(|s| serde_json::from_str(&s).ok()),
        attempt_number: row.get(13)?,
        max_retries: row.get(14)?,
        created_at: row.get(15)?,
    })
}

pub fn query_events(
    db: &Database,
    filter: &EventFilter,
    page: usize,
    limit: usize,
) -> Result<EventPage, QueryError> {
    let (where_clause, params) = build_filter_clause(filter)?;
    let offset = page_offset(page, limit)?;

    tracing::debug!("Log query: where='{}', page={}, limit={}", where_clause, page, limit);

    let conn = db.get()?;

    let total: i64 = {
        let sql = format!("SELECT COUNT(*) FROM webhook_events {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            params.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?
    };

    let sql = format!(
        "SELECT {} FROM webhook_events {} ORDER BY received_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        EVENT_COLUMNS,
        where_clause,
        params.len() + 1,
        params.len() + 2
    );

    let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn rusqlite::ToSql>)
        .collect();
    all_params.push(Box::new(limit as i64));
    all_params.push(Box::new(offset));
    let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let logs = stmt
        .query_map(param_refs.as_slice(), event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let pages = if total == 0 {
        0
    } else {
        (total + limit as i64 - 1) / limit as i64
    };

    Ok(EventPage {
        logs,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    })
}

pub fn get_event(db: &Database, id: i64) -> Result<Option<EventDetail>, QueryError> {
    let conn = db.get()?;

    let log = conn
        .query_row(
            &format!("SELECT {} FROM webhook_events WHERE id = ?1", EVENT_COLUMNS),
            [id],
            event_from_row,
        )
        .optional()?;

    let Some(log) = log else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        r#"
        SELECT id, event_id, destination_id, destination_name, destination_url, position,
               success, status_code, response_time_ms, error_kind, error_message,
               response_body, response_headers, attempt_number, max_retries, created_at
        FROM delivery_attempts
        WHERE event_id = ?1
        ORDER BY position
        "#,
    )?;
    let attempts = stmt
        .query_map([id], attempt_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(EventDetail { log, attempts }))
}

/// Remove whole events older than the retention window. Attempts go with their event.
pub fn prune_events(db: &Database, retention_days: u32) -> Result<usize> {
    if retention_days == 0 {
        return Ok(0);
    }

    let conn = db.get()?;
    let cutoff = format_timestamp(Utc::now() - chrono::Duration::days(retention_days as i64));
    let deleted = conn.execute("DELETE FROM webhook_events WHERE received_at < ?1", [&cutoff])?;

    if deleted > 0 {
        tracing::info!("Pruned {} delivery log entries older than {} days", deleted, retention_days);
    }

    Ok(deleted)
}

fn build_filter_clause(filter: &EventFilter) -> Result<(String, Vec<String>), QueryError> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(ref slug) = filter.slug {
        params.push(slug.clone());
        conditions.push(format!("endpoint_slug = ?{}", params.len()));
    }

    match filter.status {
        Some(StatusFilter::Success) => conditions.push("status BETWEEN 200 AND 299".to_string()),
        Some(StatusFilter::Error) => conditions.push("status >= 400".to_string()),
        Some(StatusFilter::Outcome(outcome)) => {
            params.push(outcome.as_str().to_string());
            conditions.push(format!("outcome = ?{}", params.len()));
        }
        None => {}
    }

    let start = filter
        .start_date
        .as_deref()
        .map(|s| parse_date_bound(s, false))
        .transpose()?;
    let end = filter
        .end_date
        .as_deref()
        .map(|s| parse_date_bound(s, true))
        .transpose()?;

    if let (Some(start), Some(end)) = (&start, &end) {
        if start > end {
            return Err(QueryError::InvalidFilter(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }

    if let Some(start) = start {
        params.push(start);
        conditions.push(format!("received_at >= ?{}", params.len()));
    }

    if let Some(end) = end {
        params.push(end);
        conditions.push(format!("received_at <= ?{}", params.len()));
    }

    if let Some(ref search) = filter.search {
        params.push(format!("%{}%", escape_like(search)));
        let n = params.len();
        conditions.push(format!(
            "(payload LIKE ?{n} ESCAPE '\\' OR error_message LIKE ?{n} ESCAPE '\\' \
             OR origin_ip LIKE ?{n} ESCAPE '\\' OR user_agent LIKE ?{n} ESCAPE '\\' \
             OR endpoint_slug LIKE ?{n} ESCAPE '\\')"
        ));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    Ok((where_clause, params))
}

/// Make `%`, `_` and `\` match literally inside a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Accepts `YYYY-MM-DD` (local calendar day; start or end of it) or an RFC 3339 timestamp.
fn parse_date_bound(value: &str, end_of_day: bool) -> Result<String, QueryError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(format_timestamp(dt.with_timezone(&Utc)));
    }

    let invalid = || {
        QueryError::InvalidFilter(format!(
            "Invalid date '{}': expected YYYY-MM-DD or an RFC 3339 timestamp",
            value
        ))
    };

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let naive = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(invalid)?;

    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(invalid)?;

    Ok(format_timestamp(local.with_timezone(&Utc)))
}
