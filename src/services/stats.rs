use crate::db::{format_timestamp, Database};
use crate::services::aggregator::percentage;
use crate::services::delivery_log::QueryError;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum StatsRange {
    #[serde(rename = "1h")]
    LastHour,
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl StatsRange {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Self::LastHour),
            "24h" => Some(Self::Last24Hours),
            "7d" => Some(Self::Last7Days),
            "30d" => Some(Self::Last30Days),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        match self {
            Self::LastHour => chrono::Duration::hours(1),
            Self::Last24Hours => chrono::Duration::hours(24),
            Self::Last7Days => chrono::Duration::days(7),
            Self::Last30Days => chrono::Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryStats {
    pub range: StatsRange,
    pub since: String,
    pub total_events: i64,
    pub events_today: i64,
    pub successful: i64,
    pub failed: i64,
    pub success_rate: u32,
    pub avg_response_time_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointUsage {
    pub endpoint_slug: String,
    pub endpoint_name: String,
    pub active: bool,
    pub usage_count: i64,
    pub successful: i64,
    pub failed: i64,
    pub success_rate: u32,
    pub avg_response_time_ms: i64,
    pub last_received_at: Option<String>,
}

/// Aggregate counters over `range`. `events_today` counts from local midnight instead.
pub fn get_stats(db: &Database, range: StatsRange) -> Result<DeliveryStats, QueryError> {
    let now = Utc::now();
    let since = format_timestamp(now - range.duration());
    let today_start = local_day_start(now);

    let conn = db.get()?;

    let (total_events, successful, failed, avg_response): (i64, i64, i64, Option<f64>) = conn
        .query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status BETWEEN 200 AND 299 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status >= 400 THEN 1 ELSE 0 END), 0),
                AVG(response_time_ms)
            FROM webhook_events
            WHERE received_at >= ?1
            "#,
            [&since],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

    let events_today: i64 = conn.query_row(
        "SELECT COUNT(*) FROM webhook_events WHERE received_at >= ?1",
        [&today_start],
        |row| row.get(0),
    )?;

    Ok(DeliveryStats {
        range,
        since,
        total_events,
        events_today,
        successful,
        failed,
        success_rate: percentage(successful, total_events).round() as u32,
        avg_response_time_ms: avg_response.map(|v| v.round() as i64).unwrap_or(0),
    })
}

/// Usage of every registered endpoint over `range`, busiest first. Endpoints with no traffic
/// are listed with zero counts.
pub fn get_endpoint_usage(db: &Database, range: StatsRange) -> Result<Vec<EndpointUsage>, QueryError> {
    let since = format_timestamp(Utc::now() - range.duration());
    let conn = db.get()?;

    let mut stmt = conn.prepare(
        r#"
        SELECT
            p.slug,
            p.name,
            p.active,
            COUNT(e.id) AS usage_count,
            COALESCE(SUM(CASE WHEN e.status BETWEEN 200 AND 299 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN e.status >= 400 THEN 1 ELSE 0 END), 0),
            AVG(e.response_time_ms),
            MAX(e.received_at)
        FROM endpoints p
        LEFT JOIN webhook_events e
            ON e.endpoint_slug = p.slug AND e.received_at >= ?1
        GROUP BY p.id
        ORDER BY usage_count DESC, p.slug
        "#,
    )?;

    let usage = stmt
        .query_map([&since], |row| {
            let usage_count: i64 = row.get(3)?;
            let successful: i64 = row.get(4)?;
            Ok(EndpointUsage {
                endpoint_slug: row.get(0)?,
                endpoint_name: row.get(1)?,
                active: row.get(2)?,
                usage_count,
                successful,
                failed: row.get(5)?,
                success_rate: percentage(successful, usage_count).round() as u32,
                avg_response_time_ms: row
                    .get::<_, Option<f64>>(6)?
                    .map(|v| v.round() as i64)
                    .unwrap_or(0),
                last_received_at: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(usage)
}

/// Start of the current local calendar day, in stored timestamp form.
fn local_day_start(now: DateTime<Utc>) -> String {
    let local_now = now.with_timezone(&Local);
    let midnight = local_now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc));

    match midnight {
        Some(ts) => format_timestamp(ts),
        // A DST gap swallowed local midnight; fall back to the UTC day.
        None => format!("{}T00:00:00.000Z", now.format("%Y-%m-%d")),
    }
}
