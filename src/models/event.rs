use serde::{Deserialize, Serialize};

/// Terminal classification of one inbound event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Delivered,
    Partial,
    Failed,
    NoDestinations,
    Inactive,
    NotFound,
    /// Endpoint configuration could not be read.
    Unavailable,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::NoDestinations => "no_destinations",
            Self::Inactive => "inactive",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "delivered" => Some(Self::Delivered),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            "no_destinations" => Some(Self::NoDestinations),
            "inactive" => Some(Self::Inactive),
            "not_found" => Some(Self::NotFound),
            "unavailable" => Some(Self::Unavailable),
            _ => None,
        }
    }

    /// The status recorded for the event and returned to the webhook sender.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Delivered | Self::NoDestinations => 200,
            Self::Partial => 207,
            Self::Failed => 502,
            Self::Inactive => 403,
            Self::NotFound => 404,
            Self::Unavailable => 503,
        }
    }

    pub fn from_counts(successful: usize, total: usize) -> Self {
        if total == 0 {
            Self::NoDestinations
        } else if successful == total {
            Self::Delivered
        } else if successful == 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub id: i64,
    pub correlation_id: String,
    pub endpoint_slug: String,
    pub endpoint_id: Option<i64>,
    pub received_at: String,
    pub payload: String,
    pub headers: serde_json::Value,
    pub status: i64,
    pub outcome: String,
    pub destinations_reached: i64,
    pub response_time_ms: i64,
    pub error_message: Option<String>,
    pub origin_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl WebhookEvent {
    pub fn outcome_enum(&self) -> Option<EventOutcome> {
        EventOutcome::from_str(&self.outcome)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryAttempt {
    pub id: i64,
    pub event_id: i64,
    pub destination_id: i64,
    pub destination_name: String,
    pub destination_url: String,
    pub position: i64,
    pub success: bool,
    pub status_code: i64,
    pub response_time_ms: i64,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub response_body: Option<String>,
    pub response_headers: Option<serde_json::Value>,
    pub attempt_number: i64,
    pub max_retries: i64,
    pub created_at: String,
}
