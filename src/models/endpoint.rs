use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Destination {
    pub id: i64,
    pub endpoint_id: i64,
    pub name: String,
    pub url: String,
    pub active: bool,
    #[serde(rename = "order")]
    pub position: i64,
    /// 0 means "use the configured default".
    pub timeout_ms: i64,
    pub max_retries: i64,
}

impl Destination {
    /// The timeout that applies to a delivery, given the configured default and ceiling.
    pub fn effective_timeout_ms(&self, default_ms: u64, ceiling_ms: u64) -> u64 {
        let own = if self.timeout_ms > 0 {
            self.timeout_ms as u64
        } else {
            default_ms
        };
        own.min(ceiling_ms)
    }
}

/// Input for registering a destination under an endpoint.
#[derive(Debug, Clone)]
pub struct NewDestination {
    pub endpoint_id: i64,
    pub name: String,
    pub url: String,
    pub position: i64,
    pub timeout_ms: i64,
    pub max_retries: i64,
}
