use super::Destination;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    HttpError,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection-refused",
            Self::HttpError => "http-error",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "timeout" => Some(Self::Timeout),
            "connection-refused" => Some(Self::ConnectionRefused),
            "http-error" => Some(Self::HttpError),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settled result of one delivery. Every destination task produces exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Success {
        status: u16,
        response_time_ms: u64,
        body_snippet: String,
        headers: BTreeMap<String, String>,
    },
    Failure {
        kind: FailureKind,
        /// 0 when no response was received.
        status: u16,
        message: String,
        response_time_ms: u64,
        body_snippet: Option<String>,
        headers: Option<BTreeMap<String, String>>,
    },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => *status,
        }
    }

    pub fn response_time_ms(&self) -> u64 {
        match self {
            Self::Success {
                response_time_ms, ..
            }
            | Self::Failure {
                response_time_ms, ..
            } => *response_time_ms,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    pub fn body_snippet(&self) -> Option<&str> {
        match self {
            Self::Success { body_snippet, .. } => Some(body_snippet),
            Self::Failure { body_snippet, .. } => body_snippet.as_deref(),
        }
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Success { headers, .. } => Some(headers),
            Self::Failure { headers, .. } => headers.as_ref(),
        }
    }
}

/// A delivery outcome paired with the destination snapshot it was produced for.
#[derive(Debug, Clone)]
pub struct DestinationResult {
    pub destination: Destination,
    pub outcome: DeliveryOutcome,
}
