use crate::models::{DestinationResult, EventOutcome};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Whole percent; 0 when there were no deliveries.
    pub success_rate: u32,
    /// Mean response time in whole milliseconds; 0 when there were no deliveries.
    pub avg_response_time: u64,
}

/// Summary plus per-destination detail, in configured destination order.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub statistics: DeliveryStatistics,
    pub results: Vec<DestinationResult>,
}

impl DispatchReport {
    pub fn outcome(&self) -> EventOutcome {
        EventOutcome::from_counts(self.statistics.successful, self.statistics.total)
    }

    /// One line per failed destination, or `None` when everything succeeded.
    pub fn error_summary(&self) -> Option<String> {
        let failures: Vec<String> = self
            .results
            .iter()
            .filter_map(|r| {
                r.outcome
                    .error_message()
                    .map(|msg| format!("{}: {}", r.destination.name, msg))
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        }
    }
}

pub fn summarize(results: &[DestinationResult]) -> DeliveryStatistics {
    let total = results.len();
    if total == 0 {
        return DeliveryStatistics::default();
    }

    let successful = results.iter().filter(|r| r.outcome.is_success()).count();
    let total_time: u64 = results.iter().map(|r| r.outcome.response_time_ms()).sum();

    DeliveryStatistics {
        total,
        successful,
        failed: total - successful,
        success_rate: percentage(successful as i64, total as i64).round() as u32,
        avg_response_time: (total_time as f64 / total as f64).round() as u64,
    }
}

pub fn aggregate(results: Vec<DestinationResult>) -> DispatchReport {
    DispatchReport {
        statistics: summarize(&results),
        results,
    }
}

/// `100 * part / whole`, or 0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}
