#[cfg(test)]
mod tests {
    use crate::models::{DeliveryOutcome, Destination, DestinationResult, FailureKind};

    fn destination(id: i64, name: &str) -> Destination {
        Destination {
            id,
            endpoint_id: 1,
            name: name.to_string(),
            url: format!("http://127.0.0.1:9/{}", name),
            active: true,
            position: id,
            timeout_ms: 5000,
            max_retries: 0,
        }
    }

    fn success(id: i64, name: &str, response_time_ms: u64) -> DestinationResult {
        DestinationResult {
            destination: destination(id, name),
            outcome: DeliveryOutcome::Success {
                status: 200,
                response_time_ms,
                body_snippet: "ok".to_string(),
                headers: Default::default(),
            },
        }
    }

    fn failure(id: i64, name: &str, kind: FailureKind, status: u16, response_time_ms: u64) -> DestinationResult {
        DestinationResult {
            destination: destination(id, name),
            outcome: DeliveryOutcome::Failure {
                kind,
                status,
                message: format!("{} failed", name),
                response_time_ms,
                body_snippet: None,
                headers: None,
            },
        }
    }

    mod slug_tests {
        use crate::services::slug::{generate_slug, validate_slug};

        #[test]
        fn test_generate_slug_basic() {
            assert_eq!(generate_slug("Payment Events"), "payment-events");
        }

        #[test]
        fn test_generate_slug_unicode() {
            assert_eq!(generate_slug("Pedidos Aprovação"), "pedidos-aprovacao");
        }

        #[test]
        fn test_validate_slug() {
            assert!(validate_slug("orders"));
            assert!(validate_slug("crm-2024"));
            assert!(!validate_slug(""));
            assert!(!validate_slug("Orders"));
            assert!(!validate_slug("orders_v2"));
            assert!(!validate_slug(&"a".repeat(201)));
            assert!(validate_slug(&"a".repeat(200)));
        }
    }

    mod event_outcome_tests {
        use crate::models::EventOutcome;

        #[test]
        fn test_from_counts() {
            assert_eq!(EventOutcome::from_counts(0, 0), EventOutcome::NoDestinations);
            assert_eq!(EventOutcome::from_counts(3, 3), EventOutcome::Delivered);
            assert_eq!(EventOutcome::from_counts(2, 3), EventOutcome::Partial);
            assert_eq!(EventOutcome::from_counts(0, 3), EventOutcome::Failed);
        }

        #[test]
        fn test_status_codes() {
            assert_eq!(EventOutcome::Delivered.status_code(), 200);
            assert_eq!(EventOutcome::NoDestinations.status_code(), 200);
            assert_eq!(EventOutcome::Partial.status_code(), 207);
            assert_eq!(EventOutcome::Failed.status_code(), 502);
            assert_eq!(EventOutcome::Inactive.status_code(), 403);
            assert_eq!(EventOutcome::NotFound.status_code(), 404);
            assert_eq!(EventOutcome::Unavailable.status_code(), 503);
        }

        #[test]
        fn test_is_success_follows_status() {
            assert!(EventOutcome::Delivered.is_success());
            assert!(EventOutcome::Partial.is_success());
            assert!(EventOutcome::NoDestinations.is_success());
            assert!(!EventOutcome::Failed.is_success());
            assert!(!EventOutcome::NotFound.is_success());
        }

        #[test]
        fn test_string_forms() {
            for outcome in [
                EventOutcome::Delivered,
                EventOutcome::Partial,
                EventOutcome::Failed,
                EventOutcome::NoDestinations,
                EventOutcome::Inactive,
                EventOutcome::NotFound,
                EventOutcome::Unavailable,
            ] {
                assert_eq!(EventOutcome::from_str(outcome.as_str()), Some(outcome));
            }
            assert_eq!(EventOutcome::from_str("ok"), None);
        }
    }

    mod failure_kind_tests {
        use crate::models::FailureKind;

        #[test]
        fn test_failure_kind_strings() {
            assert_eq!(FailureKind::Timeout.as_str(), "timeout");
            assert_eq!(FailureKind::ConnectionRefused.as_str(), "connection-refused");
            assert_eq!(FailureKind::HttpError.as_str(), "http-error");
            assert_eq!(FailureKind::Unknown.as_str(), "unknown");
            assert_eq!(FailureKind::from_str("http-error"), Some(FailureKind::HttpError));
            assert_eq!(FailureKind::from_str("refused"), None);
        }

        #[test]
        fn test_failure_kind_serializes_kebab_case() {
            let json = serde_json::to_string(&FailureKind::ConnectionRefused).unwrap();
            assert_eq!(json, "\"connection-refused\"");
        }
    }

    mod destination_tests {
        use super::destination;

        #[test]
        fn test_effective_timeout_uses_own_value() {
            let d = destination(1, "a");
            assert_eq!(d.effective_timeout_ms(2000, 30000), 5000);
        }

        #[test]
        fn test_effective_timeout_zero_uses_default() {
            let mut d = destination(1, "a");
            d.timeout_ms = 0;
            assert_eq!(d.effective_timeout_ms(2000, 30000), 2000);
        }

        #[test]
        fn test_effective_timeout_capped_by_ceiling() {
            let mut d = destination(1, "a");
            d.timeout_ms = 120_000;
            assert_eq!(d.effective_timeout_ms(5000, 30000), 30000);
        }

        #[test]
        fn test_destination_serializes_position_as_order() {
            let json = serde_json::to_value(destination(3, "crm")).unwrap();
            assert_eq!(json["order"], 3);
            assert!(json.get("position").is_none());
        }
    }

    mod aggregator_tests {
        use super::{failure, success};
        use crate::models::{EventOutcome, FailureKind};
        use crate::services::aggregator::{aggregate, percentage, summarize, DeliveryStatistics};

        #[test]
        fn test_all_delivered() {
            let results = vec![success(1, "a", 120), success(2, "b", 80), success(3, "c", 100)];
            let report = aggregate(results);

            assert_eq!(
                report.statistics,
                DeliveryStatistics {
                    total: 3,
                    successful: 3,
                    failed: 0,
                    success_rate: 100,
                    avg_response_time: 100,
                }
            );
            assert_eq!(report.outcome(), EventOutcome::Delivered);
            assert_eq!(report.error_summary(), None);
        }

        #[test]
        fn test_partial_rounds_rate_and_includes_timeout_in_average() {
            let results = vec![
                success(1, "a", 100),
                failure(2, "b", FailureKind::Timeout, 0, 5000),
                success(3, "c", 200),
            ];
            let stats = summarize(&results);

            assert_eq!(stats.total, 3);
            assert_eq!(stats.successful, 2);
            assert_eq!(stats.failed, 1);
            assert_eq!(stats.success_rate, 67);
            assert_eq!(stats.avg_response_time, 1767);
        }

        #[test]
        fn test_all_failed() {
            let results = vec![
                failure(1, "a", FailureKind::HttpError, 500, 40),
                failure(2, "b", FailureKind::ConnectionRefused, 0, 2),
            ];
            let report = aggregate(results);

            assert_eq!(report.statistics.success_rate, 0);
            assert_eq!(report.outcome(), EventOutcome::Failed);
            assert_eq!(
                report.error_summary().as_deref(),
                Some("a: a failed; b: b failed")
            );
        }

        #[test]
        fn test_empty_results() {
            let report = aggregate(Vec::new());
            assert_eq!(report.statistics, DeliveryStatistics::default());
            assert_eq!(report.outcome(), EventOutcome::NoDestinations);
        }

        #[test]
        fn test_results_keep_destination_order() {
            let results = vec![
                failure(3, "third", FailureKind::Timeout, 0, 10),
                success(1, "first", 5),
                success(2, "second", 5),
            ];
            let report = aggregate(results);
            let names: Vec<&str> = report
                .results
                .iter()
                .map(|r| r.destination.name.as_str())
                .collect();
            assert_eq!(names, vec!["third", "first", "second"]);
        }

        #[test]
        fn test_statistics_serialize_camel_case() {
            let stats = summarize(&[success(1, "a", 10)]);
            let json = serde_json::to_value(stats).unwrap();
            assert_eq!(json["successRate"], 100);
            assert_eq!(json["avgResponseTime"], 10);
        }

        #[test]
        fn test_percentage() {
            assert_eq!(percentage(0, 0), 0.0);
            assert_eq!(percentage(1, 4), 25.0);
        }
    }

    mod dispatcher_tests {
        use crate::services::dispatcher::truncate_chars;

        #[test]
        fn test_truncate_chars_short_input() {
            assert_eq!(truncate_chars("hello", 10), "hello");
        }

        #[test]
        fn test_truncate_chars_cuts_on_char_boundary() {
            assert_eq!(truncate_chars("ação completa", 3), "açã");
        }

        #[test]
        fn test_truncate_chars_exact_length() {
            assert_eq!(truncate_chars("abc", 3), "abc");
        }
    }

    mod delivery_log_tests {
        use crate::models::EventOutcome;
        use crate::services::delivery_log::{paginate, StatusFilter};

        #[test]
        fn test_status_filter_parse() {
            assert_eq!(StatusFilter::parse("success"), Some(StatusFilter::Success));
            assert_eq!(StatusFilter::parse("error"), Some(StatusFilter::Error));
            assert_eq!(
                StatusFilter::parse("partial"),
                Some(StatusFilter::Outcome(EventOutcome::Partial))
            );
            assert_eq!(StatusFilter::parse("bogus"), None);
        }

        #[test]
        fn test_paginate_defaults() {
            assert_eq!(paginate(None, None, 20, 100), (1, 20));
        }

        #[test]
        fn test_paginate_clamps() {
            assert_eq!(paginate(Some(0), Some(500), 20, 100), (1, 100));
            assert_eq!(paginate(Some(3), Some(0), 20, 100), (3, 1));
            assert_eq!(paginate(Some(2), Some(10), 20, 100), (2, 10));
        }

        #[test]
        fn test_paginate_keeps_huge_page() {
            assert_eq!(paginate(Some(usize::MAX), Some(20), 20, 100), (usize::MAX, 20));
        }
    }

    mod stats_tests {
        use crate::services::stats::StatsRange;

        #[test]
        fn test_range_parse() {
            assert_eq!(StatsRange::parse("1h"), Some(StatsRange::LastHour));
            assert_eq!(StatsRange::parse("24h"), Some(StatsRange::Last24Hours));
            assert_eq!(StatsRange::parse("7d"), Some(StatsRange::Last7Days));
            assert_eq!(StatsRange::parse("30d"), Some(StatsRange::Last30Days));
            assert_eq!(StatsRange::parse("1y"), None);
        }

        #[test]
        fn test_range_default_is_24h() {
            assert_eq!(StatsRange::default().as_str(), "24h");
            assert_eq!(StatsRange::default().duration(), chrono::Duration::hours(24));
        }
    }

    mod ingest_tests {
        use crate::services::ingest::{origin_ip, synthetic_payload};
        use axum::http::HeaderMap;
        use std::net::{IpAddr, Ipv4Addr};

        #[test]
        fn test_origin_ip_prefers_forwarded_for() {
            let mut headers = HeaderMap::new();
            headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
            headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
            let peer = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));

            assert_eq!(origin_ip(&headers, peer).as_deref(), Some("203.0.113.7"));
        }

        #[test]
        fn test_origin_ip_falls_back_to_peer() {
            let headers = HeaderMap::new();
            let peer = Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
            assert_eq!(origin_ip(&headers, peer).as_deref(), Some("192.0.2.1"));
            assert_eq!(origin_ip(&headers, None), None);
        }

        #[test]
        fn test_synthetic_payload_marks_test() {
            let payload = synthetic_payload("orders", chrono::Utc::now());
            assert_eq!(payload["test"], true);
            assert_eq!(payload["endpoint"], "orders");
        }
    }

    mod config_tests {
        use crate::Config;

        #[test]
        fn test_defaults() {
            let config = Config::default();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.dispatch.default_timeout_ms, 5000);
            assert_eq!(config.dispatch.ceiling_ms, 30000);
            assert_eq!(config.logs.default_page_size, 20);
            assert_eq!(config.logs.retention_days, 0);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_partial_toml_fills_defaults() {
            let config: Config = toml::from_str(
                r#"
                [dispatch]
                default_timeout_ms = 2000
                "#,
            )
            .unwrap();
            assert_eq!(config.dispatch.default_timeout_ms, 2000);
            assert_eq!(config.dispatch.ceiling_ms, 30000);
            assert_eq!(config.server.host, "127.0.0.1");
        }

        #[test]
        fn test_validate_rejects_default_above_ceiling() {
            let mut config = Config::default();
            config.dispatch.default_timeout_ms = 60000;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_default_config_round_trips_through_toml() {
            let text = toml::to_string_pretty(&Config::default()).unwrap();
            let parsed: Config = toml::from_str(&text).unwrap();
            assert_eq!(parsed.database.path, Config::default().database.path);
        }
    }
}
