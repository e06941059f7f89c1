//! Threshold-based severity classification
//!
//! Thresholds are exclusive lower bounds checked from critical down to medium:
//! a value exactly equal to a threshold does not reach that level. The same
//! thresholds drive performance issues and the textual recommendations.

use crate::config::{SeverityThresholds, ThresholdsConfig};
use crate::models::{round_to, EndpointStats, PerformanceIssue, Severity};

pub fn classify(value: f64, thresholds: &SeverityThresholds) -> Severity {
    if value > thresholds.critical {
        Severity::Critical
    } else if value > thresholds.high {
        Severity::High
    } else if value > thresholds.medium {
        Severity::Medium
    } else {
        Severity::None
    }
}

/// Slow-endpoint and error-rate issues, per endpoint in stats order
pub fn detect_performance_issues(
    endpoint_stats: &[EndpointStats],
    thresholds: &ThresholdsConfig,
) -> Vec<PerformanceIssue> {
    let mut issues = Vec::new();
    for stats in endpoint_stats {
        let severity = classify(stats.avg_response_time_ms, &thresholds.response_time_ms);
        if severity != Severity::None {
            issues.push(PerformanceIssue::SlowEndpoint {
                endpoint: stats.endpoint.clone(),
                avg_response_time_ms: stats.avg_response_time_ms,
                threshold_ms: thresholds.response_time_ms.medium,
                severity,
            });
        }

        let error_rate = stats.error_rate_percentage();
        let severity = classify(error_rate, &thresholds.error_rate_percent);
        if severity != Severity::None {
            issues.push(PerformanceIssue::HighErrorRate {
                endpoint: stats.endpoint.clone(),
                error_rate_percentage: round_to(error_rate, 3),
                severity,
            });
        }
    }
    issues
}

pub fn recommendations(endpoint_stats: &[EndpointStats], thresholds: &ThresholdsConfig) -> Vec<String> {
    let slow_ms = thresholds.response_time_ms.medium;
    let mut recs = Vec::new();
    for stats in endpoint_stats {
        if stats.avg_response_time_ms > slow_ms {
            recs.push(format!(
                "Investigate {} performance (avg {}ms exceeds {}ms threshold)",
                stats.endpoint,
                decimal_text(stats.avg_response_time_ms),
                slow_ms
            ));
        }
        let error_rate = stats.error_rate_percentage();
        if error_rate > thresholds.error_rate_percent.medium {
            recs.push(format!(
                "Alert: {} has {}% error rate",
                stats.endpoint,
                decimal_text(round_to(error_rate, 3))
            ));
        }
    }
    recs
}

/// Measured values always show a fractional part ("900.0", "33.333")
fn decimal_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn stats(endpoint: &str, avg: f64, count: usize, errors: usize) -> EndpointStats {
        EndpointStats {
            endpoint: endpoint.to_string(),
            request_count: count,
            avg_response_time_ms: avg,
            slowest_request_ms: avg as u64,
            fastest_request_ms: avg as u64,
            error_count: errors,
            most_common_status: Some(200),
        }
    }

    #[test]
    fn test_classify_boundaries_are_exclusive() {
        let t = Config::default().thresholds.response_time_ms;
        assert_eq!(classify(500.0, &t), Severity::None);
        assert_eq!(classify(500.001, &t), Severity::Medium);
        assert_eq!(classify(1000.0, &t), Severity::Medium);
        assert_eq!(classify(1000.5, &t), Severity::High);
        assert_eq!(classify(2000.0, &t), Severity::High);
        assert_eq!(classify(2000.1, &t), Severity::Critical);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let t = Config::default().thresholds.error_rate_percent;
        let mut previous = Severity::None;
        for step in 0..400 {
            let severity = classify(step as f64 * 0.1, &t);
            assert!(severity >= previous);
            previous = severity;
        }
        assert_eq!(classify(1e9, &t), Severity::Critical);
    }

    #[test]
    fn test_performance_issues_both_axes() {
        let thresholds = Config::default().thresholds;
        let endpoint_stats = vec![
            stats("/fast", 100.0, 100, 0),
            stats("/reports", 2050.5, 10, 0),
            stats("/payments", 900.0, 20, 3),
        ];
        let issues = detect_performance_issues(&endpoint_stats, &thresholds);
        assert_eq!(issues.len(), 3);
        assert_eq!(
            issues[0],
            PerformanceIssue::SlowEndpoint {
                endpoint: "/reports".to_string(),
                avg_response_time_ms: 2050.5,
                threshold_ms: 500.0,
                severity: Severity::Critical,
            }
        );
        assert_eq!(issues[1].endpoint(), "/payments");
        assert_eq!(issues[1].severity(), Severity::Medium);
        // 3/20 = 15% is not above the 15% critical bound
        assert_eq!(
            issues[2],
            PerformanceIssue::HighErrorRate {
                endpoint: "/payments".to_string(),
                error_rate_percentage: 15.0,
                severity: Severity::High,
            }
        );
    }

    #[test]
    fn test_recommendations_text() {
        let thresholds = Config::default().thresholds;
        let recs = recommendations(&[stats("/payments", 900.25, 3, 1)], &thresholds);
        assert_eq!(
            recs,
            vec![
                "Investigate /payments performance (avg 900.25ms exceeds 500ms threshold)".to_string(),
                "Alert: /payments has 33.333% error rate".to_string(),
            ]
        );
    }

    #[test]
    fn test_recommendations_keep_decimal_point() {
        let thresholds = Config::default().thresholds;
        let recs = recommendations(&[stats("/export", 900.0, 10, 1)], &thresholds);
        assert_eq!(
            recs,
            vec![
                "Investigate /export performance (avg 900.0ms exceeds 500ms threshold)".to_string(),
                "Alert: /export has 10.0% error rate".to_string(),
            ]
        );
    }
}
