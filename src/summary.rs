//! Overall traffic views: summary totals, hourly distribution and top users

use crate::aggregator::OrderedCounter;
use crate::models::{format_timestamp, round_to, CanonicalRequest, Summary, TimeRange, TopUser};
use std::collections::BTreeMap;

pub fn summarize(requests: &[CanonicalRequest]) -> Summary {
    let total = requests.len();
    let (Some(start), Some(end)) = (
        requests.iter().map(|r| r.timestamp).min(),
        requests.iter().map(|r| r.timestamp).max(),
    ) else {
        return Summary {
            total_requests: 0,
            time_range: TimeRange { start: None, end: None },
            avg_response_time_ms: 0.0,
            error_rate_percentage: 0.0,
        };
    };

    let sum_rt: u128 = requests.iter().map(|r| u128::from(r.response_time_ms)).sum();
    let errors = requests.iter().filter(|r| r.is_error()).count();

    Summary {
        total_requests: total,
        time_range: TimeRange {
            start: Some(format_timestamp(&start)),
            end: Some(format_timestamp(&end)),
        },
        avg_response_time_ms: round_to(sum_rt as f64 / total as f64, 3),
        error_rate_percentage: round_to(errors as f64 / total as f64 * 100.0, 3),
    }
}

/// Request counts keyed by UTC hour ("HH:00"), sorted by hour
pub fn hourly_distribution(requests: &[CanonicalRequest]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for request in requests {
        *distribution
            .entry(request.timestamp.format("%H:00").to_string())
            .or_insert(0) += 1;
    }
    distribution
}

/// The `n` busiest users; ties keep first-encountered order
pub fn top_users(requests: &[CanonicalRequest], n: usize) -> Vec<TopUser> {
    user_counts(requests)
        .most_common(n)
        .into_iter()
        .map(|(user_id, request_count)| TopUser {
            user_id: user_id.to_string(),
            request_count,
        })
        .collect()
}

pub(crate) fn user_counts(requests: &[CanonicalRequest]) -> OrderedCounter<&str> {
    let mut counts = OrderedCounter::new();
    for request in requests {
        counts.increment(request.user_id.as_str());
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn request(minutes: i64, user: &str, rt: u64, status: u64) -> CanonicalRequest {
        CanonicalRequest {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
                + Duration::minutes(minutes),
            endpoint: "/api/users".to_string(),
            method: "GET".to_string(),
            response_time_ms: rt,
            status_code: status,
            user_id: user.to_string(),
            request_size_bytes: 1,
            response_size_bytes: 1,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.time_range, TimeRange { start: None, end: None });
        assert_eq!(summary.avg_response_time_ms, 0.0);
        assert_eq!(summary.error_rate_percentage, 0.0);
    }

    #[test]
    fn test_summary_values() {
        let requests = vec![
            request(30, "u1", 100, 200),
            request(0, "u2", 200, 500),
            request(90, "u1", 100, 200),
        ];
        let summary = summarize(&requests);
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.time_range.start.as_deref(), Some("2025-01-15T10:00:00Z"));
        assert_eq!(summary.time_range.end.as_deref(), Some("2025-01-15T11:30:00Z"));
        assert_eq!(summary.avg_response_time_ms, 133.333);
        assert_eq!(summary.error_rate_percentage, 33.333);
    }

    #[test]
    fn test_hourly_distribution_sorted() {
        let requests = vec![request(90, "u1", 1, 200), request(0, "u1", 1, 200), request(5, "u1", 1, 200)];
        let distribution = hourly_distribution(&requests);
        let keys: Vec<_> = distribution.keys().cloned().collect();
        assert_eq!(keys, vec!["10:00", "11:00"]);
        assert_eq!(distribution["10:00"], 2);
    }

    #[test]
    fn test_top_users_ranking_and_ties() {
        let requests = vec![
            request(0, "carol", 1, 200),
            request(1, "alice", 1, 200),
            request(2, "bob", 1, 200),
            request(3, "bob", 1, 200),
            request(4, "alice", 1, 200),
        ];
        let top = top_users(&requests, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user_id, "alice");
        assert_eq!(top[0].request_count, 2);
        assert_eq!(top[1].user_id, "bob");
    }
}
