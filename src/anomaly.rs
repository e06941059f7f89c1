//! Anomaly Detection
//!
//! Four independent heuristics over time-ordered views of the request set:
//!
//! - **Request spike**: a sliding window whose request count exceeds a multiple
//!   of the endpoint's normal per-window rate
//! - **Response-time degradation**: the most recent slice of an endpoint's
//!   requests is much slower than its full history
//! - **Error cluster**: too many error responses inside one sliding window
//! - **Unusual user behavior**: one user issues most of the traffic
//!
//! Per-endpoint views are sorted by timestamp before scanning, so findings do
//! not depend on input order. Spike and cluster scans stop at the first
//! qualifying window of each endpoint. Findings are grouped by heuristic and
//! ordered by endpoint within each group.

use crate::config::{AnomalyConfig, SeverityThresholds};
use crate::models::{format_timestamp, round_to, Anomaly, CanonicalRequest, Severity};
use crate::summary::user_counts;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rolling counts over an ascending slice of instants.
///
/// Each instant in turn is the right edge of a window reaching back `width`;
/// instants exactly `width` behind the edge are still inside. The left index
/// only moves forward, so a full pass is linear.
pub struct SlidingWindow<'a> {
    timestamps: &'a [DateTime<Utc>],
    width: Duration,
    left: usize,
    right: usize,
}

impl<'a> SlidingWindow<'a> {
    pub fn new(timestamps: &'a [DateTime<Utc>], width: Duration) -> Self {
        Self {
            timestamps,
            width,
            left: 0,
            right: 0,
        }
    }
}

impl<'a> Iterator for SlidingWindow<'a> {
    /// (window right edge, instants in window)
    type Item = (DateTime<Utc>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let edge = *self.timestamps.get(self.right)?;
        // Near the calendar's lower bound the window reaches back past every instant
        let window_start = edge.checked_sub_signed(self.width);
        while window_start.is_some_and(|start| self.timestamps[self.left] < start) {
            self.left += 1;
        }
        let count = self.right - self.left + 1;
        self.right += 1;
        Some((edge, count))
    }
}

/// Findings for one endpoint, kept apart so they can be listed by heuristic
#[derive(Debug, Default)]
struct EndpointFindings {
    spike: Option<Anomaly>,
    degradation: Option<Anomaly>,
    cluster: Option<Anomaly>,
}

pub struct AnomalyDetector<'a> {
    config: &'a AnomalyConfig,
    response_time_thresholds: &'a SeverityThresholds,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(config: &'a AnomalyConfig, response_time_thresholds: &'a SeverityThresholds) -> Self {
        Self {
            config,
            response_time_thresholds,
        }
    }

    /// Run every heuristic over the request set
    pub fn detect(&self, requests: &[CanonicalRequest]) -> Vec<Anomaly> {
        if requests.is_empty() {
            return Vec::new();
        }

        let endpoints: Vec<(&str, Vec<&CanonicalRequest>)> =
            group_by_endpoint(requests).into_iter().collect();
        let findings = self.scan_endpoints(&endpoints);

        let mut anomalies = Vec::new();
        anomalies.extend(findings.iter().filter_map(|f| f.spike.clone()));
        anomalies.extend(findings.iter().filter_map(|f| f.degradation.clone()));
        anomalies.extend(findings.iter().filter_map(|f| f.cluster.clone()));
        anomalies.extend(self.unusual_user(requests));

        debug!(
            endpoints = endpoints.len(),
            anomalies = anomalies.len(),
            "Anomaly detection finished"
        );
        anomalies
    }

    #[cfg(not(feature = "parallel"))]
    fn scan_endpoints(&self, endpoints: &[(&str, Vec<&CanonicalRequest>)]) -> Vec<EndpointFindings> {
        endpoints
            .iter()
            .map(|(endpoint, requests)| self.scan_endpoint(endpoint, requests))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn scan_endpoints(&self, endpoints: &[(&str, Vec<&CanonicalRequest>)]) -> Vec<EndpointFindings> {
        endpoints
            .par_iter()
            .map(|(endpoint, requests)| self.scan_endpoint(endpoint, requests))
            .collect()
    }

    fn scan_endpoint(&self, endpoint: &str, requests: &[&CanonicalRequest]) -> EndpointFindings {
        let timestamps: Vec<DateTime<Utc>> = requests.iter().map(|r| r.timestamp).collect();
        let error_timestamps: Vec<DateTime<Utc>> = requests
            .iter()
            .filter(|r| r.is_error())
            .map(|r| r.timestamp)
            .collect();

        EndpointFindings {
            spike: self.request_spike(endpoint, &timestamps),
            degradation: self.response_degradation(endpoint, requests),
            cluster: self.error_cluster(endpoint, &error_timestamps),
        }
    }

    /// First window whose count beats `multiplier` x the endpoint's normal rate
    pub fn request_spike(&self, endpoint: &str, timestamps: &[DateTime<Utc>]) -> Option<Anomaly> {
        let (first, last) = (timestamps.first()?, timestamps.last()?);
        let window_minutes = self.config.request_spike_window_minutes;
        let width = window_width(window_minutes)?;
        let multiplier = self.config.request_spike_multiplier;

        let duration_minutes = ((*last - *first).num_seconds() / 60).max(1);
        let windows = (duration_minutes as f64 / window_minutes as f64).max(1.0);
        let normal_rate = timestamps.len() as f64 / windows;
        let threshold = multiplier * normal_rate;

        let (edge, count) = SlidingWindow::new(timestamps, width)
            .find(|(_, count)| *count as f64 > threshold)?;

        let severity = if count as f64 > 2.0 * multiplier * normal_rate {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Anomaly::RequestSpike {
            endpoint: endpoint.to_string(),
            timestamp: format_timestamp(&edge),
            normal_rate: normal_rate as u64,
            actual_rate: count,
            severity,
        })
    }

    /// Compare the most recent slice of time-sorted requests against the full history
    pub fn response_degradation(&self, endpoint: &str, requests: &[&CanonicalRequest]) -> Option<Anomaly> {
        let n = requests.len();
        if n == 0 || n < self.config.degradation_min_requests {
            return None;
        }

        let recent_start = (n as f64 * (1.0 - self.config.degradation_recent_fraction)) as usize;
        let recent = &requests[recent_start.min(n - 1)..];

        let recent_avg = mean_response_time(recent);
        let overall_avg = mean_response_time(requests);
        let multiplier = self.config.degradation_multiplier;

        if !(recent_avg > multiplier * overall_avg && recent_avg > self.response_time_thresholds.medium) {
            return None;
        }

        let severity = if recent_avg > multiplier * overall_avg * 1.5 {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Anomaly::ResponseTimeDegradation {
            endpoint: endpoint.to_string(),
            recent_avg_ms: round_to(recent_avg, 3),
            overall_avg_ms: round_to(overall_avg, 3),
            severity,
        })
    }

    /// First window holding at least `error_cluster_threshold` errors
    pub fn error_cluster(&self, endpoint: &str, error_timestamps: &[DateTime<Utc>]) -> Option<Anomaly> {
        let threshold = self.config.error_cluster_threshold;
        let width = window_width(self.config.error_cluster_window_minutes)?;

        let (edge, count) =
            SlidingWindow::new(error_timestamps, width).find(|(_, count)| *count >= threshold)?;

        let severity = if count >= threshold * 2 {
            Severity::Critical
        } else {
            Severity::High
        };

        Some(Anomaly::ErrorCluster {
            endpoint: endpoint.to_string(),
            time_window: format!(
                "{}-{}",
                edge.checked_sub_signed(width)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
                    .format("%H:%M"),
                edge.format("%H:%M")
            ),
            error_count: count,
            severity,
        })
    }

    /// The busiest user, if their share of all traffic is above the threshold
    pub fn unusual_user(&self, requests: &[CanonicalRequest]) -> Option<Anomaly> {
        if requests.is_empty() {
            return None;
        }
        let counts = user_counts(requests);
        let (user_id, count) = counts.most_common(1).into_iter().next()?;

        let share = count as f64 / requests.len() as f64;
        if share <= self.config.unusual_user_share {
            return None;
        }

        let severity = if share > self.config.unusual_user_high_share {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Anomaly::UnusualUserBehavior {
            user_id: user_id.to_string(),
            share_percentage: round_to(share * 100.0, 3),
            severity,
        })
    }
}

pub fn detect_anomalies(
    requests: &[CanonicalRequest],
    config: &AnomalyConfig,
    response_time_thresholds: &SeverityThresholds,
) -> Vec<Anomaly> {
    AnomalyDetector::new(config, response_time_thresholds).detect(requests)
}

/// Requests per endpoint, each list sorted by time (response time breaks ties)
fn group_by_endpoint(requests: &[CanonicalRequest]) -> BTreeMap<&str, Vec<&CanonicalRequest>> {
    let mut by_endpoint: BTreeMap<&str, Vec<&CanonicalRequest>> = BTreeMap::new();
    for request in requests {
        by_endpoint.entry(request.endpoint.as_str()).or_default().push(request);
    }
    for list in by_endpoint.values_mut() {
        list.sort_by_key(|r| (r.timestamp, r.response_time_ms));
    }
    by_endpoint
}

/// A positive window width, or `None` when the minutes are not representable
fn window_width(minutes: i64) -> Option<Duration> {
    Duration::try_minutes(minutes).filter(|width| *width > Duration::zero())
}

fn mean_response_time(requests: &[&CanonicalRequest]) -> f64 {
    let sum: u128 = requests.iter().map(|r| u128::from(r.response_time_ms)).sum();
    sum as f64 / requests.len() as f64
}
