//! Core Data Models
//!
//! This module defines the data structures used throughout the API log analysis
//! pipeline, from validated request records to the final report.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`RawRecord`] - Untyped attribute map as decoded from the input
//! 2. **Canonical**: [`CanonicalRequest`] - Validated, type-coerced request record
//! 3. **Aggregation**: [`EndpointStats`], [`Summary`] - Per-endpoint and overall views
//! 4. **Findings**: [`PerformanceIssue`], [`Anomaly`], [`CostAnalysis`]
//! 5. **Output**: [`Report`] - The assembled, serializable report
//!
//! ## Serialization
//!
//! Every output type derives `Serialize` with field names matching the JSON report
//! layout. Issues and anomalies are internally tagged with a `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An untyped record as received from the input decoder
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Attributes every record must carry to be accepted
pub const REQUIRED_FIELDS: [&str; 8] = [
    "timestamp",
    "endpoint",
    "method",
    "response_time_ms",
    "status_code",
    "user_id",
    "request_size_bytes",
    "response_size_bytes",
];

/// A validated request record. Only the normalizer constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    pub response_time_ms: u64,
    pub status_code: u64,
    pub user_id: String,
    pub request_size_bytes: u64,
    pub response_size_bytes: u64,
}

impl CanonicalRequest {
    /// 4xx and 5xx statuses count as errors
    pub fn is_error(&self) -> bool {
        is_error_status(self.status_code)
    }
}

pub fn is_error_status(code: u64) -> bool {
    (400..=599).contains(&code)
}

/// Severity ladder shared by performance issues and anomalies.
///
/// Variants are ordered so that `None < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_requests: usize,
    pub time_range: TimeRange,
    pub avg_response_time_ms: f64,
    pub error_rate_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub request_count: usize,
    pub avg_response_time_ms: f64,
    pub slowest_request_ms: u64,
    pub fastest_request_ms: u64,
    pub error_count: usize,
    pub most_common_status: Option<u64>,
}

impl EndpointStats {
    /// Unrounded error rate in percent
    pub fn error_rate_percentage(&self) -> f64 {
        if self.request_count == 0 {
            return 0.0;
        }
        self.error_count as f64 / self.request_count as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PerformanceIssue {
    SlowEndpoint {
        endpoint: String,
        avg_response_time_ms: f64,
        threshold_ms: f64,
        severity: Severity,
    },
    HighErrorRate {
        endpoint: String,
        error_rate_percentage: f64,
        severity: Severity,
    },
}

impl PerformanceIssue {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::SlowEndpoint { endpoint, .. } | Self::HighErrorRate { endpoint, .. } => endpoint,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::SlowEndpoint { severity, .. } | Self::HighErrorRate { severity, .. } => *severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopUser {
    pub user_id: String,
    pub request_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub request_costs: f64,
    pub execution_costs: f64,
    pub memory_costs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointCost {
    pub endpoint: String,
    pub total_cost: f64,
    pub cost_per_request: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAnalysis {
    pub total_cost_usd: f64,
    pub cost_breakdown: CostBreakdown,
    pub cost_by_endpoint: Vec<EndpointCost>,
    pub optimization_potential_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anomaly {
    RequestSpike {
        endpoint: String,
        timestamp: String,
        normal_rate: u64,
        actual_rate: usize,
        severity: Severity,
    },
    ResponseTimeDegradation {
        endpoint: String,
        recent_avg_ms: f64,
        overall_avg_ms: f64,
        severity: Severity,
    },
    ErrorCluster {
        endpoint: String,
        time_window: String,
        error_count: usize,
        severity: Severity,
    },
    UnusualUserBehavior {
        user_id: String,
        share_percentage: f64,
        severity: Severity,
    },
}

impl Anomaly {
    /// The `type` tag as it appears in the JSON report
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestSpike { .. } => "request_spike",
            Self::ResponseTimeDegradation { .. } => "response_time_degradation",
            Self::ErrorCluster { .. } => "error_cluster",
            Self::UnusualUserBehavior { .. } => "unusual_user_behavior",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::RequestSpike { severity, .. }
            | Self::ResponseTimeDegradation { severity, .. }
            | Self::ErrorCluster { severity, .. }
            | Self::UnusualUserBehavior { severity, .. } => *severity,
        }
    }

    /// Endpoint or user the finding is about
    pub fn subject(&self) -> &str {
        match self {
            Self::RequestSpike { endpoint, .. }
            | Self::ResponseTimeDegradation { endpoint, .. }
            | Self::ErrorCluster { endpoint, .. } => endpoint,
            Self::UnusualUserBehavior { user_id, .. } => user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub endpoint_stats: Vec<EndpointStats>,
    pub performance_issues: Vec<PerformanceIssue>,
    pub recommendations: Vec<String>,
    pub hourly_distribution: BTreeMap<String, usize>,
    pub top_users_by_requests: Vec<TopUser>,
    pub cost_analysis: CostAnalysis,
    pub anomalies: Vec<Anomaly>,
}

/// Round to `places` decimals using the exact decimal expansion of `value`
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// Render an instant as UTC ISO-8601 with a `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    if ts.timestamp_subsec_nanos() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
    }
}
