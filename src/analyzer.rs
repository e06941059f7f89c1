//! Log Analysis Engine
//!
//! This module assembles the final [`Report`] from the pipeline stages. It owns
//! no analytics logic of its own: every figure comes from the normalizer,
//! aggregator, summary, severity, cost and anomaly modules.
//!
//! ## Pipeline
//!
//! 1. **Normalize**: raw records become canonical requests, rejects are dropped
//! 2. **Aggregate**: per-endpoint statistics and overall summary
//! 3. **Classify**: performance issues and recommendations from thresholds
//! 4. **Estimate**: cost totals, per-endpoint cost and optimization potential
//! 5. **Detect**: spike, degradation, error cluster and user share anomalies
//! 6. **Assemble**: everything above into one immutable report
//!
//! ## Usage Example
//!
//! ```rust
//! use api_log_analyzer::{config::Config, LogAnalyzer};
//! use serde_json::json;
//!
//! # fn example() -> anyhow::Result<()> {
//! let analyzer = LogAnalyzer::new(Config::default());
//! let input = json!([{
//!     "timestamp": "2025-01-15T10:00:00Z",
//!     "endpoint": "/api/users",
//!     "method": "GET",
//!     "response_time_ms": 120,
//!     "status_code": 200,
//!     "user_id": "user_001",
//!     "request_size_bytes": 512,
//!     "response_size_bytes": 2048
//! }]);
//!
//! let report = analyzer.analyze_value(&input)?;
//! assert_eq!(report.summary.total_requests, 1);
//! # Ok(())
//! # }
//! ```

use crate::aggregator::endpoint_stats;
use crate::anomaly::AnomalyDetector;
use crate::config::Config;
use crate::cost::CostEstimator;
use crate::models::*;
use crate::normalizer::normalize_all;
use crate::severity::{detect_performance_issues, recommendations};
use crate::summary::{hourly_distribution, summarize, top_users};
use anyhow::Result;
use serde_json::Value;
use tracing::debug;

pub struct LogAnalyzer {
    config: Config,
}

impl Default for LogAnalyzer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl LogAnalyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze decoded JSON input.
    ///
    /// An array is a batch of records (non-object elements are dropped like any
    /// malformed record) and `null` is an empty batch. Anything else is not a
    /// sequence of records and fails the whole call.
    pub fn analyze_value(&self, input: &Value) -> Result<Report> {
        match input {
            Value::Array(items) => {
                let records: Vec<&RawRecord> = items.iter().filter_map(Value::as_object).collect();
                if records.len() < items.len() {
                    debug!(
                        skipped = items.len() - records.len(),
                        "Skipping input elements that are not records"
                    );
                }
                Ok(self.analyze(records))
            }
            Value::Null => Ok(self.analyze(std::iter::empty())),
            other => anyhow::bail!(
                "Expected an array of log records, got {}",
                json_type_name(other)
            ),
        }
    }

    /// Analyze a batch of raw records
    pub fn analyze<'a, I>(&self, records: I) -> Report
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let requests = normalize_all(records);
        self.analyze_requests(&requests)
    }

    /// Build the report from already-normalized requests
    pub fn analyze_requests(&self, requests: &[CanonicalRequest]) -> Report {
        let config = &self.config;
        let response_time = &config.thresholds.response_time_ms;

        let summary = summarize(requests);
        let endpoint_stats = endpoint_stats(requests);
        let performance_issues = detect_performance_issues(&endpoint_stats, &config.thresholds);
        let recommendations = recommendations(&endpoint_stats, &config.thresholds);
        let hourly_distribution = hourly_distribution(requests);
        let top_users_by_requests = top_users(requests, config.report.top_users);

        let cost_analysis = CostEstimator::new(&config.cost, response_time).estimate(requests, &endpoint_stats);
        let anomalies = AnomalyDetector::new(&config.anomaly, response_time).detect(requests);

        debug!(
            total_requests = summary.total_requests,
            endpoints = endpoint_stats.len(),
            issues = performance_issues.len(),
            anomalies = anomalies.len(),
            "Report assembled"
        );

        Report {
            summary,
            endpoint_stats,
            performance_issues,
            recommendations,
            hourly_distribution,
            top_users_by_requests,
            cost_analysis,
            anomalies,
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structural_failure_is_an_error() {
        let analyzer = LogAnalyzer::default();
        let err = analyzer.analyze_value(&json!({"timestamp": "x"})).unwrap_err();
        assert!(err.to_string().contains("an object"));
        assert!(analyzer.analyze_value(&json!("logs")).is_err());
    }

    #[test]
    fn test_null_is_an_empty_batch() {
        let report = LogAnalyzer::default().analyze_value(&Value::Null).unwrap();
        assert_eq!(report.summary.total_requests, 0);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_non_record_elements_are_dropped() {
        let input = json!([1, "two", null, [3]]);
        let report = LogAnalyzer::default().analyze_value(&input).unwrap();
        assert_eq!(report.summary.total_requests, 0);
        assert!(report.endpoint_stats.is_empty());
    }
}
