//! API Log Analyzer Library
//!
//! A Rust library for turning batches of API request log records into an
//! analytics report: traffic summary, per-endpoint performance and error
//! statistics, severity-classified issues, cost estimation and statistical
//! anomaly detection.
//!
//! ## Core Features
//!
//! - **Fail-closed validation**: Malformed records are dropped whole, never partially
//!   accepted and never surfaced as errors
//! - **Per-endpoint statistics**: Averages, extremes, error counts and most common status
//! - **Severity classification**: Exclusive thresholds for response time and error rate
//! - **Cost estimation**: Per-request, per-millisecond and memory-bracket cost model
//! - **Anomaly detection**: Sliding-window request spikes and error clusters,
//!   response-time degradation and skewed user share
//! - **Deterministic output**: The report depends only on the records and the configuration
//!
//! ## Architecture Overview
//!
//! - [`models`] - Canonical request, report and finding types
//! - [`normalizer`] - Record validation and coercion
//! - [`aggregator`] - Per-endpoint running statistics
//! - [`summary`] - Totals, time range, hourly distribution and top users
//! - [`severity`] - Threshold classification, performance issues, recommendations
//! - [`cost`] - Cost model
//! - [`anomaly`] - Anomaly heuristics
//! - [`analyzer`] - Report assembly
//! - [`config`] - Configuration with file and environment variable support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//! - [`input`] - Input file discovery and decoding for the command-line tool
//! - [`display`] - Human-readable report rendering
//!
//! ## Main Entry Point
//!
//! ```rust
//! use api_log_analyzer::{config::Config, LogAnalyzer};
//!
//! let analyzer = LogAnalyzer::new(Config::default());
//! let report = analyzer.analyze_value(&serde_json::json!([])).unwrap();
//! assert_eq!(report.summary.total_requests, 0);
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod anomaly;
pub mod config;
pub mod cost;
pub mod display;
pub mod input;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod severity;
pub mod summary;
pub mod timestamp_parser;

pub use analyzer::LogAnalyzer;
pub use models::*;

/// Analyze raw records with the given configuration
pub fn analyze_api_logs<'a, I>(records: I, config: &config::Config) -> Report
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    LogAnalyzer::new(config.clone()).analyze(records)
}
