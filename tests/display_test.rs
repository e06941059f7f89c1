//! Tests for the display module
//!
//! These tests verify report rendering for both JSON and terminal output,
//! including empty reports and endpoint limits.

mod common;

use api_log_analyzer::display::ReportDisplayManager;
use api_log_analyzer::{LogAnalyzer, Report};
use chrono::Duration;
use common::{base_time, make_log, steady_traffic};
use serde_json::Value;

fn report_for(records: Vec<Value>) -> Report {
    LogAnalyzer::default().analyze_value(&Value::Array(records)).unwrap()
}

#[test]
fn test_json_output_shape() {
    let report = report_for(steady_traffic("/api/users", 10));
    let display = ReportDisplayManager::new();

    let compact = display.to_json(&report, false).unwrap();
    assert!(!compact.contains('\n'));

    let value: Value = serde_json::from_str(&compact).unwrap();
    for key in [
        "summary",
        "endpoint_stats",
        "performance_issues",
        "recommendations",
        "hourly_distribution",
        "top_users_by_requests",
        "cost_analysis",
        "anomalies",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(value["hourly_distribution"]["10:00"], 10);

    let pretty = display.to_json(&report, true).unwrap();
    assert!(pretty.contains('\n'));
}

#[test]
fn test_tagged_findings_in_json() {
    let records: Vec<Value> = (0..6)
        .map(|i| make_log(base_time() + Duration::minutes(i), "/api/export", 500, 2500, "user_001"))
        .collect();
    let report = report_for(records);
    let value: Value = serde_json::to_value(&report).unwrap();

    let issues = value["performance_issues"].as_array().unwrap();
    assert_eq!(issues[0]["type"], "slow_endpoint");
    assert_eq!(issues[0]["severity"], "critical");
    assert_eq!(issues[1]["type"], "high_error_rate");

    let anomalies = value["anomalies"].as_array().unwrap();
    assert!(anomalies.iter().any(|a| a["type"] == "unusual_user_behavior"));
}

#[test]
fn test_render_empty_report() {
    let report = report_for(vec![]);
    let text = ReportDisplayManager::new().render(&report, None);

    assert!(text.contains("API Log Analysis Report"));
    assert!(text.contains("No valid log records found."));
}

#[test]
fn test_render_sections() {
    let mut records = steady_traffic("/api/users", 20);
    records.extend((0..5).map(|i| make_log(base_time() + Duration::minutes(i), "/api/reports", 200, 1200, "user_002")));
    let report = report_for(records);
    let text = ReportDisplayManager::new().render(&report, None);

    assert!(text.contains("/api/users"));
    assert!(text.contains("/api/reports"));
    assert!(text.contains("Performance issues"));
    assert!(text.contains("Investigate /api/reports performance"));
    assert!(text.contains("Estimated cost"));
}

#[test]
fn test_render_respects_limit() {
    let mut records = steady_traffic("/api/busy", 10);
    records.extend(steady_traffic("/api/quiet", 2));
    let report = report_for(records);
    let text = ReportDisplayManager::new().render(&report, Some(1));

    assert!(text.contains("/api/busy"));
    assert!(!text.contains("/api/quiet"));
}
