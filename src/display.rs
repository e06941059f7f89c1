//! Output Formatting and Display Management
//!
//! Renders an analysis [`Report`] either as JSON for programmatic consumption or
//! as colored, human-readable terminal output.
//!
//! ## Terminal Layout
//!
//! - **Summary**: request count, time range, average response time, error rate
//! - **Endpoints**: one line per endpoint, limited to the N busiest
//! - **Issues**: performance issues with their severity
//! - **Recommendations**: the textual suggestions from the report
//! - **Cost**: totals, breakdown and optimization potential
//! - **Anomalies**: every finding with its severity
//!
//! Severity colors: critical in red, high in yellow, medium in cyan.

use crate::models::*;
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

pub struct ReportDisplayManager;

impl Default for ReportDisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportDisplayManager {
    pub fn new() -> Self {
        Self
    }

    pub fn to_json(&self, report: &Report, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        json.context("Failed to serialize report to JSON")
    }

    pub fn display_json(&self, report: &Report, pretty: bool) -> Result<()> {
        println!("{}", self.to_json(report, pretty)?);
        Ok(())
    }

    pub fn display_report(&self, report: &Report, limit: Option<usize>) {
        print!("{}", self.render(report, limit));
    }

    /// Human-readable report; `limit` caps the endpoint table (default 20)
    pub fn render(&self, report: &Report, limit: Option<usize>) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_report(&mut out, report, limit.unwrap_or(20));
        out
    }

    fn write_report(&self, out: &mut String, report: &Report, limit: usize) -> std::fmt::Result {
        let summary = &report.summary;

        writeln!(out, "\n{}", "=".repeat(80).bright_cyan())?;
        writeln!(out, "{}", "API Log Analysis Report".bright_white().bold())?;
        writeln!(out, "{}", "=".repeat(80).bright_cyan())?;

        if summary.total_requests == 0 {
            writeln!(out, "\nNo valid log records found.")?;
            return Ok(());
        }

        writeln!(
            out,
            "\n{} {} requests • {} avg • {} errors",
            "📊".bright_yellow(),
            summary.total_requests.to_string().bright_white().bold(),
            format!("{}ms", summary.avg_response_time_ms).bright_white(),
            format!("{}%", summary.error_rate_percentage).bright_red()
        )?;
        if let (Some(start), Some(end)) = (&summary.time_range.start, &summary.time_range.end) {
            writeln!(out, "   Time range: {} → {}", start.bright_white(), end.bright_white())?;
        }

        let mut busiest: Vec<&EndpointStats> = report.endpoint_stats.iter().collect();
        busiest.sort_by(|a, b| b.request_count.cmp(&a.request_count));
        writeln!(
            out,
            "\n{} Endpoints (top {} by requests):",
            "📍".bright_blue(),
            busiest.len().min(limit).to_string().bright_white().bold()
        )?;
        for stats in busiest.iter().take(limit) {
            writeln!(
                out,
                "   {}: {} requests, avg {}, {}-{}ms, {} errors, status {}",
                stats.endpoint.bright_cyan(),
                stats.request_count.to_string().bright_white(),
                format!("{}ms", stats.avg_response_time_ms).bright_yellow(),
                stats.fastest_request_ms,
                stats.slowest_request_ms,
                stats.error_count.to_string().bright_red(),
                stats
                    .most_common_status
                    .map_or_else(|| "-".to_string(), |code| code.to_string())
            )?;
        }

        if !report.performance_issues.is_empty() {
            writeln!(out, "\n{} Performance issues:", "⚠️".bright_yellow())?;
            for issue in &report.performance_issues {
                let detail = match issue {
                    PerformanceIssue::SlowEndpoint { avg_response_time_ms, threshold_ms, .. } => {
                        format!("slow endpoint, avg {}ms (threshold {}ms)", avg_response_time_ms, threshold_ms)
                    }
                    PerformanceIssue::HighErrorRate { error_rate_percentage, .. } => {
                        format!("error rate {}%", error_rate_percentage)
                    }
                };
                writeln!(
                    out,
                    "   [{}] {}: {}",
                    severity_label(issue.severity()),
                    issue.endpoint().bright_cyan(),
                    detail
                )?;
            }
        }

        if !report.recommendations.is_empty() {
            writeln!(out, "\n{} Recommendations:", "💡".bright_yellow())?;
            for rec in &report.recommendations {
                writeln!(out, "   • {}", rec)?;
            }
        }

        let cost = &report.cost_analysis;
        writeln!(
            out,
            "\n{} Estimated cost: {} (requests {}, execution {}, memory {})",
            "💰".bright_green(),
            format!("${:.6}", cost.total_cost_usd).bright_green().bold(),
            format!("${:.6}", cost.cost_breakdown.request_costs),
            format!("${:.6}", cost.cost_breakdown.execution_costs),
            format!("${:.6}", cost.cost_breakdown.memory_costs)
        )?;
        if cost.optimization_potential_usd > 0.0 {
            writeln!(
                out,
                "   Optimization potential: {}",
                format!("${:.6}", cost.optimization_potential_usd).bright_green()
            )?;
        }

        if report.anomalies.is_empty() {
            writeln!(out, "\n{} No anomalies detected", "✅".bright_green())?;
        } else {
            writeln!(out, "\n{} Anomalies:", "🚨".bright_red())?;
            for anomaly in &report.anomalies {
                writeln!(
                    out,
                    "   [{}] {} {}: {}",
                    severity_label(anomaly.severity()),
                    anomaly.kind().bright_white(),
                    anomaly.subject().bright_cyan(),
                    anomaly_detail(anomaly)
                )?;
            }
        }

        writeln!(out)
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => severity.as_str().bright_red().bold(),
        Severity::High => severity.as_str().bright_yellow(),
        Severity::Medium => severity.as_str().bright_cyan(),
        Severity::None => severity.as_str().normal(),
    }
}

fn anomaly_detail(anomaly: &Anomaly) -> String {
    match anomaly {
        Anomaly::RequestSpike { timestamp, normal_rate, actual_rate, .. } => {
            format!("{} requests in window at {} (normal {})", actual_rate, timestamp, normal_rate)
        }
        Anomaly::ResponseTimeDegradation { recent_avg_ms, overall_avg_ms, .. } => {
            format!("recent avg {}ms vs overall {}ms", recent_avg_ms, overall_avg_ms)
        }
        Anomaly::ErrorCluster { time_window, error_count, .. } => {
            format!("{} errors during {}", error_count, time_window)
        }
        Anomaly::UnusualUserBehavior { share_percentage, .. } => {
            format!("{}% of all requests", share_percentage)
        }
    }
}
