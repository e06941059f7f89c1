#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
}

pub fn iso(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// A well-formed log record
pub fn make_log(ts: DateTime<Utc>, endpoint: &str, status: u64, response_time_ms: u64, user_id: &str) -> Value {
    json!({
        "timestamp": iso(ts),
        "endpoint": endpoint,
        "method": "GET",
        "response_time_ms": response_time_ms,
        "status_code": status,
        "user_id": user_id,
        "request_size_bytes": 256,
        "response_size_bytes": 512
    })
}

/// `count` successful requests spread one minute apart across four users
pub fn steady_traffic(endpoint: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            make_log(
                base_time() + Duration::minutes(i as i64),
                endpoint,
                200,
                100 + (i as u64 % 50),
                &format!("user_{:03}", i % 4),
            )
        })
        .collect()
}

pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}
