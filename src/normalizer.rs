//! Record validation and normalization
//!
//! Turns an untyped [`RawRecord`] into a [`CanonicalRequest`], or rejects it.
//! Rejection is all-or-nothing: a record with any missing or malformed field
//! is dropped entirely and never partially accepted. Rejections are not errors
//! and the caller is never told why a record was dropped.

use crate::models::{CanonicalRequest, RawRecord, REQUIRED_FIELDS};
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Validate and coerce one raw record
pub fn normalize(raw: &RawRecord) -> Option<CanonicalRequest> {
    if REQUIRED_FIELDS.iter().any(|field| !raw.contains_key(*field)) {
        return None;
    }

    Some(CanonicalRequest {
        timestamp: coerce_timestamp(&raw["timestamp"])?,
        endpoint: coerce_string(&raw["endpoint"])?,
        method: coerce_string(&raw["method"])?.to_uppercase(),
        response_time_ms: coerce_u64(&raw["response_time_ms"])?,
        status_code: coerce_u64(&raw["status_code"])?,
        user_id: coerce_string(&raw["user_id"])?,
        request_size_bytes: coerce_u64(&raw["request_size_bytes"])?,
        response_size_bytes: coerce_u64(&raw["response_size_bytes"])?,
    })
}

/// Normalize a whole batch, keeping input order and silently dropping rejects
pub fn normalize_all<'a, I>(records: I) -> Vec<CanonicalRequest>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut dropped = 0usize;
    let requests: Vec<CanonicalRequest> = records
        .into_iter()
        .filter_map(|raw| {
            let request = normalize(raw);
            if request.is_none() {
                dropped += 1;
            }
            request
        })
        .collect();

    debug!(accepted = requests.len(), dropped, "Normalized raw records");
    requests
}

fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(|s| TimestampParser::parse(s).ok())
}

fn coerce_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Some(v);
            }
            if n.is_i64() {
                // Only negative integers land here
                return None;
            }
            let f = n.as_f64()?;
            if !f.is_finite() || f < 0.0 || f >= u64::MAX as f64 {
                return None;
            }
            Some(f.trunc() as u64)
        }
        Value::String(s) => {
            let digits = s.trim();
            let digits = digits.strip_prefix('+').unwrap_or(digits);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()
        }
        Value::Bool(b) => Some(u64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
