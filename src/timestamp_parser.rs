use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Handles parsing the ISO-8601 timestamp shapes found in API request logs
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a timestamp string into a DateTime<Utc>.
    /// Handles `Z` suffix, numeric offsets, naive datetimes (taken as UTC) and bare dates.
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Utc>> {
        let timestamp = timestamp_str.trim();

        // Trailing Z is the UTC offset
        let timestamp = match timestamp.strip_suffix('Z') {
            Some(stripped) => format!("{}+00:00", stripped),
            None => timestamp.to_string(),
        };

        // Try parsing as ISO 8601 with offset, either separator
        if let Ok(dt) = DateTime::parse_from_rfc3339(&timestamp) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_str(&timestamp, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Ok(dt.with_timezone(&Utc));
        }

        // Try parsing as naive datetime and assume UTC
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&timestamp, format) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }

        // Bare date means midnight UTC
        if let Ok(date) = NaiveDate::parse_from_str(&timestamp, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_z_suffix() {
        let result = TimestampParser::parse("2025-01-15T10:00:00Z").unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_offset_normalized_to_utc() {
        let result = TimestampParser::parse("2025-01-15T12:30:00+02:00").unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive() {
        let result = TimestampParser::parse("2025-01-15T10:00:00.500").unwrap();
        assert_eq!(result.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_parse_space_separator_and_date() {
        assert!(TimestampParser::parse("2025-01-15 10:00:00").is_ok());
        let midnight = TimestampParser::parse("2025-01-15").unwrap();
        assert_eq!(midnight, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TimestampParser::parse("bad-ts").is_err());
        assert!(TimestampParser::parse("").is_err());
        assert!(TimestampParser::parse("2025-13-40T10:00:00Z").is_err());
    }
}
