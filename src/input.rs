//! Input discovery and decoding for the command-line tool
//!
//! Inputs are file paths or glob patterns. A `.jsonl` file holds one record per
//! line; undecodable lines are skipped with a warning. Any other file must hold
//! a single JSON array of records (or `null`). Files are read concurrently and
//! their records concatenated in the order the inputs were given.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolve paths and glob patterns into a list of files
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let literal = PathBuf::from(pattern);
        if literal.is_file() {
            files.push(literal);
            continue;
        }

        let mut matches: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("Invalid input pattern: {}", pattern))?
            .filter_map(|entry| match entry {
                Ok(path) if path.is_file() => Some(path),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path");
                    None
                }
            })
            .collect();

        if matches.is_empty() {
            anyhow::bail!("No input files match: {}", pattern);
        }
        matches.sort();
        files.append(&mut matches);
    }

    debug!(files = files.len(), "Resolved input files");
    Ok(files)
}

/// Read and decode every file, returning all records as one JSON array
pub async fn load_records(paths: &[PathBuf]) -> Result<Value> {
    let batches = try_join_all(paths.iter().map(|path| read_input(path))).await?;
    Ok(Value::Array(batches.into_iter().flatten().collect()))
}

async fn read_input(path: &Path) -> Result<Vec<Value>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    decode(path, &content)
}

/// Decode file content according to its extension
pub fn decode(path: &Path, content: &str) -> Result<Vec<Value>> {
    let is_jsonl = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));

    if is_jsonl {
        return Ok(decode_jsonl(path, content));
    }

    let value: Value = serde_json::from_str(content)
        .with_context(|| format!("Failed to parse JSON input: {}", path.display()))?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        _ => anyhow::bail!(
            "Input file does not contain an array of log records: {}",
            path.display()
        ),
    }
}

fn decode_jsonl(path: &Path, content: &str) -> Vec<Value> {
    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(value) => records.push(value),
            Err(e) => warn!(
                file = %path.display(),
                line_number = index + 1,
                error = %e,
                "Skipping undecodable line"
            ),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_array() {
        let records = decode(Path::new("logs.json"), r#"[{"a": 1}, {"b": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_decode_null_is_empty() {
        assert!(decode(Path::new("logs.json"), "null").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode(Path::new("logs.json"), r#"{"a": 1}"#).is_err());
        assert!(decode(Path::new("logs.json"), "not json").is_err());
    }

    #[test]
    fn test_decode_jsonl_skips_bad_lines() {
        let content = "{\"a\": 1}\n{broken json line}\n\n{\"b\": 2}\n";
        let records = decode(Path::new("logs.jsonl"), content).unwrap();
        assert_eq!(records.len(), 2);
    }
}
