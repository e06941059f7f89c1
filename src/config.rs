//! Analysis configuration
//!
//! Provides the single configuration value every pipeline component reads from:
//! - Severity thresholds for response time and error rate
//! - Cost model rates and memory brackets
//! - Anomaly detection windows and multipliers
//! - Logging and output settings for the command-line shell
//!
//! Values come from runtime defaults, an optional TOML file, then environment
//! variable overrides, and are validated before use. The configuration is never
//! stored globally; callers pass it explicitly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Longest accepted anomaly window (one week)
pub const MAX_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Severity thresholds
    pub thresholds: ThresholdsConfig,

    /// Cost model
    pub cost: CostConfig,

    /// Anomaly detection settings
    pub anomaly: AnomalyConfig,

    /// Report shaping
    pub report: ReportConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

/// Exclusive lower bounds for each severity level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub response_time_ms: SeverityThresholds,
    pub error_rate_percent: SeverityThresholds,
}

/// A half-open `[low, high)` response size range with its memory cost.
/// A missing `high` means the bracket is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBracket {
    pub low: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<u64>,
    pub cost_usd: f64,
}

impl MemoryBracket {
    pub fn contains(&self, bytes: u64) -> bool {
        bytes >= self.low && self.high.map_or(true, |high| bytes < high)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostConfig {
    pub per_request_usd: f64,
    pub per_ms_execution_usd: f64,
    pub memory_brackets: Vec<MemoryBracket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    pub request_spike_window_minutes: i64,
    pub request_spike_multiplier: f64,
    pub degradation_multiplier: f64,
    pub degradation_min_requests: usize,
    pub degradation_recent_fraction: f64,
    pub error_cluster_window_minutes: i64,
    pub error_cluster_threshold: usize,
    pub unusual_user_share: f64,
    pub unusual_user_high_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub top_users: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub json_pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "WARN".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            thresholds: ThresholdsConfig {
                response_time_ms: SeverityThresholds {
                    medium: 500.0,
                    high: 1000.0,
                    critical: 2000.0,
                },
                error_rate_percent: SeverityThresholds {
                    medium: 5.0,
                    high: 10.0,
                    critical: 15.0,
                },
            },
            cost: CostConfig {
                per_request_usd: 0.0001,
                per_ms_execution_usd: 0.000002,
                memory_brackets: vec![
                    MemoryBracket { low: 0, high: Some(1024), cost_usd: 0.00001 },
                    MemoryBracket { low: 1024, high: Some(10 * 1024), cost_usd: 0.00005 },
                    MemoryBracket { low: 10 * 1024, high: None, cost_usd: 0.0001 },
                ],
            },
            anomaly: AnomalyConfig {
                request_spike_window_minutes: 5,
                request_spike_multiplier: 3.0,
                degradation_multiplier: 2.0,
                degradation_min_requests: 5,
                degradation_recent_fraction: 0.1,
                error_cluster_window_minutes: 5,
                error_cluster_threshold: 10,
                unusual_user_share: 0.5,
                unusual_user_high_share: 0.7,
            },
            report: ReportConfig { top_users: 5 },
            output: OutputConfig { json_pretty: false },
            paths: PathsConfig {
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, environment, and defaults
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("api-log-analyzer.toml"),
            PathBuf::from(".api-log-analyzer.toml"),
            dirs::config_dir()
                .map(|d| d.join("api-log-analyzer").join("config.toml"))
                .unwrap_or_default(),
        ];

        let found = config_paths
            .iter()
            .find(|path| !path.as_os_str().is_empty() && path.exists());

        Self::load_with(found.map(PathBuf::as_path))
    }

    /// Load from `path` when given, otherwise search the default locations
    pub fn load_with_override(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_with(Some(path)),
            None => Self::load(),
        }
    }

    /// Load from an explicit file (if any), then apply env overrides and validate
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                info!(config_file = %path.display(), "Loading configuration from file");
                Self::load_from_file(path)?
            }
            None => Config::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Threshold overrides
        if let Ok(val) = env::var("API_LOG_SLOW_THRESHOLD_MS") {
            self.thresholds.response_time_ms.medium = val
                .parse()
                .context("Invalid API_LOG_SLOW_THRESHOLD_MS")?;
        }

        // Anomaly overrides
        if let Ok(val) = env::var("API_LOG_SPIKE_WINDOW_MINUTES") {
            self.anomaly.request_spike_window_minutes = val
                .parse()
                .context("Invalid API_LOG_SPIKE_WINDOW_MINUTES")?;
        }
        if let Ok(val) = env::var("API_LOG_SPIKE_MULTIPLIER") {
            self.anomaly.request_spike_multiplier = val
                .parse()
                .context("Invalid API_LOG_SPIKE_MULTIPLIER")?;
        }
        if let Ok(val) = env::var("API_LOG_ERROR_CLUSTER_THRESHOLD") {
            self.anomaly.error_cluster_threshold = val
                .parse()
                .context("Invalid API_LOG_ERROR_CLUSTER_THRESHOLD")?;
        }

        // Report overrides
        if let Ok(val) = env::var("API_LOG_TOP_USERS") {
            self.report.top_users = val.parse().context("Invalid API_LOG_TOP_USERS")?;
        }

        // Path overrides
        if let Ok(val) = env::var("API_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_thresholds("response_time_ms", &self.thresholds.response_time_ms)?;
        validate_thresholds("error_rate_percent", &self.thresholds.error_rate_percent)?;

        // Validate cost model
        if self.cost.per_request_usd < 0.0 || self.cost.per_ms_execution_usd < 0.0 {
            return Err(anyhow::anyhow!("Cost rates cannot be negative"));
        }
        if self.cost.memory_brackets.is_empty() {
            warn!("No memory brackets configured, memory costs will be zero");
        }
        for (i, bracket) in self.cost.memory_brackets.iter().enumerate() {
            if bracket.cost_usd < 0.0 {
                return Err(anyhow::anyhow!("Memory bracket {} has a negative cost", i));
            }
            if let Some(high) = bracket.high {
                if high <= bracket.low {
                    return Err(anyhow::anyhow!(
                        "Memory bracket {} is empty: [{}, {})",
                        i,
                        bracket.low,
                        high
                    ));
                }
            }
            if let Some(next) = self.cost.memory_brackets.get(i + 1) {
                match bracket.high {
                    None => {
                        return Err(anyhow::anyhow!(
                            "Only the last memory bracket may be unbounded (bracket {})",
                            i
                        ))
                    }
                    Some(high) if next.low < high => {
                        return Err(anyhow::anyhow!(
                            "Memory brackets {} and {} overlap",
                            i,
                            i + 1
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        // Validate anomaly settings
        let anomaly = &self.anomaly;
        for window in [anomaly.request_spike_window_minutes, anomaly.error_cluster_window_minutes] {
            if !(1..=MAX_WINDOW_MINUTES).contains(&window) {
                return Err(anyhow::anyhow!(
                    "Anomaly windows must be between 1 and {} minutes, got {}",
                    MAX_WINDOW_MINUTES,
                    window
                ));
            }
        }
        if anomaly.request_spike_multiplier <= 0.0 || anomaly.degradation_multiplier <= 0.0 {
            return Err(anyhow::anyhow!("Anomaly multipliers must be greater than 0"));
        }
        if anomaly.error_cluster_threshold == 0 {
            return Err(anyhow::anyhow!("Error cluster threshold must be greater than 0"));
        }
        if !(anomaly.degradation_recent_fraction > 0.0 && anomaly.degradation_recent_fraction <= 1.0)
        {
            return Err(anyhow::anyhow!(
                "Degradation recent fraction must be in (0, 1], got {}",
                anomaly.degradation_recent_fraction
            ));
        }
        for share in [anomaly.unusual_user_share, anomaly.unusual_user_high_share] {
            if !(share > 0.0 && share <= 1.0) {
                return Err(anyhow::anyhow!("User share thresholds must be in (0, 1], got {}", share));
            }
        }
        if anomaly.unusual_user_high_share < anomaly.unusual_user_share {
            warn!(
                unusual_user_share = anomaly.unusual_user_share,
                unusual_user_high_share = anomaly.unusual_user_high_share,
                "High user share threshold is below the reporting threshold"
            );
        }

        if self.report.top_users == 0 {
            return Err(anyhow::anyhow!("Top users count must be greater than 0"));
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

fn validate_thresholds(name: &str, thresholds: &SeverityThresholds) -> Result<()> {
    if thresholds.medium < 0.0 {
        return Err(anyhow::anyhow!("{} thresholds cannot be negative", name));
    }
    if !(thresholds.medium <= thresholds.high && thresholds.high <= thresholds.critical) {
        return Err(anyhow::anyhow!(
            "{} thresholds must satisfy medium <= high <= critical, got {} / {} / {}",
            name,
            thresholds.medium,
            thresholds.high,
            thresholds.critical
        ));
    }
    Ok(())
}
