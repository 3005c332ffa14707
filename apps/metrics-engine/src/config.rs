//! Configuration module for the metrics engine.
//!
//! Provides configuration loading, validation, and environment variable
//! interpolation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use metrics_engine::config::load_config;
//!
//! // Load from default path (metrics.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("config/metrics.yaml"))?;
//!
//! println!("annualization: {}", config.metrics.annualization_factor);
//! ```
//!
//! # Example
//!
//! ```yaml
//! metrics:
//!   annualization_factor: ${ANNUALIZATION_FACTOR:-252}
//!   risk_free_rate: "0.02"
//! logging:
//!   level: debug
//!   format: json
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MetricsError;
use crate::ledger::DEFAULT_PNL_TOLERANCE;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Metric calculation parameters.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metric calculation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Return periods per year (252 for daily equities).
    #[serde(default = "default_annualization_factor")]
    pub annualization_factor: u32,
    /// Annual risk-free rate as a decimal fraction.
    #[serde(default)]
    pub risk_free_rate: Decimal,
    /// Calendar days per year for CAGR.
    #[serde(default = "default_days_per_year")]
    pub days_per_year: Decimal,
    /// Allowed gap between reported and recomputed trade P&L.
    #[serde(default = "default_pnl_tolerance")]
    pub pnl_tolerance: Decimal,
    /// Allowed gap between equity-curve and ledger P&L before warning.
    #[serde(default = "default_reconciliation_tolerance")]
    pub reconciliation_tolerance: Decimal,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            annualization_factor: default_annualization_factor(),
            risk_free_rate: Decimal::ZERO,
            days_per_year: default_days_per_year(),
            pnl_tolerance: default_pnl_tolerance(),
            reconciliation_tolerance: default_reconciliation_tolerance(),
        }
    }
}

impl MetricsConfig {
    /// Reject parameters no calculation can use.
    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.annualization_factor == 0 {
            return Err(MetricsError::ZeroAnnualizationFactor);
        }
        if self.days_per_year <= Decimal::ZERO {
            return Err(MetricsError::InvalidParameter {
                name: "days_per_year",
                message: format!("must be positive, got {}", self.days_per_year),
            });
        }
        if self.pnl_tolerance < Decimal::ZERO {
            return Err(MetricsError::InvalidParameter {
                name: "pnl_tolerance",
                message: format!("cannot be negative, got {}", self.pnl_tolerance),
            });
        }
        if self.reconciliation_tolerance < Decimal::ZERO {
            return Err(MetricsError::InvalidParameter {
                name: "reconciliation_tolerance",
                message: format!("cannot be negative, got {}", self.reconciliation_tolerance),
            });
        }
        Ok(())
    }
}

const fn default_annualization_factor() -> u32 {
    252
}
const fn default_days_per_year() -> Decimal {
    Decimal::from_parts(36_525, 0, 0, false, 2)
}
const fn default_pnl_tolerance() -> Decimal {
    DEFAULT_PNL_TOLERANCE
}
const fn default_reconciliation_tolerance() -> Decimal {
    Decimal::ONE
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a YAML file.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("metrics.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .metrics
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("metrics: {e}")))?;
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "logging.level cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let Some(re) = ENV_VAR_REGEX
        .get_or_init(|| regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").ok())
    else {
        return input.to_string();
    };

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.metrics.annualization_factor, 252);
        assert_eq!(config.metrics.risk_free_rate, Decimal::ZERO);
        assert_eq!(config.metrics.days_per_year, Decimal::new(36_525, 2));
        assert_eq!(config.metrics.pnl_tolerance, Decimal::new(1, 2));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_string() {
        let yaml = r#"
metrics:
  annualization_factor: 365
  risk_free_rate: "0.02"
logging:
  level: debug
  format: json
"#;
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.metrics.annualization_factor, 365);
        assert_eq!(config.metrics.risk_free_rate, Decimal::new(2, 2));
        assert_eq!(config.metrics.days_per_year, Decimal::new(36_525, 2));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = load_config_from_string("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_default_interpolation() {
        let yaml = r"
metrics:
  annualization_factor: ${METRICS_ENGINE_TEST_UNSET_FACTOR:-52}
";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.metrics.annualization_factor, 52);
    }

    #[test]
    fn test_env_interpolation_reads_environment() {
        let Ok(path) = std::env::var("PATH") else {
            return;
        };
        let interpolated = interpolate_env_vars("value: ${PATH:-fallback}");
        assert_eq!(interpolated, format!("value: {path}"));
    }

    #[test]
    fn test_rejects_zero_annualization() {
        let yaml = "metrics:\n  annualization_factor: 0\n";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_message_names_parameter() {
        let yaml = "metrics:\n  days_per_year: \"0\"\n";
        let Err(ConfigError::ValidationError(message)) = load_config_from_string(yaml) else {
            panic!("zero days_per_year should be rejected");
        };
        assert!(message.contains("days_per_year"));
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let yaml = "metrics:\n  pnl_tolerance: \"-0.5\"\n";
        let result = load_config_from_string(yaml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "metrics:\n  annualization_factor: 12").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.metrics.annualization_factor, 12);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Some("/nonexistent/metrics.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
