//! Logging configuration

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Crate modules that accept a per-component log level.
pub const LOG_COMPONENTS: &[&str] = &[
    "cli",
    "collector",
    "config",
    "ingest",
    "logging",
    "repository",
    "routing",
    "schedule",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Multi-line output for terminals
    #[default]
    Pretty,
    /// One JSON object per event, for log shippers
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for everything without a component override
    pub level: String,
    pub format: LogFormat,
    /// Per-module levels, e.g. `{ collector = "debug", ingest = "warn" }`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub component_levels: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            component_levels: BTreeMap::new(),
        }
    }
}

fn parse_level(field: String, level: &str) -> Result<LevelFilter, ConfigError> {
    LevelFilter::from_str(level).map_err(|_| ConfigError::Validation {
        field,
        message: format!("unknown log level '{}'", level),
    })
}

impl LoggingConfig {
    /// Base level as a filter.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        parse_level("logging.level".to_string(), &self.level)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        self.level_filter()?;
        for (component, level) in &self.component_levels {
            let field = format!("logging.component_levels.{}", component);
            if !LOG_COMPONENTS.contains(&component.as_str()) {
                return Err(ConfigError::Validation {
                    field,
                    message: format!("unknown component; expected one of {}", LOG_COMPONENTS.join(", ")),
                });
            }
            parse_level(field, level)?;
        }
        Ok(())
    }
}
