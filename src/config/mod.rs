//! Configuration module for chart-harvest
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`HARVEST_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use chart_harvest::config::HarvestConfig;
//!
//! // Load defaults
//! let config = HarvestConfig::default();
//! assert_eq!(config.collection.safety_margin_ms, 8000);
//!
//! // Parse from TOML
//! let toml = r#"
//! [collection]
//! safety_margin_ms = 12000
//! "#;
//! let config: HarvestConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.collection.safety_margin_ms, 12000);
//! ```

pub mod collection;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod routing;

pub use collection::{CollectionConfig, StepMinimumConfig};
pub use error::ConfigError;
pub use ingest::IngestConfig;
pub use logging::{LogFormat, LoggingConfig, LOG_COMPONENTS};
pub use routing::RoutingConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for chart collection and ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HarvestConfig {
    /// Page visit timing
    pub collection: CollectionConfig,
    /// Response URL patterns
    pub routing: RoutingConfig,
    /// History ingestion settings
    pub ingest: IngestConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl HarvestConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports HARVEST_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("HARVEST_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("HARVEST_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(tz) = std::env::var("HARVEST_MARKET_TIMEZONE") {
            self.ingest.market_timezone = tz;
        }
        if let Ok(template) = std::env::var("HARVEST_PAGE_URL_TEMPLATE") {
            self.collection.page_url_template = template;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.collection.validate()?;
        self.routing.validate()?;
        self.ingest.timezone()?;
        self.logging.validate()?;
        Ok(())
    }
}
