//! Ingestion configuration

use super::ConfigError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// IANA zone the chart source reports local midnights in
    pub market_timezone: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            market_timezone: "Europe/Stockholm".to_string(),
        }
    }
}

impl IngestConfig {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.market_timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Validation {
                field: "ingest.market_timezone".to_string(),
                message: format!("unknown time zone '{}'", self.market_timezone),
            })
    }
}
