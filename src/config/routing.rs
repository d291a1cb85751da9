//! Response routing configuration

use super::ConfigError;
use crate::routing::{default_patterns, EndpointPattern};
use serde::{Deserialize, Serialize};

/// Endpoint patterns tried in order against captured response URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub patterns: Vec<EndpointPattern>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }
}

impl RoutingConfig {
    pub fn endpoint_patterns(&self) -> Vec<EndpointPattern> {
        self.patterns.clone()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (i, pattern) in self.patterns.iter().enumerate() {
            if pattern.fragments.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("routing.patterns[{}].fragments", i),
                    message: "pattern needs at least one fragment".to_string(),
                });
            }
            if pattern.fragments.iter().any(|f| f.is_empty()) {
                return Err(ConfigError::Validation {
                    field: format!("routing.patterns[{}].fragments", i),
                    message: "fragments cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
