//! Tracing setup
//!
//! Builds the `EnvFilter` directives from [`LoggingConfig`] and installs
//! the pretty or JSON subscriber. `RUST_LOG` takes precedence when set.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Returns
///
/// A filter string in the format: "base_level,chart_harvest::component1=level1,..."
///
/// # Examples
///
/// ```
/// use chart_harvest::config::{LogFormat, LoggingConfig};
/// use chart_harvest::logging::build_filter_directives;
/// use std::collections::BTreeMap;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: BTreeMap::from([("collector".to_string(), "debug".to_string())]),
/// };
///
/// let filter_str = build_filter_directives(&config);
/// assert_eq!(filter_str, "info,chart_harvest::collector=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    for (component, level) in &config.component_levels {
        filter_str.push_str(&format!(",chart_harvest::{}={}", component, level));
    }

    filter_str
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter_str = build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    // stdout carries command output
    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_filter_without_components() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn test_filter_components_sorted() {
        let config = LoggingConfig {
            level: "error".to_string(),
            format: LogFormat::Json,
            component_levels: BTreeMap::from([
                ("ingest".to_string(), "warn".to_string()),
                ("collector".to_string(), "trace".to_string()),
            ]),
        };
        assert_eq!(
            build_filter_directives(&config),
            "error,chart_harvest::collector=trace,chart_harvest::ingest=warn"
        );
    }
}
