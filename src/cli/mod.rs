//! CLI module for chart-harvest
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `schedule` - Preview the timing plan for one page visit
//! - `ingest` - Ingest dumped page data into a JSON history store
//! - `route` - Show which data slot a response URL belongs to
//! - `config` - Configuration utilities (init)
//!
//! # Example
//!
//! ```bash
//! # Preview a reproducible schedule
//! harvest schedule 325406 --seed 7
//!
//! # Ingest a page dump
//! harvest ingest page-325406.json --store history.json
//! ```

pub mod config;
pub mod ingest;
pub mod output;
pub mod route;
pub mod schedule;

pub use config::handle_config_init;
pub use ingest::handle_ingest;
pub use route::handle_route;
pub use schedule::handle_schedule;

use crate::config::HarvestConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// chart-harvest - Fund chart history collector
#[derive(Parser, Debug)]
#[command(
    name = "harvest",
    version,
    about = "Fund chart time-series collector"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview a collection schedule
    Schedule(ScheduleArgs),
    /// Ingest dumped page data into a history store
    Ingest(IngestArgs),
    /// Show the data slot a response URL routes to
    Route(RouteArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Instrument identifier
    pub id: String,

    /// Seed the delay generator for a reproducible schedule
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "harvest.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Page data JSON file
    pub page_data: PathBuf,

    /// JSON history store (created if missing)
    #[arg(short, long)]
    pub store: PathBuf,

    /// Record under this instrument instead of the one in the page data
    #[arg(short, long)]
    pub instrument: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "harvest.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Captured request URL
    pub url: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "harvest.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "harvest.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Load configuration for a command
///
/// A missing file at `path` means defaults. Environment overrides are
/// applied before validation.
pub fn load_config(path: &Path) -> Result<HarvestConfig, crate::config::ConfigError> {
    let config = if path.exists() {
        HarvestConfig::load(Some(path))?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        HarvestConfig::default()
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_schedule_defaults() {
        let cli = Cli::try_parse_from(["harvest", "schedule", "325406"]).unwrap();
        match cli.command {
            Commands::Schedule(args) => {
                assert_eq!(args.id, "325406");
                assert_eq!(args.config, PathBuf::from("harvest.toml"));
                assert!(args.seed.is_none());
                assert!(!args.json);
            }
            _ => panic!("Expected Schedule command"),
        }
    }

    #[test]
    fn test_cli_parse_schedule_with_seed_json() {
        let cli =
            Cli::try_parse_from(["harvest", "schedule", "325406", "--seed", "7", "--json"]).unwrap();
        match cli.command {
            Commands::Schedule(args) => {
                assert_eq!(args.seed, Some(7));
                assert!(args.json);
            }
            _ => panic!("Expected Schedule command"),
        }
    }

    #[test]
    fn test_cli_parse_ingest() {
        let cli = Cli::try_parse_from([
            "harvest",
            "ingest",
            "page.json",
            "--store",
            "history.json",
            "-i",
            "999",
        ])
        .unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.page_data, PathBuf::from("page.json"));
                assert_eq!(args.store, PathBuf::from("history.json"));
                assert_eq!(args.instrument.as_deref(), Some("999"));
            }
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_cli_parse_ingest_requires_store() {
        assert!(Cli::try_parse_from(["harvest", "ingest", "page.json"]).is_err());
    }

    #[test]
    fn test_cli_parse_route() {
        let cli = Cli::try_parse_from(["harvest", "route", "https://x.test/chart/1"]).unwrap();
        assert!(matches!(cli.command, Commands::Route(_)));
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::try_parse_from(["harvest", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => assert!(args.force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.collection.safety_margin_ms, 8000);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[collection]\nsafety_margin_ms = 0").unwrap();
        assert!(load_config(temp.path()).is_err());
    }
}
