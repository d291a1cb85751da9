//! Config command handlers

use crate::cli::ConfigInitArgs;
use anyhow::bail;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../harvest.example.toml");

/// Handle `harvest config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<String> {
    if args.output.exists() && !args.force {
        bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    Ok(format!(
        "✓ Configuration file created: {}\n  Edit this file to tune collection timing and routing.",
        args.output.display()
    ))
}
