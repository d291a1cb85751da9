//! Schedule preview command

use crate::cli::output::{format_schedule_json, format_schedule_table, ScheduleView};
use crate::cli::ScheduleArgs;
use crate::config::HarvestConfig;
use crate::model::InstrumentId;
use crate::schedule::{build_schedule, RandomDelayProvider, ScheduleSettings};

/// Handle `harvest schedule` command
pub fn handle_schedule(args: &ScheduleArgs, config: &HarvestConfig) -> anyhow::Result<String> {
    let instrument = InstrumentId::new(&args.id)?;
    let settings = ScheduleSettings::try_from(&config.collection)?;
    let mut delays = match args.seed {
        Some(seed) => RandomDelayProvider::seeded(seed),
        None => RandomDelayProvider::new(),
    };

    let page_url = instrument.page_url(&config.collection.page_url_template);
    let schedule = build_schedule(instrument, chrono::Utc::now(), &settings, &mut delays);
    let view = ScheduleView::new(&schedule, page_url);

    if args.json {
        Ok(format_schedule_json(&view)?)
    } else {
        Ok(format_schedule_table(&view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(id: &str, seed: Option<u64>, json: bool) -> ScheduleArgs {
        ScheduleArgs {
            id: id.to_string(),
            seed,
            json,
            config: PathBuf::from("harvest.toml"),
        }
    }

    fn step_delays(output: &str) -> Vec<u64> {
        let parsed: serde_json::Value = serde_json::from_str(output).unwrap();
        parsed["steps"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["delay_ms"].as_u64().unwrap())
            .collect()
    }

    #[test]
    fn test_seeded_schedules_repeat() {
        let config = HarvestConfig::default();
        let a = handle_schedule(&args("325406", Some(11), true), &config).unwrap();
        let b = handle_schedule(&args("325406", Some(11), true), &config).unwrap();
        assert_eq!(step_delays(&a), step_delays(&b));
    }

    #[test]
    fn test_delays_respect_configured_minimums() {
        let config = HarvestConfig::default();
        let output = handle_schedule(&args("325406", Some(3), true), &config).unwrap();
        let delays = step_delays(&output);
        assert_eq!(delays.len(), 8);
        // activate_chart_view minimum 2500 + jitter in 400..=1800
        assert!((2900..=4300).contains(&delays[0]));
    }

    #[test]
    fn test_blank_instrument_rejected() {
        let err = handle_schedule(&args("  ", None, false), &HarvestConfig::default()).unwrap_err();
        assert!(err.to_string().contains("instrument id cannot be empty"));
    }
}
