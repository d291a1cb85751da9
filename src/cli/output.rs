//! Output formatting helpers for CLI commands

use crate::model::{DataSlotKind, InteractionStepKind};
use crate::schedule::CollectionSchedule;
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;

/// View model for one scheduled step
#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub step: InteractionStepKind,
    pub slot: Option<DataSlotKind>,
    pub delay_ms: u64,
    pub offset_ms: u64,
    pub fire_at: DateTime<Utc>,
}

/// View model for schedule display
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleView {
    pub instrument: String,
    pub page_url: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub inter_page_delay_ms: u64,
    pub steps: Vec<StepView>,
}

impl ScheduleView {
    pub fn new(schedule: &CollectionSchedule, page_url: String) -> Self {
        let mut offset_ms = 0;
        let steps = schedule
            .steps()
            .iter()
            .map(|s| {
                offset_ms += s.delay.as_millis() as u64;
                StepView {
                    step: s.step,
                    slot: s.step.slot(),
                    delay_ms: s.delay.as_millis() as u64,
                    offset_ms,
                    fire_at: s.fire_at,
                }
            })
            .collect();

        Self {
            instrument: schedule.instrument().to_string(),
            page_url,
            start_time: schedule.start_time(),
            stop_time: schedule.stop_time(),
            total_duration_ms: schedule.total_duration().as_millis() as u64,
            inter_page_delay_ms: schedule.inter_page_delay().as_millis() as u64,
            steps,
        }
    }
}

fn format_ms(ms: u64) -> String {
    format!("{}.{:03}s", ms / 1000, ms % 1000)
}

/// Format a schedule as a table with a summary footer
pub fn format_schedule_table(view: &ScheduleView) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Step", "Slot", "Delay", "Offset", "Fires At"]);

    for (i, s) in view.steps.iter().enumerate() {
        let slot = match s.slot {
            Some(slot) => slot.to_string(),
            None => "-".dimmed().to_string(),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(s.step),
            Cell::new(slot),
            Cell::new(format_ms(s.delay_ms)),
            Cell::new(format_ms(s.offset_ms)),
            Cell::new(s.fire_at.format("%H:%M:%S%.3f")),
        ]);
    }

    format!(
        "{} {} ({})\n{}\n{} {} (stop at {})\n{} {}",
        "Instrument:".bold(),
        view.instrument,
        view.page_url,
        table,
        "Total:".bold(),
        format_ms(view.total_duration_ms),
        view.stop_time.format("%H:%M:%S%.3f"),
        "Next page in:".bold(),
        format_ms(view.inter_page_delay_ms),
    )
}

/// Format a schedule as JSON
pub fn format_schedule_json(view: &ScheduleView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}
