//! Shared test utilities for chart-harvest integration tests.
//!
//! Provides a simulated fund page that answers interactions with chart
//! responses, plus schedule and collector builders with fixed timing.

#![allow(dead_code)]

use async_trait::async_trait;
use chart_harvest::collector::{
    CapturedResponse, Collector, InteractionError, Interactor, Scheduler, TokioScheduler,
};
use chart_harvest::model::{DataSlotKind, InstrumentId, InteractionStepKind};
use chart_harvest::routing::default_patterns;
use chart_harvest::schedule::{
    build_schedule, CollectionSchedule, DelayBounds, RandomDelayProvider, ScheduleSettings,
    StepDelays,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

// =============================================================================
// Well-Known Test Constants
// =============================================================================

pub const INSTRUMENT: &str = "325406";

/// Wait before every step in [`fixed_settings`]
pub const STEP_DELAY: Duration = Duration::from_secs(1);

/// Safety margin in [`fixed_settings`]
pub const SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Stop time offset for a schedule built from [`fixed_settings`]: 8 steps + margin
pub const STOP_OFFSET: Duration = Duration::from_secs(13);

/// 2026-02-18 00:00 in Stockholm
pub const BASE_TIMESTAMP_MS: i64 = 1_771_369_200_000;

pub const DAY_MS: i64 = 86_400_000;

pub fn instrument() -> InstrumentId {
    InstrumentId::new(INSTRUMENT).unwrap()
}

pub fn wall_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap()
}

// =============================================================================
// Schedule Builders
// =============================================================================

/// Settings without jitter: steps fire every [`STEP_DELAY`].
pub fn fixed_settings() -> ScheduleSettings {
    ScheduleSettings {
        step_minimums: StepDelays::uniform(STEP_DELAY),
        step_jitter: DelayBounds::fixed(Duration::ZERO),
        safety_margin: SAFETY_MARGIN,
        inter_page: DelayBounds::fixed(Duration::ZERO),
    }
}

pub fn fixed_schedule(start: DateTime<Utc>) -> CollectionSchedule {
    build_schedule(
        instrument(),
        start,
        &fixed_settings(),
        &mut RandomDelayProvider::seeded(0),
    )
}

// =============================================================================
// Chart Endpoints
// =============================================================================

fn period(slot: DataSlotKind) -> &'static str {
    match slot {
        DataSlotKind::OneMonth => "one_month",
        DataSlotKind::ThreeMonths => "three_months",
        DataSlotKind::YearToDate => "this_year",
        DataSlotKind::OneYear => "one_year",
        DataSlotKind::ThreeYears => "three_years",
        DataSlotKind::FiveYears => "five_years",
        DataSlotKind::Max => "infinity",
    }
}

pub fn chart_url(slot: DataSlotKind) -> String {
    format!(
        "https://funds.example.com/_api/fund-guide/chart/{}/{}",
        INSTRUMENT,
        period(slot)
    )
}

/// Chart body for `slot`.
///
/// Every slot reports the base date with value `100 + index` and one date
/// of its own, `index + 1` days earlier, with value `index`.
pub fn chart_payload(slot: DataSlotKind) -> String {
    let i = slot.index() as i64;
    format!(
        r#"{{"dataSerie":[{{"x":{},"y":{}}},{{"x":{},"y":{}}}]}}"#,
        BASE_TIMESTAMP_MS,
        100 + i,
        BASE_TIMESTAMP_MS - (i + 1) * DAY_MS,
        i
    )
}

pub fn chart_response(slot: DataSlotKind) -> CapturedResponse {
    CapturedResponse::new(chart_url(slot), 200, chart_payload(slot))
}

// =============================================================================
// Simulated Page
// =============================================================================

/// Fund page stand-in that answers each period click with its chart response.
pub struct SimulatedPage {
    collector: OnceLock<Weak<Collector>>,
    latency: Duration,
    silent: HashSet<DataSlotKind>,
    missing: HashSet<InteractionStepKind>,
    performed: Mutex<Vec<InteractionStepKind>>,
}

impl SimulatedPage {
    pub fn new(latency: Duration) -> Self {
        Self {
            collector: OnceLock::new(),
            latency,
            silent: HashSet::new(),
            missing: HashSet::new(),
            performed: Mutex::new(Vec::new()),
        }
    }

    /// Slots whose clicks never produce a response.
    pub fn with_silent(mut self, slots: impl IntoIterator<Item = DataSlotKind>) -> Self {
        self.silent.extend(slots);
        self
    }

    /// Steps whose control is absent from the page.
    pub fn with_missing(mut self, steps: impl IntoIterator<Item = InteractionStepKind>) -> Self {
        self.missing.extend(steps);
        self
    }

    pub fn attach(&self, collector: &Arc<Collector>) {
        let _ = self.collector.set(Arc::downgrade(collector));
    }

    pub fn performed(&self) -> Vec<InteractionStepKind> {
        self.performed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interactor for SimulatedPage {
    async fn perform_interaction(&self, step: InteractionStepKind) -> Result<(), InteractionError> {
        if self.missing.contains(&step) {
            return Err(InteractionError::NotFound { step });
        }
        self.performed.lock().unwrap().push(step);

        let Some(slot) = step.slot() else {
            return Ok(());
        };
        if self.silent.contains(&slot) {
            return Ok(());
        }

        tokio::time::sleep(self.latency).await;
        if let Some(collector) = self.collector.get().and_then(Weak::upgrade) {
            collector.notify_response_captured(chart_response(slot));
        }
        Ok(())
    }
}

// =============================================================================
// Collector Builders
// =============================================================================

/// Collector wired to `page` with a scheduler anchored at [`wall_start`].
///
/// Call inside a paused-clock runtime for virtual time.
pub fn collector_for(page: Arc<SimulatedPage>) -> (Arc<Collector>, Arc<TokioScheduler>) {
    let scheduler = Arc::new(TokioScheduler::starting_at(wall_start()));
    let collector = Arc::new(Collector::new(
        page.clone(),
        scheduler.clone() as Arc<dyn Scheduler>,
        default_patterns(),
    ));
    page.attach(&collector);
    (collector, scheduler)
}

/// Page that answers every slot after `latency`.
pub fn responsive_page(latency: Duration) -> Arc<SimulatedPage> {
    Arc::new(SimulatedPage::new(latency))
}

/// Page that never answers.
pub fn silent_page() -> Arc<SimulatedPage> {
    Arc::new(SimulatedPage::new(Duration::ZERO).with_silent(DataSlotKind::ALL))
}
