//! Collection schedule calculation.
//!
//! Turns the fixed interaction order into absolute fire times with randomized
//! spacing, plus the deadline and the pause before the next page visit.

mod delay;
mod error;


pub use delay::*;
pub use error::*;

use crate::model::{InstrumentId, InteractionStepKind};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Minimum delay preceding each interaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDelays([Duration; 8]);

impl StepDelays {
    /// Same minimum for every step.
    pub fn uniform(delay: Duration) -> Self {
        Self([delay; 8])
    }

    pub fn get(&self, step: InteractionStepKind) -> Duration {
        self.0[step.index()]
    }

    /// Copy with `step`'s minimum replaced.
    pub fn with(mut self, step: InteractionStepKind, delay: Duration) -> Self {
        self.0[step.index()] = delay;
        self
    }

    /// Sum of all minimums.
    pub fn total(&self) -> Duration {
        self.0.iter().sum()
    }
}

/// Inputs to [`build_schedule`] other than the instrument and start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Minimum wait before each step
    pub step_minimums: StepDelays,
    /// Extra randomized wait added on top of each step's minimum
    pub step_jitter: DelayBounds,
    /// Time after the last step allowed for its response to arrive
    pub safety_margin: Duration,
    /// Pause before the next page visit
    pub inter_page: DelayBounds,
}

/// One interaction and the moment it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledStep {
    pub step: InteractionStepKind,
    pub fire_at: DateTime<Utc>,
    /// Wait between the previous step (or start) and this one
    pub delay: Duration,
}

/// Immutable timing plan for one page visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchedule {
    instrument: InstrumentId,
    start_time: DateTime<Utc>,
    steps: Vec<ScheduledStep>,
    stop_time: DateTime<Utc>,
    total_duration: Duration,
    inter_page_delay: Duration,
}

impl CollectionSchedule {
    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Steps in firing order.
    pub fn steps(&self) -> &[ScheduledStep] {
        &self.steps
    }

    /// Safety-net deadline for the visit.
    pub fn stop_time(&self) -> DateTime<Utc> {
        self.stop_time
    }

    /// `stop_time - start_time`.
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Wait before starting the next visit; not part of `total_duration`.
    pub fn inter_page_delay(&self) -> Duration {
        self.inter_page_delay
    }

    pub fn last_fire_time(&self) -> DateTime<Utc> {
        self.steps
            .last()
            .map(|s| s.fire_at)
            .unwrap_or(self.start_time)
    }
}

/// Compute the schedule for one page visit.
///
/// Each step waits its configured minimum plus a jitter drawn from
/// `delays`; the stop time adds the safety margin after the last step. The
/// inter-page delay is drawn last. Deterministic for a seeded provider.
///
/// # Examples
///
/// ```
/// use chart_harvest::model::InstrumentId;
/// use chart_harvest::schedule::{
///     build_schedule, DelayBounds, RandomDelayProvider, ScheduleSettings, StepDelays,
/// };
/// use std::time::Duration;
///
/// let settings = ScheduleSettings {
///     step_minimums: StepDelays::uniform(Duration::from_secs(1)),
///     step_jitter: DelayBounds::from_millis(0, 500).unwrap(),
///     safety_margin: Duration::from_secs(5),
///     inter_page: DelayBounds::from_millis(2_000, 4_000).unwrap(),
/// };
/// let schedule = build_schedule(
///     InstrumentId::new("42").unwrap(),
///     chrono::Utc::now(),
///     &settings,
///     &mut RandomDelayProvider::seeded(1),
/// );
///
/// assert_eq!(schedule.steps().len(), 8);
/// assert!(schedule.total_duration() >= Duration::from_secs(13));
/// ```
pub fn build_schedule<D: DelayProvider + ?Sized>(
    instrument: InstrumentId,
    start_time: DateTime<Utc>,
    settings: &ScheduleSettings,
    delays: &mut D,
) -> CollectionSchedule {
    let mut offset = Duration::ZERO;
    let steps = InteractionStepKind::ALL
        .into_iter()
        .map(|step| {
            let delay = settings.step_minimums.get(step) + delays.next_delay(&settings.step_jitter);
            offset += delay;
            ScheduledStep {
                step,
                fire_at: start_time + offset,
                delay,
            }
        })
        .collect();

    let total_duration = offset + settings.safety_margin;
    let inter_page_delay = delays.next_delay(&settings.inter_page);

    CollectionSchedule {
        instrument,
        start_time,
        steps,
        stop_time: start_time + total_duration,
        total_duration,
        inter_page_delay,
    }
}
