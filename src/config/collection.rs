//! Collection timing configuration

use super::ConfigError;
use crate::model::InteractionStepKind;
use crate::schedule::{DelayBounds, ScheduleSettings, StepDelays};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest visit or pause a configuration may describe: one day.
pub const MAX_WINDOW_MS: u64 = 86_400_000;

/// Minimum wait before each interaction step, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepMinimumConfig {
    pub activate_chart_view: u64,
    pub one_month: u64,
    pub three_months: u64,
    pub year_to_date: u64,
    pub one_year: u64,
    pub three_years: u64,
    pub five_years: u64,
    pub max: u64,
}

impl Default for StepMinimumConfig {
    fn default() -> Self {
        Self {
            activate_chart_view: 2500,
            one_month: 1500,
            three_months: 1500,
            year_to_date: 1500,
            one_year: 1500,
            three_years: 1500,
            five_years: 1500,
            max: 2000,
        }
    }
}

impl StepMinimumConfig {
    pub fn get(&self, step: InteractionStepKind) -> u64 {
        match step {
            InteractionStepKind::ActivateChartView => self.activate_chart_view,
            InteractionStepKind::SelectOneMonth => self.one_month,
            InteractionStepKind::SelectThreeMonths => self.three_months,
            InteractionStepKind::SelectYearToDate => self.year_to_date,
            InteractionStepKind::SelectOneYear => self.one_year,
            InteractionStepKind::SelectThreeYears => self.three_years,
            InteractionStepKind::SelectFiveYears => self.five_years,
            InteractionStepKind::SelectMax => self.max,
        }
    }

    /// Sum of all minimums, saturating.
    pub fn total_ms(&self) -> u64 {
        InteractionStepKind::ALL
            .iter()
            .fold(0u64, |total, &step| total.saturating_add(self.get(step)))
    }

    pub fn to_step_delays(&self) -> StepDelays {
        InteractionStepKind::ALL
            .iter()
            .fold(StepDelays::uniform(Duration::ZERO), |delays, &step| {
                delays.with(step, Duration::from_millis(self.get(step)))
            })
    }
}

/// Page visit configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Fund page URL; `{id}` is replaced by the instrument id
    pub page_url_template: String,
    pub safety_margin_ms: u64,
    pub step_jitter_min_ms: u64,
    pub step_jitter_max_ms: u64,
    pub inter_page_min_ms: u64,
    pub inter_page_max_ms: u64,
    pub step_minimum_ms: StepMinimumConfig,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            page_url_template: "https://funds.example.com/fund/{id}".to_string(),
            safety_margin_ms: 8000,
            step_jitter_min_ms: 400,
            step_jitter_max_ms: 1800,
            inter_page_min_ms: 4000,
            inter_page_max_ms: 12000,
            step_minimum_ms: StepMinimumConfig::default(),
        }
    }
}

impl CollectionConfig {
    /// Longest possible visit: every minimum plus the largest jitter per step,
    /// then the safety margin.
    pub fn max_visit_ms(&self) -> u64 {
        let steps = InteractionStepKind::ALL.len() as u64;
        self.step_minimum_ms
            .total_ms()
            .saturating_add(self.step_jitter_max_ms.saturating_mul(steps))
            .saturating_add(self.safety_margin_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.page_url_template.contains("{id}") {
            return Err(ConfigError::Validation {
                field: "collection.page_url_template".to_string(),
                message: "template must contain {id}".to_string(),
            });
        }
        if self.safety_margin_ms == 0 {
            return Err(ConfigError::Validation {
                field: "collection.safety_margin_ms".to_string(),
                message: "safety margin must be non-zero".to_string(),
            });
        }
        if self.step_jitter_max_ms < self.step_jitter_min_ms {
            return Err(ConfigError::Validation {
                field: "collection.step_jitter_max_ms".to_string(),
                message: format!(
                    "must be at least step_jitter_min_ms ({})",
                    self.step_jitter_min_ms
                ),
            });
        }
        if self.inter_page_max_ms < self.inter_page_min_ms {
            return Err(ConfigError::Validation {
                field: "collection.inter_page_max_ms".to_string(),
                message: format!(
                    "must be at least inter_page_min_ms ({})",
                    self.inter_page_min_ms
                ),
            });
        }
        if self.max_visit_ms() > MAX_WINDOW_MS {
            return Err(ConfigError::Validation {
                field: "collection.step_minimum_ms".to_string(),
                message: format!(
                    "a visit could last {}ms, more than the {}ms limit",
                    self.max_visit_ms(),
                    MAX_WINDOW_MS
                ),
            });
        }
        if self.inter_page_max_ms > MAX_WINDOW_MS {
            return Err(ConfigError::Validation {
                field: "collection.inter_page_max_ms".to_string(),
                message: format!("must be at most {}ms", MAX_WINDOW_MS),
            });
        }
        Ok(())
    }
}

impl TryFrom<&CollectionConfig> for ScheduleSettings {
    type Error = ConfigError;

    fn try_from(config: &CollectionConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        let step_jitter =
            DelayBounds::from_millis(config.step_jitter_min_ms, config.step_jitter_max_ms)
                .map_err(|e| ConfigError::Validation {
                    field: "collection.step_jitter_max_ms".to_string(),
                    message: e.to_string(),
                })?;
        let inter_page =
            DelayBounds::from_millis(config.inter_page_min_ms, config.inter_page_max_ms)
                .map_err(|e| ConfigError::Validation {
                    field: "collection.inter_page_max_ms".to_string(),
                    message: e.to_string(),
                })?;

        Ok(ScheduleSettings {
            step_minimums: config.step_minimum_ms.to_step_delays(),
            step_jitter,
            safety_margin: Duration::from_millis(config.safety_margin_ms),
            inter_page,
        })
    }
}
