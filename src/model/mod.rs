//! Core value types shared by the scheduler, collector and ingestion.
//!
//! Everything here is a plain value: identifiers, the closed sets of chart
//! slots and interaction steps, the immutable [`PageData`] aggregate and the
//! persisted [`HistoryRecord`].

mod error;
mod history;
mod page;

pub use error::*;
pub use history::*;
pub use page::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque external key for a fund (the order-book id in the page URL).
///
/// # Examples
///
/// ```
/// use chart_harvest::model::InstrumentId;
///
/// let id = InstrumentId::new("325406").unwrap();
/// assert_eq!(id.as_str(), "325406");
/// assert!(InstrumentId::new("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentId(String);

impl InstrumentId {
    /// Create an identifier, rejecting empty or whitespace-only keys.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyInstrumentId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the fund page URL by substituting `{id}` in the template.
    pub fn page_url(&self, template: &str) -> String {
        template.replace("{id}", &self.0)
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InstrumentId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstrumentId> for String {
    fn from(id: InstrumentId) -> Self {
        id.0
    }
}

/// Chart time period a captured response is stored under.
///
/// The declaration order is the fixed processing order used by ingestion
/// deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSlotKind {
    OneMonth,
    ThreeMonths,
    YearToDate,
    OneYear,
    ThreeYears,
    FiveYears,
    Max,
}

impl DataSlotKind {
    /// All slots in fixed order.
    pub const ALL: [DataSlotKind; 7] = [
        DataSlotKind::OneMonth,
        DataSlotKind::ThreeMonths,
        DataSlotKind::YearToDate,
        DataSlotKind::OneYear,
        DataSlotKind::ThreeYears,
        DataSlotKind::FiveYears,
        DataSlotKind::Max,
    ];

    /// Position of this slot in [`DataSlotKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataSlotKind::OneMonth => "one_month",
            DataSlotKind::ThreeMonths => "three_months",
            DataSlotKind::YearToDate => "year_to_date",
            DataSlotKind::OneYear => "one_year",
            DataSlotKind::ThreeYears => "three_years",
            DataSlotKind::FiveYears => "five_years",
            DataSlotKind::Max => "max",
        }
    }
}

impl fmt::Display for DataSlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI interaction performed during a page visit, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionStepKind {
    /// Switch the page into chart display mode. Produces no slot data.
    ActivateChartView,
    SelectOneMonth,
    SelectThreeMonths,
    SelectYearToDate,
    SelectOneYear,
    SelectThreeYears,
    SelectFiveYears,
    SelectMax,
}

impl InteractionStepKind {
    /// All steps in firing order.
    pub const ALL: [InteractionStepKind; 8] = [
        InteractionStepKind::ActivateChartView,
        InteractionStepKind::SelectOneMonth,
        InteractionStepKind::SelectThreeMonths,
        InteractionStepKind::SelectYearToDate,
        InteractionStepKind::SelectOneYear,
        InteractionStepKind::SelectThreeYears,
        InteractionStepKind::SelectFiveYears,
        InteractionStepKind::SelectMax,
    ];

    /// Position of this step in [`InteractionStepKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot whose response this step triggers, if any.
    pub fn slot(self) -> Option<DataSlotKind> {
        match self {
            InteractionStepKind::ActivateChartView => None,
            InteractionStepKind::SelectOneMonth => Some(DataSlotKind::OneMonth),
            InteractionStepKind::SelectThreeMonths => Some(DataSlotKind::ThreeMonths),
            InteractionStepKind::SelectYearToDate => Some(DataSlotKind::YearToDate),
            InteractionStepKind::SelectOneYear => Some(DataSlotKind::OneYear),
            InteractionStepKind::SelectThreeYears => Some(DataSlotKind::ThreeYears),
            InteractionStepKind::SelectFiveYears => Some(DataSlotKind::FiveYears),
            InteractionStepKind::SelectMax => Some(DataSlotKind::Max),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionStepKind::ActivateChartView => "activate_chart_view",
            InteractionStepKind::SelectOneMonth => "select_one_month",
            InteractionStepKind::SelectThreeMonths => "select_three_months",
            InteractionStepKind::SelectYearToDate => "select_year_to_date",
            InteractionStepKind::SelectOneYear => "select_one_year",
            InteractionStepKind::SelectThreeYears => "select_three_years",
            InteractionStepKind::SelectFiveYears => "select_five_years",
            InteractionStepKind::SelectMax => "select_max",
        }
    }
}

impl fmt::Display for InteractionStepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_id_trims_and_rejects_empty() {
        assert_eq!(InstrumentId::new(" 1234 ").unwrap().as_str(), "1234");
        assert!(matches!(
            InstrumentId::new(""),
            Err(ModelError::EmptyInstrumentId)
        ));
    }

    #[test]
    fn test_instrument_id_serde_validates() {
        let id: InstrumentId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id.as_str(), "42");
        assert!(serde_json::from_str::<InstrumentId>("\"\"").is_err());
    }

    #[test]
    fn test_page_url_substitutes_id() {
        let id = InstrumentId::new("325406").unwrap();
        assert_eq!(
            id.page_url("https://funds.example.com/fund/{id}"),
            "https://funds.example.com/fund/325406"
        );
    }

    #[test]
    fn test_every_slot_has_exactly_one_step() {
        for slot in DataSlotKind::ALL {
            let steps: Vec<_> = InteractionStepKind::ALL
                .iter()
                .filter(|s| s.slot() == Some(slot))
                .collect();
            assert_eq!(steps.len(), 1, "slot {}", slot);
        }
        assert_eq!(InteractionStepKind::ALL[0].slot(), None);
    }

    #[test]
    fn test_step_order_follows_slot_order() {
        let slots: Vec<_> = InteractionStepKind::ALL
            .iter()
            .filter_map(|s| s.slot())
            .collect();
        assert_eq!(slots, DataSlotKind::ALL.to_vec());
    }

    #[test]
    fn test_slot_index_matches_position() {
        for (i, slot) in DataSlotKind::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }

    #[test]
    fn test_slot_serde_snake_case() {
        let json = serde_json::to_string(&DataSlotKind::YearToDate).unwrap();
        assert_eq!(json, "\"year_to_date\"");
        let kind: DataSlotKind = serde_json::from_str("\"three_months\"").unwrap();
        assert_eq!(kind, DataSlotKind::ThreeMonths);
    }
}
