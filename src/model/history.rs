use super::InstrumentId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One persisted time-series entry, unique per (instrument, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub instrument: InstrumentId,
    pub date: NaiveDate,
    pub value: Decimal,
}

impl HistoryRecord {
    /// Uniqueness key.
    pub fn key(&self) -> (InstrumentId, NaiveDate) {
        (self.instrument.clone(), self.date)
    }
}
