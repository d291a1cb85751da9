//! Chart ingestion.
//!
//! Turns the payloads of a completed page visit into history records and
//! writes them through a [`HistoryRepository`]. Bad data is dropped at the
//! smallest unit possible: a malformed point, or a whole slot whose payload
//! does not parse. Repository failures are returned to the caller.

mod error;
mod parser;

pub use error::*;
pub use parser::*;

use crate::model::{HistoryRecord, InstrumentId, PageData};
use crate::repository::HistoryRepository;
use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::Arc;

/// Writes chart points from completed page visits into history storage.
pub struct ChartIngestionService {
    repository: Arc<dyn HistoryRepository>,
    timezone: Tz,
}

impl ChartIngestionService {
    /// `timezone` is the market's zone, used to turn point timestamps into
    /// calendar dates.
    pub fn new(repository: Arc<dyn HistoryRepository>, timezone: Tz) -> Self {
        Self {
            repository,
            timezone,
        }
    }

    /// Deduplicated records for `page`, in slot order.
    ///
    /// When several slots carry the same date, the record from the slot that
    /// comes first in slot order is kept.
    pub fn records_for(&self, page: &PageData, instrument: &InstrumentId) -> Vec<HistoryRecord> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for (slot, fetch) in page.slots() {
            let Some(payload) = fetch.payload() else {
                continue;
            };

            let series = match parse_chart_payload(payload) {
                Ok(series) => series,
                Err(error) => {
                    tracing::warn!(
                        instrument = %instrument,
                        slot = %slot,
                        error = %error,
                        "Skipping slot with unparseable chart payload"
                    );
                    continue;
                }
            };

            let mut skipped = series.skipped;
            for point in series.points {
                let Some(date) = point.date_in(self.timezone) else {
                    skipped += 1;
                    continue;
                };
                if seen.insert(date) {
                    records.push(HistoryRecord {
                        instrument: instrument.clone(),
                        date,
                        value: point.value,
                    });
                }
            }

            if skipped > 0 {
                metrics::counter!("harvest_points_skipped_total").increment(skipped as u64);
                tracing::warn!(
                    instrument = %instrument,
                    slot = %slot,
                    skipped,
                    "Skipped malformed chart points"
                );
            }
        }

        records
    }

    /// Persist the chart data of `page` for `instrument`.
    ///
    /// Returns the number of records that were not already stored. Makes no
    /// repository call when there is nothing to write.
    ///
    /// # Errors
    ///
    /// Repository errors are returned unchanged.
    pub async fn ingest_chart_data(
        &self,
        page: &PageData,
        instrument: &InstrumentId,
    ) -> Result<usize, IngestError> {
        if page.instrument() != instrument {
            tracing::warn!(
                instrument = %instrument,
                page_instrument = %page.instrument(),
                "Ingesting page data collected for a different instrument"
            );
        }

        if page.succeeded_count() == 0 {
            tracing::debug!(instrument = %instrument, "No successful chart slots, nothing to ingest");
            return Ok(0);
        }

        let records = self.records_for(page, instrument);
        if records.is_empty() {
            tracing::debug!(instrument = %instrument, "No chart points survived parsing");
            return Ok(0);
        }

        let candidates = records.len();
        let inserted = self.repository.add_records_if_absent(records).await?;
        self.repository.save_changes().await?;

        metrics::counter!("harvest_records_inserted_total").increment(inserted as u64);
        tracing::info!(
            instrument = %instrument,
            candidates,
            inserted,
            "Chart history ingested"
        );

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataSlotKind, FetchSlot};
    use crate::repository::{InMemoryHistoryRepository, RepositoryError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn instrument() -> InstrumentId {
        InstrumentId::new("325406").unwrap()
    }

    fn service(repo: Arc<dyn HistoryRepository>) -> ChartIngestionService {
        ChartIngestionService::new(repo, chrono_tz::Europe::Stockholm)
    }

    /// Counts calls and fails on demand.
    #[derive(Default)]
    struct RecordingRepository {
        adds: AtomicUsize,
        saves: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl HistoryRepository for RecordingRepository {
        async fn add_records_if_absent(
            &self,
            records: Vec<HistoryRecord>,
        ) -> Result<usize, RepositoryError> {
            self.adds.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RepositoryError::Storage("database offline".to_string()));
            }
            Ok(records.len())
        }

        async fn save_changes(&self) -> Result<(), RepositoryError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_no_successful_slots_skips_repository() {
        let repo = Arc::new(RecordingRepository::default());
        let page = PageData::new(instrument()).with_pending_failed("deadline exceeded");

        let inserted = service(repo.clone())
            .ingest_chart_data(&page, &instrument())
            .await
            .unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(repo.adds.load(Ordering::SeqCst), 0);
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_only_garbage_payloads_skip_repository() {
        let repo = Arc::new(RecordingRepository::default());
        let page = PageData::new(instrument())
            .with_slot(DataSlotKind::OneMonth, FetchSlot::succeeded("<html>"));

        let inserted = service(repo.clone())
            .ingest_chart_data(&page, &instrument())
            .await
            .unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(repo.adds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let repo = Arc::new(RecordingRepository {
            fail: true,
            ..Default::default()
        });
        let page = PageData::new(instrument()).with_slot(
            DataSlotKind::OneMonth,
            FetchSlot::succeeded(r#"{"dataSerie":[{"x":1771369200000,"y":1}]}"#),
        );

        let err = service(repo.clone())
            .ingest_chart_data(&page, &instrument())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::Repository(RepositoryError::Storage(_))
        ));
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_records_use_argument_instrument() {
        let other = InstrumentId::new("999").unwrap();
        let page = PageData::new(instrument()).with_slot(
            DataSlotKind::Max,
            FetchSlot::succeeded(r#"{"dataSerie":[{"x":1771369200000,"y":2.5}]}"#),
        );

        let records =
            service(Arc::new(InMemoryHistoryRepository::new())).records_for(&page, &other);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instrument, other);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2026, 2, 18).unwrap());
        assert_eq!(records[0].value, Decimal::new(25, 1));
    }

    #[test]
    fn test_failed_and_pending_slots_contribute_nothing() {
        let page = PageData::new(instrument())
            .with_slot(DataSlotKind::OneMonth, FetchSlot::failed("control not found"))
            .with_slot(
                DataSlotKind::OneYear,
                FetchSlot::succeeded(r#"{"dataSerie":[{"x":1770678000000,"y":3}]}"#),
            );

        let records = service(Arc::new(InMemoryHistoryRepository::new()))
            .records_for(&page, &instrument());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
    }
}
