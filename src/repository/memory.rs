use super::{HistoryRepository, RepositoryError};
use crate::model::{HistoryRecord, InstrumentId};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Mutex;

type RecordKey = (InstrumentId, NaiveDate);

/// Thread-safe in-memory history store.
///
/// Staged records are invisible to readers until `save_changes`.
///
/// # Examples
///
/// ```
/// use chart_harvest::model::{HistoryRecord, InstrumentId};
/// use chart_harvest::repository::{HistoryRepository, InMemoryHistoryRepository};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// # tokio_test::block_on(async {
/// let repo = InMemoryHistoryRepository::new();
/// let record = HistoryRecord {
///     instrument: InstrumentId::new("42").unwrap(),
///     date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
///     value: Decimal::new(45783, 2),
/// };
///
/// assert_eq!(repo.add_records_if_absent(vec![record.clone()]).await.unwrap(), 1);
/// repo.save_changes().await.unwrap();
/// assert_eq!(repo.add_records_if_absent(vec![record]).await.unwrap(), 0);
/// assert_eq!(repo.len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    committed: DashMap<RecordKey, Decimal>,
    staged: Mutex<BTreeMap<RecordKey, Decimal>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-committed records (later duplicates replace earlier ones).
    pub fn with_records(records: impl IntoIterator<Item = HistoryRecord>) -> Self {
        let repo = Self::new();
        for record in records {
            repo.committed.insert(record.key(), record.value);
        }
        repo
    }

    /// Committed value for (instrument, date).
    pub fn get(&self, instrument: &InstrumentId, date: NaiveDate) -> Option<Decimal> {
        self.committed
            .get(&(instrument.clone(), date))
            .map(|entry| *entry.value())
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Number of records waiting for `save_changes`.
    pub fn staged_len(&self) -> usize {
        self.lock_staged().len()
    }

    /// Committed records ordered by instrument, then date.
    pub fn records(&self) -> Vec<HistoryRecord> {
        let mut records: Vec<_> = self
            .committed
            .iter()
            .map(|entry| HistoryRecord {
                instrument: entry.key().0.clone(),
                date: entry.key().1,
                value: *entry.value(),
            })
            .collect();
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        records
    }

    /// Committed records plus a copy of the staged set, ordered like
    /// [`Self::records`].
    pub(crate) fn records_with_staged(&self) -> (Vec<HistoryRecord>, BTreeMap<RecordKey, Decimal>) {
        let staged = self.lock_staged().clone();
        let mut records = self.records();
        records.extend(staged.iter().map(|((instrument, date), value)| HistoryRecord {
            instrument: instrument.clone(),
            date: *date,
            value: *value,
        }));
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        (records, staged)
    }

    /// Commit only the records in `written`, leaving later stages staged.
    pub(crate) fn commit_written(&self, written: BTreeMap<RecordKey, Decimal>) -> usize {
        let mut staged = self.lock_staged();
        let count = written.len();
        for (key, value) in written {
            staged.remove(&key);
            self.committed.insert(key, value);
        }
        count
    }

    fn lock_staged(&self) -> std::sync::MutexGuard<'_, BTreeMap<RecordKey, Decimal>> {
        self.staged.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn stage(&self, records: Vec<HistoryRecord>) -> usize {
        let mut staged = self.lock_staged();
        let mut inserted = 0;
        for record in records {
            let key = record.key();
            if self.committed.contains_key(&key) || staged.contains_key(&key) {
                continue;
            }
            staged.insert(key, record.value);
            inserted += 1;
        }
        inserted
    }

    pub(crate) fn commit(&self) -> usize {
        let staged = std::mem::take(&mut *self.lock_staged());
        let count = staged.len();
        for (key, value) in staged {
            self.committed.insert(key, value);
        }
        count
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn add_records_if_absent(
        &self,
        records: Vec<HistoryRecord>,
    ) -> Result<usize, RepositoryError> {
        Ok(self.stage(records))
    }

    async fn save_changes(&self) -> Result<(), RepositoryError> {
        let committed = self.commit();
        tracing::debug!(records = committed, "History changes saved");
        Ok(())
    }
}
