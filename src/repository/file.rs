use super::{HistoryRepository, InMemoryHistoryRepository, RepositoryError};
use crate::model::HistoryRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// History store persisted as a JSON array of records.
///
/// The file is read once on open and rewritten on every `save_changes`.
#[derive(Debug)]
pub struct JsonFileHistoryRepository {
    path: PathBuf,
    inner: InMemoryHistoryRepository,
}

impl JsonFileHistoryRepository {
    /// Open the store at `path`; a missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        let records: Vec<HistoryRecord> = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), records = records.len(), "History store opened");

        Ok(Self {
            path,
            inner: InMemoryHistoryRepository::with_records(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Committed records ordered by instrument, then date.
    pub fn records(&self) -> Vec<HistoryRecord> {
        self.inner.records()
    }
}

#[async_trait]
impl HistoryRepository for JsonFileHistoryRepository {
    async fn add_records_if_absent(
        &self,
        records: Vec<HistoryRecord>,
    ) -> Result<usize, RepositoryError> {
        Ok(self.inner.stage(records))
    }

    async fn save_changes(&self) -> Result<(), RepositoryError> {
        let (records, written) = self.inner.records_with_staged();
        let json = serde_json::to_string_pretty(&records)?;

        // Replace the store atomically via a temp file; staged records stay
        // staged until the rename lands
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        let committed = self.inner.commit_written(written);

        tracing::debug!(
            path = %self.path.display(),
            records = committed,
            "History store written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InstrumentId;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn record(day: u32, cents: i64) -> HistoryRecord {
        HistoryRecord {
            instrument: InstrumentId::new("325406").unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            value: Decimal::new(cents, 2),
        }
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileHistoryRepository::open(dir.path().join("history.json"))
            .await
            .unwrap();
        assert!(repo.records().is_empty());
    }

    #[tokio::test]
    async fn test_saved_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let repo = JsonFileHistoryRepository::open(&path).await.unwrap();
        repo.add_records_if_absent(vec![record(17, 45783), record(18, 46012)])
            .await
            .unwrap();
        repo.save_changes().await.unwrap();

        let reopened = JsonFileHistoryRepository::open(&path).await.unwrap();
        assert_eq!(reopened.records(), vec![record(17, 45783), record(18, 46012)]);

        let again = reopened
            .add_records_if_absent(vec![record(17, 1)])
            .await
            .unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_unsaved_records_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let repo = JsonFileHistoryRepository::open(&path).await.unwrap();
        repo.add_records_if_absent(vec![record(17, 45783)])
            .await
            .unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_records_staged() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store");
        let path = store_dir.join("history.json");

        let repo = JsonFileHistoryRepository::open(&path).await.unwrap();
        let inserted = repo
            .add_records_if_absent(vec![record(17, 45783)])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let err = repo.save_changes().await.unwrap_err();
        assert!(matches!(err, RepositoryError::Io(_)));
        assert!(repo.records().is_empty());
        assert_eq!(repo.inner.staged_len(), 1);

        std::fs::create_dir(&store_dir).unwrap();
        repo.save_changes().await.unwrap();

        let reopened = JsonFileHistoryRepository::open(&path).await.unwrap();
        assert_eq!(reopened.records(), vec![record(17, 45783)]);
        assert_eq!(repo.inner.staged_len(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not a list").unwrap();

        let err = JsonFileHistoryRepository::open(&path).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Serialization(_)));
    }
}
