//! Record store contract and the in-memory reference implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{error::Result, record::WeatherRecord};

/// Append/query contract for cached observations, keyed by
/// [`crate::model::Location::cache_key`].
///
/// Implementations keep each key's records ordered by `fetched_at`, newest
/// first. Records are never overwritten, only superseded.
pub trait WeatherRecordStore: Send + Sync + std::fmt::Debug {
    /// Persist a record, assigning an identity if it has none.
    fn save(&self, record: WeatherRecord) -> Result<WeatherRecord>;

    fn find_most_recent_by_key(&self, key: &str) -> Result<Option<WeatherRecord>>;

    /// Records with `start <= fetched_at <= end`, newest first.
    fn find_by_key_and_fetched_between(
        &self,
        key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WeatherRecord>>;

    fn find_recent_by_key(&self, key: &str, limit: usize) -> Result<Vec<WeatherRecord>>;

    fn clear(&self) -> Result<()>;

    fn clear_for_key(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryWeatherStore {
    records: RwLock<HashMap<String, Vec<WeatherRecord>>>,
}

impl InMemoryWeatherStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WeatherRecordStore for InMemoryWeatherStore {
    fn save(&self, record: WeatherRecord) -> Result<WeatherRecord> {
        let record = match record.id() {
            Some(_) => record,
            None => record.with_id(Uuid::new_v4()),
        };
        let key = record.location().cache_key();

        let mut records = self.records.write();
        let bucket = records.entry(key).or_default();
        // First position whose record is strictly older; equal timestamps keep
        // insertion order so the latest save wins ties.
        let at = bucket.partition_point(|existing| existing.fetched_at() >= record.fetched_at());
        bucket.insert(at, record.clone());

        tracing::debug!(key = %record.location().cache_key(), total = bucket.len(), "stored weather record");
        Ok(record)
    }

    fn find_most_recent_by_key(&self, key: &str) -> Result<Option<WeatherRecord>> {
        Ok(self.records.read().get(key).and_then(|bucket| bucket.first().cloned()))
    }

    fn find_by_key_and_fetched_between(
        &self,
        key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<WeatherRecord>> {
        let records = self.records.read();
        let Some(bucket) = records.get(key) else {
            return Ok(Vec::new());
        };
        Ok(bucket
            .iter()
            .filter(|r| r.fetched_at() >= start && r.fetched_at() <= end)
            .cloned()
            .collect())
    }

    fn find_recent_by_key(&self, key: &str, limit: usize) -> Result<Vec<WeatherRecord>> {
        let records = self.records.read();
        Ok(records
            .get(key)
            .map(|bucket| bucket.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn clear(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }

    fn clear_for_key(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }
}
