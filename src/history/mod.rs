//! Log of past daily verdicts, one record per calendar date.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::db::models::DailyWeatherRecord;

pub use postgres::PgRecordStore;

/// Result of [`RecordStore::upsert`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    /// The row as stored after the write.
    pub record: DailyWeatherRecord,
    /// `true` if no row existed for the date, `false` if one was updated.
    pub inserted: bool,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert the record, or update every field of the existing row for
    /// `record.date`.
    async fn upsert(&self, record: &DailyWeatherRecord) -> Result<UpsertOutcome>;

    /// The record for `date`. A missing row is `Ok(None)`, not an error.
    async fn find(&self, date: NaiveDate) -> Result<Option<DailyWeatherRecord>>;

    /// Up to `limit` records, newest date first.
    async fn recent(&self, limit: i64) -> Result<Vec<DailyWeatherRecord>>;
}
