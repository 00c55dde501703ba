use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use super::{RecordStore, UpsertOutcome};
use crate::db::models::DailyWeatherRecord;

#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UpsertedRow {
    #[sqlx(flatten)]
    record: DailyWeatherRecord,
    inserted: bool,
}

#[async_trait]
impl RecordStore for PgRecordStore {
    /// Single statement guarded by the primary key on `date`, so concurrent
    /// writers for the same day cannot produce duplicates. `xmax = 0` holds
    /// only for a freshly inserted tuple.
    async fn upsert(&self, record: &DailyWeatherRecord) -> Result<UpsertOutcome> {
        let row = sqlx::query_as::<_, UpsertedRow>(
            r#"
            INSERT INTO daily_weather_records
                (date, is_good_day, temperature, wind_speed, sunniness, rain)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (date) DO UPDATE
               SET is_good_day = EXCLUDED.is_good_day,
                   temperature = EXCLUDED.temperature,
                   wind_speed  = EXCLUDED.wind_speed,
                   sunniness   = EXCLUDED.sunniness,
                   rain        = EXCLUDED.rain,
                   updated_at  = now()
            RETURNING date, is_good_day, temperature, wind_speed, sunniness, rain,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(record.date)
        .bind(record.is_good_day)
        .bind(record.temperature)
        .bind(record.wind_speed)
        .bind(record.sunniness)
        .bind(record.rain)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to upsert daily record for {}", record.date))?;

        Ok(UpsertOutcome {
            record: row.record,
            inserted: row.inserted,
        })
    }

    async fn find(&self, date: NaiveDate) -> Result<Option<DailyWeatherRecord>> {
        sqlx::query_as::<_, DailyWeatherRecord>(
            r#"
            SELECT date, is_good_day, temperature, wind_speed, sunniness, rain
            FROM daily_weather_records
            WHERE date = $1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to look up daily record for {date}"))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<DailyWeatherRecord>> {
        sqlx::query_as::<_, DailyWeatherRecord>(
            r#"
            SELECT date, is_good_day, temperature, wind_speed, sunniness, rain
            FROM daily_weather_records
            ORDER BY date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("failed to list daily records")
    }
}
