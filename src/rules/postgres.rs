use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::RulesStore;
use crate::{db::models::StoredRules, evaluation::ThresholdRules};

/// Rules kept in the one-row `threshold_rules` table.
#[derive(Debug, Clone)]
pub struct PgRulesStore {
    pool: PgPool,
}

impl PgRulesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RulesStore for PgRulesStore {
    async fn fetch(&self) -> Result<Option<ThresholdRules>> {
        let row = sqlx::query_as::<_, StoredRules>(
            r#"
            SELECT min_temp, max_wind, min_sunniness, max_rain
            FROM threshold_rules
            WHERE id
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("failed to read threshold rules")?;

        Ok(row.map(Into::into))
    }

    async fn save(&self, rules: &ThresholdRules) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO threshold_rules (id, min_temp, max_wind, min_sunniness, max_rain)
            VALUES (TRUE, $1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
               SET min_temp      = EXCLUDED.min_temp,
                   max_wind      = EXCLUDED.max_wind,
                   min_sunniness = EXCLUDED.min_sunniness,
                   max_rain      = EXCLUDED.max_rain,
                   updated_at    = now()
            "#,
        )
        .bind(rules.min_temp)
        .bind(rules.max_wind)
        .bind(rules.min_sunniness)
        .bind(rules.max_rain)
        .execute(&self.pool)
        .await
        .context("failed to save threshold rules")?;

        Ok(())
    }
}
