//! PostgreSQL implementation of the click counter repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::ClickCounter;
use crate::domain::repositories::ClickCounterRepository;
use crate::error::{AppError, map_sqlx_write_error};

#[derive(FromRow)]
struct ClickCounterRow {
    short_code: String,
    click_count: i64,
    last_clicked_at: DateTime<Utc>,
}

impl From<ClickCounterRow> for ClickCounter {
    fn from(row: ClickCounterRow) -> Self {
        ClickCounter::new(row.short_code, row.click_count, row.last_clicked_at)
    }
}

/// PostgreSQL repository for per-code click counters.
///
/// A click is one atomic upsert: concurrent workers never lose increments.
/// `last_clicked_at` is overwritten unconditionally, so the last event
/// applied wins.
pub struct PgClickCounterRepository {
    pool: Arc<PgPool>,
}

impl PgClickCounterRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickCounterRepository for PgClickCounterRepository {
    async fn record_click(&self, code: &str, clicked_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO click_counters (short_code, click_count, last_clicked_at)
            VALUES ($1, 1, $2)
            ON CONFLICT (short_code) DO UPDATE
            SET click_count = click_counters.click_count + 1,
                last_clicked_at = EXCLUDED.last_clicked_at
            "#,
        )
        .bind(code)
        .bind(clicked_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_write_error)?;

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ClickCounter>, AppError> {
        let row = sqlx::query_as::<_, ClickCounterRow>(
            r#"
            SELECT short_code, click_count, last_clicked_at
            FROM click_counters
            WHERE short_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ClickCounter::from))
    }
}
