//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::{AppError, map_sqlx_write_error};

#[derive(FromRow)]
struct LinkRow {
    id: i64,
    short_code: String,
    long_url: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for Link {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id).map_err(|_| {
            AppError::internal("Negative link id in store", json!({ "id": row.id }))
        })?;
        Ok(Link::new(id, row.short_code, row.long_url, row.created_at))
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// IDs are stored as `BIGINT`; an ID above `i64::MAX` is rejected on insert.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let id = i64::try_from(new_link.id).map_err(|_| {
            AppError::store_write("Link id out of range", json!({ "id": new_link.id }))
        })?;

        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO links (id, short_code, long_url)
            VALUES ($1, $2, $3)
            RETURNING id, short_code, long_url, created_at
            "#,
        )
        .bind(id)
        .bind(&new_link.code)
        .bind(&new_link.long_url)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_write_error)?;

        row.try_into()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, short_code, long_url, created_at
            FROM links
            WHERE short_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Link::try_from).transpose()
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
