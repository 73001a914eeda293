// src/db/promotion_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::promotion::{CreatePromotionPayload, Promotion, UpdatePromotionPayload},
};

#[derive(Clone)]
pub struct PromotionRepository {
    pool: PgPool,
}

fn map_unique(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::NameAlreadyExists(name.to_string());
        }
    }
    e.into()
}

impl PromotionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Promotion>, AppError> {
        let promotions = sqlx::query_as::<_, Promotion>("SELECT * FROM promotions ORDER BY starts_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(promotions)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Promotion>, AppError> {
        let promotion = sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promotion)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreatePromotionPayload,
        is_active: bool,
    ) -> Result<Promotion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Promotion>(
            r#"
            INSERT INTO promotions (name, description, discount_percent, starts_at, ends_at, image_url, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.discount_percent)
        .bind(payload.starts_at)
        .bind(payload.ends_at)
        .bind(payload.image_url.as_deref())
        .bind(is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique(e, &payload.name))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdatePromotionPayload,
    ) -> Result<Promotion, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let name = payload.name.clone().unwrap_or_default();
        let promotion = sqlx::query_as::<_, Promotion>(
            r#"
            UPDATE promotions SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                discount_percent = COALESCE($4, discount_percent),
                starts_at = COALESCE($5, starts_at),
                ends_at = COALESCE($6, ends_at),
                image_url = COALESCE($7, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.discount_percent)
        .bind(payload.starts_at)
        .bind(payload.ends_at)
        .bind(payload.image_url.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique(e, &name))?;
        promotion.ok_or_else(|| AppError::ResourceNotFound("promotion".into()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("promotion".into()));
        }
        Ok(())
    }

    /// Recalcula a flag `is_active` de todas as promoções (janela semiaberta).
    pub async fn refresh_flags<'e, E>(&self, executor: E, now: DateTime<Utc>) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE promotions SET is_active = (starts_at <= $1 AND $1 < ends_at), updated_at = NOW()
            WHERE is_active IS DISTINCT FROM (starts_at <= $1 AND $1 < ends_at)
            "#,
        )
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
