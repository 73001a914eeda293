// src/db/tag_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::tag::ProductTag};

#[derive(Clone)]
pub struct TagRepository {
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

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<ProductTag>, AppError> {
        let tags = sqlx::query_as::<_, ProductTag>("SELECT * FROM product_tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProductTag>, AppError> {
        let tag = sqlx::query_as::<_, ProductTag>("SELECT * FROM product_tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    /// Devolve, dentre `names`, os que não estão cadastrados.
    pub async fn missing(&self, names: &[String]) -> Result<Vec<String>, AppError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let missing = sqlx::query_scalar(
            r#"
            SELECT n FROM unnest($1::text[]) AS n
            WHERE NOT EXISTS (SELECT 1 FROM product_tags t WHERE t.name = n)
            "#,
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;
        Ok(missing)
    }

    pub async fn create(&self, name: &str) -> Result<ProductTag, AppError> {
        sqlx::query_as::<_, ProductTag>("INSERT INTO product_tags (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, name))
    }

    pub async fn rename<'e, E>(&self, executor: E, id: Uuid, name: &str) -> Result<ProductTag, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tag = sqlx::query_as::<_, ProductTag>("UPDATE product_tags SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_unique(e, name))?;
        tag.ok_or_else(|| AppError::ResourceNotFound("tag".into()))
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM product_tags WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("tag".into()));
        }
        Ok(())
    }
}
