// src/db/category_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::category::{Category, SubcategoryGroup},
};

#[derive(Clone)]
pub struct CategoryRepository {
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

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    pub async fn create(&self, name: &str, groups: &[SubcategoryGroup]) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, subcategories) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(Json(groups))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, name))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        groups: &[SubcategoryGroup],
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET name = $2, subcategories = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(Json(groups))
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique(e, name))?;
        category.ok_or_else(|| AppError::ResourceNotFound("category".into()))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("category".into()));
        }
        Ok(())
    }
}
