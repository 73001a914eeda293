// src/db/review_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::review::Review};

const SELECT_REVIEW: &str = "SELECT r.*, TRIM(u.first_name || ' ' || u.last_name) AS author_name \
     FROM reviews r JOIN users u ON u.id = r.user_id";

#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_product(&self, product_id: Uuid) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{SELECT_REVIEW} WHERE r.product_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{SELECT_REVIEW} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        let review = sqlx::query_as::<_, Review>(&format!("{SELECT_REVIEW} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    pub async fn create(&self, product_id: Uuid, user_id: Uuid, rating: i16, comment: &str) -> Result<Review, AppError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO reviews (product_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::ReviewAlreadyExists;
                }
            }
            e.into()
        })?;
        self.get(id).await
    }

    pub async fn update(&self, id: Uuid, rating: Option<i16>, comment: Option<&str>) -> Result<Review, AppError> {
        sqlx::query(
            r#"
            UPDATE reviews SET
                rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(comment)
        .execute(&self.pool)
        .await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("review".into()));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Review, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("review".into()))
    }
}
