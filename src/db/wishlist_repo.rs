// src/db/wishlist_repo.rs

use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{cart::LineItem, wishlist::Wishlist},
};

#[derive(Clone)]
pub struct WishlistRepository {
    pool: PgPool,
}

impl WishlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_or_create(&self, user_id: Uuid) -> Result<Wishlist, AppError> {
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r#"
            INSERT INTO wishlists (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(wishlist)
    }

    pub async fn save_items(&self, user_id: Uuid, items: &[LineItem]) -> Result<Wishlist, AppError> {
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r#"
            INSERT INTO wishlists (user_id, items) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Json(items))
        .fetch_one(&self.pool)
        .await?;
        Ok(wishlist)
    }
}
