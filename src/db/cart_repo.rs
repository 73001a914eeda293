// src/db/cart_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::cart::{Cart, LineItem},
};

// O carrinho é um documento por usuário: lido inteiro, alterado em Rust e gravado inteiro
#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn get_or_create<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Cart, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O "DO UPDATE" sem efeito garante que o RETURNING devolve a linha existente
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(cart)
    }

    pub async fn save_items<'e, E>(&self, executor: E, user_id: Uuid, items: &[LineItem]) -> Result<Cart, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id, items) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(Json(items))
        .fetch_one(executor)
        .await?;
        Ok(cart)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Cart, AppError> {
        self.get_or_create(&self.pool, user_id).await
    }
}
