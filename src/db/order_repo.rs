// src/db/order_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        cart::LineItem,
        order::{Order, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, ShippingInfo},
    },
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

// Dados já validados para gravar um pedido novo
pub struct NewOrder<'a> {
    pub user_id: Uuid,
    pub items: &'a [LineItem],
    pub shipping: &'a ShippingInfo,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<&'a str>,
    pub paid_at: Option<DateTime<Utc>>,
    pub totals: OrderTotals,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, order: NewOrder<'_>) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                user_id, items, shipping, payment_method, payment_status, payment_intent_id, paid_at,
                subtotal, shipping_cost, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(order.user_id)
        .bind(Json(order.items))
        .bind(Json(order.shipping))
        .bind(order.payment_method)
        .bind(order.payment_status)
        .bind(order.payment_intent_id)
        .bind(order.paid_at)
        .bind(order.totals.subtotal)
        .bind(order.totals.shipping_cost)
        .bind(order.totals.total)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() && db_err.constraint() == Some("orders_payment_intent_id_key") {
                    return AppError::PaymentAlreadyUsed;
                }
            }
            e.into()
        })
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn intent_exists(&self, payment_intent_id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE payment_intent_id = $1)")
            .bind(payment_intent_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Lista com filtro opcional por usuário e status, mais recentes primeiro.
    pub async fn list(
        &self,
        user_id: Option<Uuid>,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, i64), AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((orders, total))
    }

    pub async fn update_status<'e, E>(&self, executor: E, id: Uuid, status: OrderStatus) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET
                status = $2,
                delivered_at = CASE WHEN $2 = 'DELIVERED'::order_status THEN NOW() ELSE delivered_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn mark_paid(&self, id: Uuid) -> Result<Order, AppError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET
                payment_status = 'PAID',
                paid_at = COALESCE(paid_at, NOW()),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        order.ok_or_else(|| AppError::ResourceNotFound("order".into()))
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
