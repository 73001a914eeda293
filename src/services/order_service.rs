// src/services/order_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CartRepository, NewOrder, OrderRepository, ProductRepository},
    models::{
        auth::User,
        cart::LineItem,
        order::{Order, OrderFilter, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, PlaceOrderPayload, ShippingPolicy},
        product::{Page, PageRequest},
    },
    services::payment_service::{to_minor_units, verify_intent, PaymentGateway, PaymentIntentResponse},
};

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    cart_repo: CartRepository,
    product_repo: ProductRepository,
    payment_gateway: Arc<dyn PaymentGateway>,
    shipping: ShippingPolicy,
    currency: String,
    pool: PgPool,
}

/// Confere estoque e refaz o preço de cada linha com o produto travado.
/// Produtos apagados contam como estoque zero.
pub fn reprice_lines(
    items: &[LineItem],
    locked: &HashMap<Uuid, crate::models::product::Product>,
) -> Result<Vec<LineItem>, AppError> {
    items
        .iter()
        .map(|line| match locked.get(&line.product_id) {
            Some(product) if product.stock >= line.quantity => Ok(LineItem::from_product(product, line.quantity)),
            Some(product) => Err(AppError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
            }),
            None => Err(AppError::InsufficientStock { product: line.name.clone(), available: 0 }),
        })
        .collect()
}

fn ensure_can_view(user: &User, order: &Order) -> Result<(), AppError> {
    if order.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl OrderService {
    pub fn new(
        order_repo: OrderRepository,
        cart_repo: CartRepository,
        product_repo: ProductRepository,
        payment_gateway: Arc<dyn PaymentGateway>,
        shipping: ShippingPolicy,
        currency: String,
        pool: PgPool,
    ) -> Self {
        Self { order_repo, cart_repo, product_repo, payment_gateway, shipping, currency, pool }
    }

    // ---
    // Pagamento
    // ---

    /// Cria a intenção de pagamento com o total do carrinho calculado no servidor.
    pub async fn create_payment_intent(&self, user_id: Uuid) -> Result<PaymentIntentResponse, AppError> {
        let cart = self.cart_repo.get(user_id).await?;
        let items = cart.items.0;
        if items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        // Preços atuais, não as fotografias do carrinho
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<_, _> = self
            .product_repo
            .find_many(self.product_repo.pool(), &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let lines = reprice_lines(&items, &products)?;
        let totals = OrderTotals::compute(&lines, &self.shipping);

        let amount = to_minor_units(totals.total)?;
        let intent = self.payment_gateway.create_intent(amount, &self.currency, user_id).await?;
        let client_secret = intent
            .client_secret
            .ok_or_else(|| AppError::PaymentProviderError("intenção sem client_secret".into()))?;

        Ok(PaymentIntentResponse {
            payment_intent_id: intent.id,
            client_secret,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    // ---
    // Checkout
    // ---

    pub async fn place_order(&self, user_id: Uuid, payload: &PlaceOrderPayload) -> Result<Order, AppError> {
        let intent_id = match payload.payment_method {
            PaymentMethod::Card => {
                let Some(intent_id) = payload.payment_intent_id.as_deref().filter(|id| !id.is_empty()) else {
                    let mut errors = validator::ValidationErrors::new();
                    let mut err = validator::ValidationError::new("required");
                    err.message = Some("required".into());
                    errors.add("paymentIntentId", err);
                    return Err(AppError::ValidationError(errors));
                };
                if self.order_repo.intent_exists(intent_id).await? {
                    return Err(AppError::PaymentAlreadyUsed);
                }
                Some(intent_id)
            }
            PaymentMethod::CashOnDelivery => None,
        };

        let mut tx = self.pool.begin().await?;

        let cart = self.cart_repo.get_or_create(&mut *tx, user_id).await?;
        let items = cart.items.0;
        if items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let locked: HashMap<_, _> = self
            .product_repo
            .find_for_update(&mut *tx, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let lines = reprice_lines(&items, &locked)?;
        let totals = OrderTotals::compute(&lines, &self.shipping);

        // Nada é gravado se o pagamento não conferir (o rollback acontece no drop do tx)
        let (payment_status, paid_at) = match intent_id {
            Some(intent_id) => {
                let intent = self.payment_gateway.retrieve_intent(intent_id).await?;
                verify_intent(&intent, user_id, to_minor_units(totals.total)?, &self.currency)?;
                (PaymentStatus::Paid, Some(Utc::now()))
            }
            None => (PaymentStatus::Pending, None),
        };

        for line in &lines {
            self.product_repo.decrement_stock(&mut *tx, line).await?;
        }

        let order = self
            .order_repo
            .insert(
                &mut *tx,
                NewOrder {
                    user_id,
                    items: &lines,
                    shipping: &payload.shipping,
                    payment_method: payload.payment_method,
                    payment_status,
                    payment_intent_id: intent_id,
                    paid_at,
                    totals,
                },
            )
            .await?;

        self.cart_repo.save_items(&mut *tx, user_id, &[]).await?;
        tx.commit().await?;

        tracing::info!("🧾 Pedido #{} criado ({} itens, total {})", order.display_id, lines.len(), order.total);
        Ok(order)
    }

    // ---
    // Acompanhamento
    // ---

    pub async fn list_mine(&self, user_id: Uuid, page: PageRequest) -> Result<Page<Order>, AppError> {
        let (orders, total) = self.order_repo.list(Some(user_id), None, page.limit, page.offset()).await?;
        Ok(Page::new(orders, total, page))
    }

    pub async fn list_all(&self, filter: &OrderFilter) -> Result<Page<Order>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let (orders, total) = self.order_repo.list(None, filter.status, page.limit, page.offset()).await?;
        Ok(Page::new(orders, total, page))
    }

    pub async fn get_for(&self, user: &User, order_id: Uuid) -> Result<Order, AppError> {
        let order = self
            .order_repo
            .find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("order".into()))?;
        ensure_can_view(user, &order)?;
        Ok(order)
    }

    /// Cancelamento pelo dono (ou admin) enquanto o pedido está PENDING.
    pub async fn cancel(&self, user: &User, order_id: Uuid) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;
        let order = self.lock(&mut tx, order_id).await?;
        ensure_can_view(user, &order)?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::OrderNotCancellable);
        }

        if order.status.restores_stock_on_transition(OrderStatus::Cancelled) {
            self.restore_stock(&mut tx, &order).await?;
        }
        let updated = self.order_repo.update_status(&mut *tx, order_id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        tracing::info!("🚫 Pedido #{} cancelado por {}", updated.display_id, user.id);
        Ok(updated)
    }

    // ---
    // Back-office
    // ---

    pub async fn update_status(&self, order_id: Uuid, next: OrderStatus) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;
        let order = self.lock(&mut tx, order_id).await?;

        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidStatusTransition {
                from: order.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        if order.status.restores_stock_on_transition(next) {
            self.restore_stock(&mut tx, &order).await?;
        }

        let updated = self.order_repo.update_status(&mut *tx, order_id, next).await?;
        tx.commit().await?;

        tracing::info!("📦 Pedido #{}: {} -> {}", updated.display_id, order.status.as_str(), next.as_str());
        Ok(updated)
    }

    pub async fn mark_paid(&self, order_id: Uuid) -> Result<Order, AppError> {
        self.order_repo.mark_paid(order_id).await
    }

    /// Apagar um pedido PENDING devolve o estoque; os demais, não.
    pub async fn delete(&self, order_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let order = self.lock(&mut tx, order_id).await?;

        if order.status.restores_stock_on_delete() {
            self.restore_stock(&mut tx, &order).await?;
        }
        self.order_repo.delete(&mut *tx, order_id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Pedido #{} removido", order.display_id);
        Ok(())
    }

    async fn lock(&self, tx: &mut Transaction<'static, Postgres>, order_id: Uuid) -> Result<Order, AppError> {
        self.order_repo
            .find_for_update(&mut **tx, order_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("order".into()))
    }

    async fn restore_stock(&self, tx: &mut Transaction<'static, Postgres>, order: &Order) -> Result<(), AppError> {
        for line in order.items.iter() {
            self.product_repo.restore_stock(&mut **tx, line.product_id, line.quantity).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{tests::test_config, AppState},
        models::{cart::tests::product, order::ShippingInfo},
    };
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn repricing_uses_current_final_price() {
        let mut shirt = product("shirt", "10.00", 5);
        let stale = LineItem::from_product(&shirt, 2);

        shirt.promotion_discount = Some("50".parse().unwrap());
        let shirt = shirt.priced();
        let locked: HashMap<_, _> = [(shirt.id, shirt.clone())].into();

        let lines = reprice_lines(&[stale], &locked).unwrap();
        assert_eq!(lines[0].price, "5.00".parse::<rust_decimal::Decimal>().unwrap());
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn repricing_fails_on_short_stock_naming_the_product() {
        let mug = product("mug", "8.00", 1);
        let line = LineItem::from_product(&mug, 3);
        let locked: HashMap<_, _> = [(mug.id, mug.clone())].into();

        let err = reprice_lines(&[line], &locked).unwrap_err();
        match err {
            AppError::InsufficientStock { product, available } => {
                assert_eq!(product, "mug");
                assert_eq!(available, 1);
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn deleted_product_counts_as_out_of_stock() {
        let gone = product("gone", "8.00", 4);
        let line = LineItem::from_product(&gone, 1);
        let err = reprice_lines(&[line], &HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 0, .. }));
    }

    // ---
    // Fluxo completo contra um Postgres de verdade (cargo test -- --ignored)
    // ---

    async fn live_state() -> AppState {
        let config = test_config();
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url.clone());
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("Postgres indisponível");
        sqlx::migrate!().run(&pool).await.expect("falha nas migrações");
        AppState::from_pool(pool, config).unwrap()
    }

    async fn buyer(state: &AppState) -> User {
        let email = format!("{}@example.com", Uuid::new_v4());
        let (_, user) = state.auth_service.register_user(&email, "secret123", "Ana", "Silva").await.unwrap();
        user
    }

    async fn seed_product(pool: &PgPool, stock: i32) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO products (reference, name, price, stock, category, subcategory) \
             VALUES ($1, 'Caneca', 10.00, $2, 'Casa', 'Cozinha') RETURNING id",
        )
        .bind(format!("REF-{}", Uuid::new_v4()))
        .bind(stock)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn stock_of(pool: &PgPool, id: Uuid) -> i32 {
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn cash_on_delivery() -> PlaceOrderPayload {
        PlaceOrderPayload {
            shipping: ShippingInfo {
                full_name: "Ana Silva".into(),
                address: "Rua das Flores, 10".into(),
                city: "Lisboa".into(),
                postal_code: "1000-001".into(),
                country: "PT".into(),
                phone: "+351 900 000 000".into(),
            },
            payment_method: PaymentMethod::CashOnDelivery,
            payment_intent_id: None,
        }
    }

    async fn checkout(state: &AppState, user: &User, product_id: Uuid, quantity: i32) -> Order {
        state.cart_service.add_item(user.id, product_id, quantity).await.unwrap();
        state.order_service.place_order(user.id, &cash_on_delivery()).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn checkout_decrements_stock_and_clears_cart() {
        let state = live_state().await;
        let user = buyer(&state).await;
        let mug = seed_product(&state.db_pool, 5).await;

        let order = checkout(&state, &user, mug, 2).await;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(stock_of(&state.db_pool, mug).await, 3);
        assert!(state.cart_service.get_cart(user.id).await.unwrap().items.is_empty());

        let err = state.order_service.place_order(user.id, &cash_on_delivery()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCart));
    }

    #[tokio::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn cancelling_returns_stock() {
        let state = live_state().await;
        let user = buyer(&state).await;
        let mug = seed_product(&state.db_pool, 5).await;

        let first = checkout(&state, &user, mug, 2).await;
        let cancelled = state.order_service.cancel(&user, first.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&state.db_pool, mug).await, 5);

        let err = state.order_service.cancel(&user, first.id).await.unwrap_err();
        assert!(matches!(err, AppError::OrderNotCancellable));
        assert_eq!(stock_of(&state.db_pool, mug).await, 5);

        // Cancelamento pelo back-office depois de PROCESSING
        let second = checkout(&state, &user, mug, 1).await;
        assert_eq!(stock_of(&state.db_pool, mug).await, 4);
        state.order_service.update_status(second.id, OrderStatus::Processing).await.unwrap();
        assert_eq!(stock_of(&state.db_pool, mug).await, 4);
        state.order_service.update_status(second.id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(stock_of(&state.db_pool, mug).await, 5);
    }

    #[tokio::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn deleting_returns_stock_only_for_pending_orders() {
        let state = live_state().await;
        let user = buyer(&state).await;
        let mug = seed_product(&state.db_pool, 5).await;

        let pending = checkout(&state, &user, mug, 2).await;
        state.order_service.delete(pending.id).await.unwrap();
        assert_eq!(stock_of(&state.db_pool, mug).await, 5);

        let processing = checkout(&state, &user, mug, 2).await;
        state.order_service.update_status(processing.id, OrderStatus::Processing).await.unwrap();
        state.order_service.delete(processing.id).await.unwrap();
        assert_eq!(stock_of(&state.db_pool, mug).await, 3);
    }

    #[tokio::test]
    #[ignore = "requer Postgres (DATABASE_URL)"]
    async fn decrement_beyond_stock_changes_nothing() {
        let state = live_state().await;
        let mug_id = seed_product(&state.db_pool, 2).await;
        let mug = state.catalog_service.get_product(mug_id).await.unwrap();
        let repo = ProductRepository::new(state.db_pool.clone());

        let err = repo
            .decrement_stock(&state.db_pool, &LineItem::from_product(&mug, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 2, .. }));
        assert_eq!(stock_of(&state.db_pool, mug_id).await, 2);
    }
}
