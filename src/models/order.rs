// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::cart::{subtotal, LineItem};

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// PENDING -> PROCESSING | CANCELLED
    /// PROCESSING -> SHIPPED | CANCELLED
    /// SHIPPED -> DELIVERED
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }

    /// Toda entrada válida em CANCELLED devolve o estoque baixado no checkout.
    pub fn restores_stock_on_transition(self, next: OrderStatus) -> bool {
        next == OrderStatus::Cancelled && self.can_transition_to(next)
    }

    // Só pedidos PENDING devolvem estoque ao serem apagados
    pub fn restores_stock_on_delete(self) -> bool {
        self == OrderStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    CashOnDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

// Endereço de entrega gravado junto do pedido
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub address: String,
    #[validate(length(min = 1, message = "required"))]
    pub city: String,
    #[validate(length(min = 1, message = "required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "required"))]
    pub country: String,
    #[validate(length(min = 1, message = "required"))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = 1024)]
    pub display_id: i32,
    pub user_id: Uuid,
    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,
    #[schema(value_type = ShippingInfo)]
    pub shipping: Json<ShippingInfo>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Totais
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub flat_rate: Decimal,
    pub free_threshold: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn compute(items: &[LineItem], policy: &ShippingPolicy) -> Self {
        let subtotal = subtotal(items);
        let shipping_cost = if items.is_empty() || subtotal >= policy.free_threshold {
            Decimal::ZERO
        } else {
            policy.flat_rate
        };
        Self {
            subtotal,
            shipping_cost,
            total: subtotal + shipping_cost,
        }
    }
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
    #[validate(nested)]
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusPayload {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    #[param(inline)]
    pub status: Option<OrderStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::tests::product;

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            flat_rate: "4.99".parse().unwrap(),
            free_threshold: "50.00".parse().unwrap(),
        }
    }

    #[test]
    fn status_machine_allows_forward_path_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));

        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn cancelling_restores_stock_from_pending_and_processing() {
        use OrderStatus::*;
        assert!(Pending.restores_stock_on_transition(Cancelled));
        assert!(Processing.restores_stock_on_transition(Cancelled));

        assert!(!Pending.restores_stock_on_transition(Processing));
        assert!(!Processing.restores_stock_on_transition(Shipped));
        assert!(!Shipped.restores_stock_on_transition(Cancelled));
        assert!(!Cancelled.restores_stock_on_transition(Cancelled));
    }

    #[test]
    fn only_pending_orders_restore_stock_when_deleted() {
        use OrderStatus::*;
        assert!(Pending.restores_stock_on_delete());
        for status in [Processing, Shipped, Delivered, Cancelled] {
            assert!(!status.restores_stock_on_delete(), "{status:?}");
        }
    }

    #[test]
    fn flat_shipping_below_threshold() {
        let items = vec![LineItem::from_product(&product("shirt", "10.00", 5), 2)];
        let totals = OrderTotals::compute(&items, &policy());
        assert_eq!(totals.subtotal, "20.00".parse::<Decimal>().unwrap());
        assert_eq!(totals.shipping_cost, "4.99".parse::<Decimal>().unwrap());
        assert_eq!(totals.total, "24.99".parse::<Decimal>().unwrap());
    }

    #[test]
    fn free_shipping_at_threshold() {
        let items = vec![LineItem::from_product(&product("coat", "25.00", 5), 2)];
        let totals = OrderTotals::compute(&items, &policy());
        assert_eq!(totals.shipping_cost, Decimal::ZERO);
        assert_eq!(totals.total, "50.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Cancelled).unwrap(), "\"CANCELLED\"");
        let method: PaymentMethod = serde_json::from_str("\"CASH_ON_DELIVERY\"").unwrap();
        assert_eq!(method, PaymentMethod::CashOnDelivery);
    }
}
