// src/models/wishlist.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{cart::LineItem, product::Product};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Wishlist {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddWishlistItemPayload {
    pub product_id: Uuid,
}

/// Idempotente: um produto aparece no máximo uma vez (quantidade sempre 1).
/// Retorna `false` quando o produto já estava na lista.
pub fn add_wish(items: &mut Vec<LineItem>, product: &Product) -> bool {
    match items.iter_mut().find(|i| i.product_id == product.id) {
        Some(line) => {
            *line = LineItem::from_product(product, 1);
            false
        }
        None => {
            items.push(LineItem::from_product(product, 1));
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cart::tests::product;

    #[test]
    fn wishing_twice_keeps_one_line() {
        let shirt = product("shirt", "10.00", 2);
        let mut items = Vec::new();
        assert!(add_wish(&mut items, &shirt));
        assert!(!add_wish(&mut items, &shirt));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 1);
    }
}
