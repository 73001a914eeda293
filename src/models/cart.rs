// src/models/cart.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, models::product::Product};

// --- Item de linha (carrinho, lista de desejos e pedido) ---
// Preço e estoque são "fotografias" do produto no momento da ação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: Uuid,
    pub reference: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: i32,
    #[schema(example = "23.92")]
    pub price: Decimal,
    pub stock: i32,
}

impl LineItem {
    pub fn from_product(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id,
            reference: product.reference.clone(),
            name: product.name.clone(),
            image: product.primary_image(),
            quantity,
            price: product.final_price,
            stock: product.stock,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn refresh_from(&mut self, product: &Product) {
        self.reference = product.reference.clone();
        self.name = product.name.clone();
        self.image = product.primary_image();
        self.price = product.final_price;
        self.stock = product.stock;
    }
}

// --- Documento do carrinho (um por usuário) ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = Vec<LineItem>)]
    pub items: Json<Vec<LineItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resposta da API com os totais já calculados
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub item_count: i32,
    #[schema(example = "47.84")]
    pub subtotal: Decimal,
}

impl CartView {
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self {
            item_count: items.iter().map(|i| i.quantity).sum(),
            subtotal: subtotal(&items),
            items,
        }
    }
}

pub fn subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity_min"))]
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCartItemPayload {
    #[validate(range(min = 0, message = "not_negative"))]
    pub quantity: i32,
}

// Carrinho "convidado" (guardado no navegador) enviado após o login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MergeCartPayload {
    #[validate(nested)]
    pub items: Vec<AddCartItemPayload>,
}

// ---
// Regras do documento
// ---

/// Soma `quantity` ao item do produto (ou cria a linha). O total resultante
/// não pode passar do estoque atual.
pub fn add_line(items: &mut Vec<LineItem>, product: &Product, quantity: i32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::InvalidQuantity);
    }

    let current = items
        .iter()
        .find(|i| i.product_id == product.id)
        .map(|i| i.quantity)
        .unwrap_or(0);
    // Soma que estoura o i32 nunca cabe no estoque
    let wanted = current.checked_add(quantity).ok_or_else(|| AppError::InsufficientStock {
        product: product.name.clone(),
        available: product.stock,
    })?;
    ensure_stock(product, wanted)?;

    match items.iter_mut().find(|i| i.product_id == product.id) {
        Some(line) => {
            line.refresh_from(product);
            line.quantity = wanted;
        }
        None => items.push(LineItem::from_product(product, wanted)),
    }
    Ok(())
}

/// Define a quantidade exata; zero remove a linha.
pub fn set_line_quantity(items: &mut Vec<LineItem>, product: &Product, quantity: i32) -> Result<(), AppError> {
    if quantity < 0 {
        return Err(AppError::InvalidQuantity);
    }
    let Some(pos) = items.iter().position(|i| i.product_id == product.id) else {
        return Err(AppError::ResourceNotFound("cart_item".into()));
    };

    if quantity == 0 {
        items.remove(pos);
        return Ok(());
    }

    ensure_stock(product, quantity)?;
    let line = &mut items[pos];
    line.refresh_from(product);
    line.quantity = quantity;
    Ok(())
}

pub fn remove_line(items: &mut Vec<LineItem>, product_id: Uuid) -> bool {
    let before = items.len();
    items.retain(|i| i.product_id != product_id);
    items.len() != before
}

/// Junta o carrinho convidado ao carrinho salvo. Quantidades somam e são
/// limitadas ao estoque; produtos desconhecidos ou esgotados são ignorados.
/// Retorna quantas linhas do convidado foram aproveitadas.
pub fn merge_lines(
    items: &mut Vec<LineItem>,
    guest: &[AddCartItemPayload],
    products: &HashMap<Uuid, Product>,
) -> usize {
    let mut merged = 0;
    for entry in guest {
        let Some(product) = products.get(&entry.product_id) else { continue };
        if entry.quantity < 1 || product.stock < 1 {
            continue;
        }

        match items.iter_mut().find(|i| i.product_id == product.id) {
            Some(line) => {
                line.refresh_from(product);
                line.quantity = line.quantity.saturating_add(entry.quantity).min(product.stock);
            }
            None => items.push(LineItem::from_product(product, entry.quantity.min(product.stock))),
        }
        merged += 1;
    }
    merged
}

/// Atualiza as fotografias de preço/estoque; remove produtos que sumiram do catálogo.
pub fn refresh_lines(items: &mut Vec<LineItem>, products: &HashMap<Uuid, Product>) {
    items.retain(|i| products.contains_key(&i.product_id));
    for line in items.iter_mut() {
        if let Some(product) = products.get(&line.product_id) {
            line.refresh_from(product);
        }
    }
}

fn ensure_stock(product: &Product, wanted: i32) -> Result<(), AppError> {
    if wanted > product.stock {
        return Err(AppError::InsufficientStock {
            product: product.name.clone(),
            available: product.stock,
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn product(name: &str, price: &str, stock: i32) -> Product {
        let price: Decimal = price.parse().unwrap();
        Product {
            id: Uuid::new_v4(),
            reference: format!("REF-{name}"),
            name: name.to_string(),
            description: String::new(),
            price,
            stock,
            category: "Roupas".into(),
            subcategory: "Camisetas".into(),
            tags: vec![],
            images: vec![format!("https://img.example/{name}.jpg")],
            promotion_id: None,
            active_promotion_id: None,
            promotion_discount: None,
            final_price: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
        .priced()
    }

    #[test]
    fn adding_same_product_twice_merges_quantities() {
        let shirt = product("shirt", "10.00", 5);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 2).unwrap();
        add_line(&mut items, &shirt, 3).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(CartView::from_items(items).subtotal, "50.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn adding_beyond_stock_is_rejected_and_cart_untouched() {
        let shirt = product("shirt", "10.00", 3);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 2).unwrap();

        let err = add_line(&mut items, &shirt, 2).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 3, .. }));
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn huge_quantity_on_existing_line_is_insufficient_stock() {
        let shirt = product("shirt", "10.00", 5);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 1).unwrap();

        let err = add_line(&mut items, &shirt, i32::MAX).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { available: 5, .. }));
        assert_eq!(items[0].quantity, 1);
    }

    #[test]
    fn guest_merge_with_huge_quantity_caps_at_stock() {
        let shirt = product("shirt", "10.00", 5);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 1).unwrap();

        let products: HashMap<_, _> = [(shirt.id, shirt.clone())].into();
        let guest = vec![AddCartItemPayload { product_id: shirt.id, quantity: i32::MAX }];

        assert_eq!(merge_lines(&mut items, &guest, &products), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn zero_or_negative_add_is_invalid() {
        let shirt = product("shirt", "10.00", 3);
        let mut items = Vec::new();
        assert!(matches!(add_line(&mut items, &shirt, 0), Err(AppError::InvalidQuantity)));
        assert!(items.is_empty());
    }

    #[test]
    fn setting_quantity_to_zero_removes_line() {
        let shirt = product("shirt", "10.00", 3);
        let cap = product("cap", "5.00", 3);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 1).unwrap();
        add_line(&mut items, &cap, 1).unwrap();

        set_line_quantity(&mut items, &shirt, 0).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, cap.id);

        assert!(matches!(
            set_line_quantity(&mut items, &shirt, 1),
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn guest_merge_adds_caps_and_skips() {
        let shirt = product("shirt", "10.00", 4);
        let sold_out = product("mug", "8.00", 0);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 3).unwrap();

        let products: HashMap<_, _> = [(shirt.id, shirt.clone()), (sold_out.id, sold_out.clone())].into();
        let guest = vec![
            AddCartItemPayload { product_id: shirt.id, quantity: 3 },
            AddCartItemPayload { product_id: sold_out.id, quantity: 1 },
            AddCartItemPayload { product_id: Uuid::new_v4(), quantity: 1 },
        ];

        let merged = merge_lines(&mut items, &guest, &products);
        assert_eq!(merged, 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 4);
    }

    #[test]
    fn refresh_updates_snapshots_and_drops_deleted_products() {
        let mut shirt = product("shirt", "10.00", 4);
        let cap = product("cap", "5.00", 2);
        let mut items = Vec::new();
        add_line(&mut items, &shirt, 1).unwrap();
        add_line(&mut items, &cap, 1).unwrap();

        shirt.price = "12.00".parse().unwrap();
        shirt.stock = 1;
        let shirt = shirt.priced();
        let products: HashMap<_, _> = [(shirt.id, shirt.clone())].into();

        refresh_lines(&mut items, &products);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, "12.00".parse::<Decimal>().unwrap());
        assert_eq!(items[0].stock, 1);
    }
}
