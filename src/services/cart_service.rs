// src/services/cart_service.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CartRepository, ProductRepository},
    models::{
        cart::{add_line, merge_lines, refresh_lines, remove_line, set_line_quantity, AddCartItemPayload, CartView, LineItem},
        product::Product,
    },
};

#[derive(Clone)]
pub struct CartService {
    cart_repo: CartRepository,
    product_repo: ProductRepository,
}

impl CartService {
    pub fn new(cart_repo: CartRepository, product_repo: ProductRepository) -> Self {
        Self { cart_repo, product_repo }
    }

    async fn load_product(&self, product_id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("product".into()))
    }

    async fn products_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Product>, AppError> {
        let products = self.product_repo.find_many(self.product_repo.pool(), ids).await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Carrinho com preços/estoques atualizados; linhas órfãs são descartadas.
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get(user_id).await?;
        let mut items = cart.items.0;
        if items.is_empty() {
            return Ok(CartView::from_items(items));
        }

        let before = items.clone();
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products = self.products_for(&ids).await?;
        refresh_lines(&mut items, &products);

        if items != before {
            self.save(user_id, &items).await?;
        }
        Ok(CartView::from_items(items))
    }

    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartView, AppError> {
        let product = self.load_product(product_id).await?;
        let cart = self.cart_repo.get(user_id).await?;
        let mut items = cart.items.0;

        add_line(&mut items, &product, quantity)?;
        self.save(user_id, &items).await
    }

    pub async fn set_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get(user_id).await?;
        let mut items = cart.items.0;

        if quantity == 0 {
            if !remove_line(&mut items, product_id) {
                return Err(AppError::ResourceNotFound("cart_item".into()));
            }
        } else {
            let product = self.load_product(product_id).await?;
            set_line_quantity(&mut items, &product, quantity)?;
        }
        self.save(user_id, &items).await
    }

    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get(user_id).await?;
        let mut items = cart.items.0;
        if !remove_line(&mut items, product_id) {
            return Err(AppError::ResourceNotFound("cart_item".into()));
        }
        self.save(user_id, &items).await
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<CartView, AppError> {
        self.save(user_id, &[]).await
    }

    pub async fn merge_guest_cart(&self, user_id: Uuid, guest: &[AddCartItemPayload]) -> Result<CartView, AppError> {
        let cart = self.cart_repo.get(user_id).await?;
        let mut items = cart.items.0;

        let ids: Vec<Uuid> = guest.iter().map(|g| g.product_id).collect();
        let products = self.products_for(&ids).await?;
        let merged = merge_lines(&mut items, guest, &products);
        tracing::debug!("Carrinho convidado: {} de {} linhas aproveitadas", merged, guest.len());

        self.save(user_id, &items).await
    }

    async fn save(&self, user_id: Uuid, items: &[LineItem]) -> Result<CartView, AppError> {
        let cart = self.cart_repo.save_items(self.cart_repo.pool(), user_id, items).await?;
        Ok(CartView::from_items(cart.items.0))
    }
}
