// src/services/wishlist_service.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProductRepository, WishlistRepository},
    models::{
        cart::{refresh_lines, remove_line, CartView, LineItem},
        wishlist::add_wish,
    },
    services::cart_service::CartService,
};

#[derive(Clone)]
pub struct WishlistService {
    wishlist_repo: WishlistRepository,
    cart_service: CartService,
    product_repo: ProductRepository,
}

impl WishlistService {
    pub fn new(wishlist_repo: WishlistRepository, cart_service: CartService, product_repo: ProductRepository) -> Self {
        Self { wishlist_repo, cart_service, product_repo }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let wishlist = self.wishlist_repo.get_or_create(user_id).await?;
        let mut items = wishlist.items.0;
        if items.is_empty() {
            return Ok(items);
        }

        let before = items.clone();
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<_, _> = self
            .product_repo
            .find_many(self.product_repo.pool(), &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        refresh_lines(&mut items, &products);

        if items != before {
            self.wishlist_repo.save_items(user_id, &items).await?;
        }
        Ok(items)
    }

    pub async fn add(&self, user_id: Uuid, product_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let product = self
            .product_repo
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("product".into()))?;

        let wishlist = self.wishlist_repo.get_or_create(user_id).await?;
        let mut items = wishlist.items.0;
        add_wish(&mut items, &product);

        let saved = self.wishlist_repo.save_items(user_id, &items).await?;
        Ok(saved.items.0)
    }

    pub async fn remove(&self, user_id: Uuid, product_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let wishlist = self.wishlist_repo.get_or_create(user_id).await?;
        let mut items = wishlist.items.0;
        if !remove_line(&mut items, product_id) {
            return Err(AppError::ResourceNotFound("wishlist_item".into()));
        }
        let saved = self.wishlist_repo.save_items(user_id, &items).await?;
        Ok(saved.items.0)
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<(), AppError> {
        self.wishlist_repo.save_items(user_id, &[]).await?;
        Ok(())
    }

    /// Põe uma unidade no carrinho e só então retira o item da lista.
    pub async fn move_to_cart(&self, user_id: Uuid, product_id: Uuid) -> Result<CartView, AppError> {
        let wishlist = self.wishlist_repo.get_or_create(user_id).await?;
        let mut items = wishlist.items.0;
        if !items.iter().any(|i| i.product_id == product_id) {
            return Err(AppError::ResourceNotFound("wishlist_item".into()));
        }

        let cart = self.cart_service.add_item(user_id, product_id, 1).await?;
        remove_line(&mut items, product_id);
        self.wishlist_repo.save_items(user_id, &items).await?;
        Ok(cart)
    }
}
