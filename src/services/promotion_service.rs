// src/services/promotion_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProductRepository, PromotionRepository},
    models::{
        product::Product,
        promotion::{window_contains, CreatePromotionPayload, Promotion, RefreshReport, UpdatePromotionPayload},
    },
};

#[derive(Clone)]
pub struct PromotionService {
    promotion_repo: PromotionRepository,
    product_repo: ProductRepository,
    pool: PgPool,
}

fn ensure_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Result<(), AppError> {
    if ends_at <= starts_at {
        let mut errors = validator::ValidationErrors::new();
        let mut err = validator::ValidationError::new("window");
        err.message = Some("ends_after_start".into());
        errors.add("endsAt", err);
        return Err(AppError::ValidationError(errors));
    }
    Ok(())
}

impl PromotionService {
    pub fn new(promotion_repo: PromotionRepository, product_repo: ProductRepository, pool: PgPool) -> Self {
        Self { promotion_repo, product_repo, pool }
    }

    /// `only_active` avalia a janela no momento da consulta, sem depender do cache.
    pub async fn list(&self, only_active: bool) -> Result<Vec<Promotion>, AppError> {
        let promotions = self.promotion_repo.list().await?;
        if !only_active {
            return Ok(promotions);
        }
        let now = Utc::now();
        Ok(promotions.into_iter().filter(|p| p.is_active_at(now)).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Promotion, AppError> {
        self.promotion_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("promotion".into()))
    }

    pub async fn products(&self, id: Uuid) -> Result<Vec<Product>, AppError> {
        self.get(id).await?;
        self.product_repo.list_by_promotion(id).await
    }

    pub async fn create(&self, payload: &CreatePromotionPayload) -> Result<Promotion, AppError> {
        ensure_window(payload.starts_at, payload.ends_at)?;
        let active = window_contains(payload.starts_at, payload.ends_at, Utc::now());

        let mut tx = self.pool.begin().await?;
        let promotion = self.promotion_repo.create(&mut *tx, payload, active).await?;
        if !payload.product_ids.is_empty() {
            self.product_repo.attach_promotion(&mut *tx, promotion.id, &payload.product_ids).await?;
        }
        self.product_repo.sync_active_promotions(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!("🏷️ Promoção criada: {} ({}%)", promotion.name, promotion.discount_percent);
        Ok(promotion)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdatePromotionPayload) -> Result<Promotion, AppError> {
        let current = self.get(id).await?;
        ensure_window(
            payload.starts_at.unwrap_or(current.starts_at),
            payload.ends_at.unwrap_or(current.ends_at),
        )?;

        let mut tx = self.pool.begin().await?;
        self.promotion_repo.update(&mut *tx, id, payload).await?;
        self.promotion_repo.refresh_flags(&mut *tx, Utc::now()).await?;
        self.product_repo.sync_active_promotions(&mut *tx).await?;
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        // As FKs com ON DELETE SET NULL limpam os produtos vinculados
        self.promotion_repo.delete(id).await?;
        tracing::info!("🗑️ Promoção removida: {}", id);
        Ok(())
    }

    pub async fn attach_products(&self, id: Uuid, product_ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        self.get(id).await?;

        let mut tx = self.pool.begin().await?;
        self.product_repo.attach_promotion(&mut *tx, id, product_ids).await?;
        self.product_repo.sync_active_promotions(&mut *tx).await?;
        tx.commit().await?;

        self.product_repo.list_by_promotion(id).await
    }

    pub async fn detach_product(&self, id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let detached = self.product_repo.detach_promotion(&mut *tx, id, &[product_id]).await?;
        tx.commit().await?;

        if detached == 0 {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        Ok(())
    }

    /// Recalcula quais promoções estão ativas agora e propaga para os produtos.
    pub async fn refresh_activation(&self) -> Result<RefreshReport, AppError> {
        let mut tx = self.pool.begin().await?;
        let promotions_changed = self.promotion_repo.refresh_flags(&mut *tx, Utc::now()).await?;
        let products_updated = self.product_repo.sync_active_promotions(&mut *tx).await?;
        tx.commit().await?;

        if promotions_changed > 0 || products_updated > 0 {
            tracing::info!(
                "🔄 Promoções atualizadas: {} promoções, {} produtos",
                promotions_changed,
                products_updated
            );
        }
        Ok(RefreshReport { promotions_changed, products_updated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_must_end_after_start() {
        let now = Utc::now();
        assert!(ensure_window(now, now + Duration::hours(1)).is_ok());
        assert!(matches!(ensure_window(now, now), Err(AppError::ValidationError(_))));
        assert!(ensure_window(now, now - Duration::hours(1)).is_err());
    }
}
